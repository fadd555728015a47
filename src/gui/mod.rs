// src/gui/mod.rs
//! Attendance chart window: pie of present vs absent plus a table.

pub mod chart;

use std::error::Error;

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use chart::{ABSENT_COLOR, PRESENT_COLOR};

/// What the window shows.
#[derive(Clone, Debug, Default)]
pub struct ChartData {
    pub title: String,
    pub present: usize,
    pub absent: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn run(data: ChartData) -> Result<(), Box<dyn Error>> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    let title = data.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(ChartApp { data }))),
    )?;
    Ok(())
}

struct ChartApp {
    data: ChartData,
}

impl eframe::App for ChartApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("pie").resizable(false).show(ctx, |ui| {
            ui.heading(&self.data.title);
            chart::pie(
                ui,
                &[
                    ("Afwezig", self.data.absent, ABSENT_COLOR),
                    ("Aanwezig", self.data.present, PRESENT_COLOR),
                ],
            );
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.data.rows.is_empty() {
                ui.label("Geen afwezigen");
                return;
            }
            let cols = self.data.headers.len();
            let mut table = TableBuilder::new(ui).striped(true).min_scrolled_height(0.0);
            for _ in 0..cols {
                table = table.column(Column::auto().resizable(true).clip(true).at_least(40.0));
            }
            table
                .header(22.0, |mut header| {
                    for h in &self.data.headers {
                        header.col(|ui| {
                            ui.strong(h);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, self.data.rows.len(), |mut row| {
                        let cells = &self.data.rows[row.index()];
                        for ci in 0..cols {
                            let cell = cells.get(ci).map(String::as_str).unwrap_or("");
                            row.col(|ui| {
                                ui.label(cell);
                            });
                        }
                    });
                });
        });
    }
}
