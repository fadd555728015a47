// src/gui/chart.rs
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Shape, Stroke, Vec2};

pub const PRESENT_COLOR: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);
pub const ABSENT_COLOR: Color32 = Color32::from_rgb(0xE5, 0x39, 0x35);

// Wedges wider than this are split so every polygon stays convex.
const MAX_WEDGE: f32 = FRAC_PI_2;
const ARC_STEP: f32 = 0.05;

/// Polygon points for the wedge from angle `a0` to `a1` (radians, clockwise
/// from 12 o'clock in screen space), split into convex parts.
pub fn wedge_polygons(center: Pos2, radius: f32, a0: f32, a1: f32) -> Vec<Vec<Pos2>> {
    let mut parts = Vec::new();
    let mut start = a0;
    while start < a1 {
        let end = (start + MAX_WEDGE).min(a1);
        let steps = (((end - start) / ARC_STEP).ceil() as usize).max(1);
        let mut pts = Vec::with_capacity(steps + 2);
        pts.push(center);
        for i in 0..=steps {
            let a = start + (end - start) * i as f32 / steps as f32;
            pts.push(at_angle(center, radius, a));
        }
        parts.push(pts);
        start = end;
    }
    parts
}

fn at_angle(center: Pos2, radius: f32, a: f32) -> Pos2 {
    // 0 rad points up; y grows downward
    center + Vec2::new(a.sin(), -a.cos()) * radius
}

/// Fractions of the full circle, one per value. All zeros give all zeros.
pub fn fractions(values: &[usize]) -> Vec<f32> {
    let total: usize = values.iter().sum();
    if total == 0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| *v as f32 / total as f32).collect()
}

/// Draw a labelled pie into `ui`, sized to the available width.
pub fn pie(ui: &mut egui::Ui, slices: &[(&str, usize, Color32)]) {
    let side = ui.available_width().min(320.0);
    let (rect, _resp) = ui.allocate_exact_size(Vec2::splat(side), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    let center = rect.center();
    let radius = side * 0.45;

    let values: Vec<usize> = slices.iter().map(|(_, v, _)| *v).collect();
    let mut angle = 0.0f32;
    for ((label, value, color), frac) in slices.iter().zip(fractions(&values)) {
        if frac <= 0.0 {
            continue;
        }
        let sweep = frac * TAU;
        for pts in wedge_polygons(center, radius, angle, angle + sweep) {
            painter.add(Shape::convex_polygon(pts, *color, Stroke::NONE));
        }
        let mid = at_angle(center, radius * 0.6, angle + sweep / 2.0);
        painter.text(
            mid,
            Align2::CENTER_CENTER,
            format!("{label}\n{value} ({:.1}%)", frac * 100.0),
            FontId::proportional(14.0),
            Color32::WHITE,
        );
        angle += sweep;
    }
}
