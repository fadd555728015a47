// src/lib.rs

#[macro_use]
pub mod macros;
pub mod logging;

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod specs;

pub mod csv;
pub mod file;
#[cfg(feature = "chart")]
pub mod gui;
pub mod progress;
pub mod reconcile;
pub mod roster;
pub mod runner;
pub mod select;
pub mod store;
pub mod summary;

pub use error::{PresenceError, Result};
