//! Magnetic label export tool.
//!
//! Asks for the label text, size and colours, works out a label size that
//! fits the text, and has OpenSCAD render one STL per filament colour for
//! multi-material printing.

mod app;
mod config;
mod engine;
mod export;
mod fonts;
mod interrupt;
mod label;
mod logging;
mod measure;
mod palette;
mod prompt;
mod report;
mod sizing;
mod stl;

use std::process::ExitCode;

use owo_colors::OwoColorize;

fn main() -> ExitCode {
    logging::init();
    interrupt::install();

    match app::run() {
        Ok(outcome) => {
            tracing::debug!("session finished: {outcome:?}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            println!();
            println!("{}", format!("Error: {error:#}").red());
            ExitCode::FAILURE
        }
    }
}
