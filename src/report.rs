//! Terminal output for the interactive run.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::export::Exported;
use crate::label::LabelConfig;

pub fn banner(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Magnetic Label Export Tool".bold().blue())?;
    writeln!(out, "{}", "Generate optimized labels for multi-material 3D printing".dimmed())?;
    writeln!(out)
}

pub fn step(out: &mut impl Write, n: u32, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{} {title}", format!("Step {n}:").bold())
}

/// Two-column summary of the finished configuration.
pub fn summary(out: &mut impl Write, label: &LabelConfig) -> io::Result<()> {
    let rows = [
        ("Text", format!("\"{}\"", label.text)),
        ("Font Size", format!("{} mm", label.font_size)),
        ("Label Size", format!("{} x {} mm", label.width, label.height)),
        (
            "Text Size (calc.)",
            format!("{:.1} x {:.1} mm", label.text_extent.width, label.text_extent.height),
        ),
        ("", String::new()),
        ("Foreground", format!("{} ({})", label.foreground.name, label.foreground.value)),
        ("Background", format!("{} ({})", label.background.name, label.background.value)),
        ("", String::new()),
        ("Output Files", label.foreground_output.display().to_string()),
        ("", label.background_output.display().to_string()),
    ];
    let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    writeln!(out)?;
    writeln!(out, "{}", "Label Configuration".bold().cyan())?;
    writeln!(out, "  {:key_width$}  {}", "Parameter".bold(), "Value".bold())?;
    for (key, value) in rows {
        writeln!(out, "  {key:key_width$}  {}", value.green())?;
    }
    writeln!(out)
}

pub fn exported(out: &mut impl Write, file: &Exported) -> io::Result<()> {
    writeln!(
        out,
        "  {} {} ({:.0} KB)",
        "✓".green(),
        file.path.display(),
        file.bytes as f64 / 1024.0
    )
}

pub fn error(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.red())
}

pub fn next_steps(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Export complete!".bold().green())?;
    writeln!(out)?;
    writeln!(out, "Next steps:")?;
    writeln!(out, "1. Import both STL files into your slicer")?;
    writeln!(out, "2. Assign different colors/extruders")?;
    writeln!(out, "3. Slice and print!")
}
