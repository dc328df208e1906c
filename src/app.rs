//! The interactive export session.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use crate::config::{self, Config};
use crate::engine::{self, Engine, EngineError};
use crate::export::{ExportError, Exporter, Layer};
use crate::fonts::FontLocator;
use crate::interrupt;
use crate::label::{self, LabelConfig};
use crate::measure::DimensionEstimator;
use crate::palette;
use crate::prompt::{PromptError, Prompter};
use crate::report;
use crate::sizing::{Icon, LabelSizer};

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Exported,
    Cancelled,
}

/// Everything that must exist before the first prompt.
pub struct Prerequisites {
    pub engine: Engine,
    pub template: PathBuf,
    pub font: Option<PathBuf>,
}

impl Prerequisites {
    pub fn check(config: &Config) -> Result<Self> {
        let engine = Engine::locate(&config.engine).map_err(|e| match e {
            EngineError::NotFound => {
                anyhow!("OpenSCAD not found!\nPlease install OpenSCAD: https://openscad.org/")
            }
            other => anyhow::Error::new(other),
        })?;

        let template = engine::locate_template(&config.engine).with_context(|| {
            match &config.engine.template {
                Some(path) => format!("{} not found!", path.display()),
                None => format!("{} not found!", engine::TEMPLATE_FILE_NAME),
            }
        })?;

        let font = FontLocator::default().locate(&config.font.family);
        Ok(Self {
            engine,
            template,
            font,
        })
    }
}

/// Run the session on the process terminal.
pub fn run() -> Result<Outcome> {
    let config = config::load_config()?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut prompter = Prompter::new(stdin.lock(), stdout.lock());
    report::banner(prompter.output())?;

    let prerequisites = Prerequisites::check(&config)?;
    tracing::info!(
        "engine {}, template {}",
        prerequisites.engine.path().display(),
        prerequisites.template.display()
    );

    match session(&config, &prerequisites, &mut prompter) {
        Err(e) if matches!(e.downcast_ref::<PromptError>(), Some(PromptError::Cancelled)) => {
            writeln!(prompter.output(), "Cancelled.")?;
            Ok(Outcome::Cancelled)
        }
        other => other,
    }
}

/// Prompt for the label, confirm, and export both layers.
pub fn session<R: BufRead, W: Write>(
    config: &Config,
    prerequisites: &Prerequisites,
    prompter: &mut Prompter<R, W>,
) -> Result<Outcome> {
    let label = collect_label(config, prerequisites, prompter)?;
    report::summary(prompter.output(), &label)?;

    if !prompter.confirm("Export STL files?", true)? {
        writeln!(prompter.output(), "Export cancelled.")?;
        return Ok(Outcome::Cancelled);
    }

    writeln!(prompter.output())?;
    writeln!(prompter.output(), "Exporting...")?;
    let exporter = Exporter::new(&prerequisites.engine, &prerequisites.template, config);

    let results = exporter.export_all(&label);
    cancel_if_interrupted()?;

    let mut failed = Vec::new();
    for (layer, result) in results {
        match result {
            Ok(file) => report::exported(prompter.output(), &file)?,
            Err(e) => {
                report::error(prompter.output(), &format!("Error: {}", describe(&e)))?;
                failed.push(layer);
            }
        }
    }

    if !failed.is_empty() {
        let names: Vec<_> = failed.iter().map(|l: &Layer| l.render_mode()).collect();
        bail!("Export failed ({}). Check errors above.", names.join(", "));
    }

    report::next_steps(prompter.output())?;
    Ok(Outcome::Exported)
}

/// Turn an interrupt taken during an engine run into a cancellation.
fn cancel_if_interrupted() -> Result<(), PromptError> {
    if interrupt::requested() {
        return Err(PromptError::Cancelled);
    }
    Ok(())
}

fn describe(e: &ExportError) -> String {
    match e {
        ExportError::Failed { stderr, .. } => stderr.trim().to_string(),
        other => other.to_string(),
    }
}

fn collect_label<R: BufRead, W: Write>(
    config: &Config,
    prerequisites: &Prerequisites,
    prompter: &mut Prompter<R, W>,
) -> Result<LabelConfig> {
    report::step(prompter.output(), 1, "Enter label text")?;
    let text = prompter.text("Text", "ASA")?;
    if text.trim().is_empty() {
        bail!("Text cannot be empty");
    }

    report::step(prompter.output(), 2, "Font size")?;
    let font_size = prompter.positive("Font size (mm)", config.default.font_size)?;

    report::step(prompter.output(), 3, "Calculating optimal label size...")?;
    let estimator = DimensionEstimator::from_config(
        config,
        Some(prerequisites.engine.clone()),
        prerequisites.font.clone(),
    );
    let icon = config.default.use_icon.then(|| Icon::from_defaults(&config.default));
    let size = LabelSizer::new(&config.default, &estimator).size(&text, font_size, icon);
    cancel_if_interrupted()?;
    writeln!(
        prompter.output(),
        "  Calculated text size: {:.1} x {:.1} mm",
        size.text.width,
        size.text.height
    )?;
    writeln!(
        prompter.output(),
        "  Recommended label size: {} x {} mm",
        size.width,
        size.height
    )?;

    let (width, height) = if prompter.confirm("Use recommended size?", true)? {
        (size.width, size.height)
    } else {
        (
            prompter.positive("Label width (mm)", size.width)?,
            prompter.positive("Label height (mm)", size.height)?,
        )
    };

    report::step(prompter.output(), 4, "Select foreground color (base, frame, text)")?;
    let foreground = prompter.select_color("foreground", palette::DARK)?;

    report::step(prompter.output(), 5, "Select background color (inlay)")?;
    let background = prompter.select_color("background", palette::LIGHT)?;

    report::step(prompter.output(), 6, "Output files")?;
    let (default_fg, default_bg) = label::default_file_names(&text);
    let foreground_output = label::ensure_stl_extension(&prompter.text("Filename (foreground)", &default_fg)?);
    let background_output = label::ensure_stl_extension(&prompter.text("Filename (background)", &default_bg)?);

    Ok(LabelConfig {
        text,
        font_size,
        width,
        height,
        text_extent: size.text,
        foreground,
        background,
        foreground_output: PathBuf::from(foreground_output),
        background_output: PathBuf::from(background_output),
    })
}
