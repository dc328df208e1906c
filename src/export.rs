//! STL export, one engine run per material layer.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::engine::{scad_string, Engine, EngineError};
use crate::label::LabelConfig;

/// Which material pass the template should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Base, frame and text.
    Foreground,
    /// Inlay.
    Background,
}

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::Foreground, Layer::Background];

    /// Value of the template's `render_mode` parameter.
    pub fn render_mode(self) -> &'static str {
        match self {
            Layer::Foreground => "color1",
            Layer::Background => "color2",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("OpenSCAD exited with {status}:\n{stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("OpenSCAD reported success but {} was not written", .path.display())]
    MissingOutput { path: PathBuf },

    #[error("could not replace {}: {source}", .path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A written layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Exported {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Runs the engine against the shared geometry template.
pub struct Exporter<'a> {
    engine: &'a Engine,
    template: &'a Path,
    config: &'a Config,
    timeout: Option<Duration>,
}

impl<'a> Exporter<'a> {
    pub fn new(engine: &'a Engine, template: &'a Path, config: &'a Config) -> Self {
        Self {
            engine,
            template,
            config,
            timeout: config.export_timeout(),
        }
    }

    /// Template parameters for `layer`, as `-D name=value` pairs.
    ///
    /// Font, border and magnet geometry are passed too, so the rendered
    /// label matches the numbers it was sized with.
    pub fn arguments(&self, label: &LabelConfig, layer: Layer, output: &Path) -> Vec<String> {
        let g = &self.config.default;
        let defines = [
            format!("render_mode={}", scad_string(layer.render_mode())),
            format!("label_text={}", scad_string(&label.text)),
            format!("font_size={}", label.font_size),
            format!("font={}", scad_string(&self.config.font.engine_font_name())),
            format!("label_width={}", label.width),
            format!("label_height={}", label.height),
            format!("preview_color1={}", scad_string(label.foreground.value)),
            format!("preview_color2={}", scad_string(label.background.value)),
            format!("border_width={}", g.border_width),
            format!("corner_radius={}", g.corner_radius),
            format!("magnet_inset={}", g.magnet_inset),
            format!("magnet_diameter={}", g.magnet_diameter),
        ];

        let mut args = vec!["-o".to_string(), output.to_string_lossy().into_owned()];
        for define in defines {
            args.push("-D".to_string());
            args.push(define);
        }
        args.push(self.template.to_string_lossy().into_owned());
        args
    }

    /// Export one layer to `output`.
    pub fn export(&self, label: &LabelConfig, layer: Layer, output: &Path) -> Result<Exported, ExportError> {
        tracing::info!("exporting {} layer to {}", layer.render_mode(), output.display());
        // A file left from an earlier run must not pass for this run's output.
        match std::fs::remove_file(output) {
            Ok(()) => tracing::debug!("removed previous {}", output.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ExportError::Replace {
                    path: output.to_path_buf(),
                    source,
                })
            }
        }
        let result = self.engine.run(self.arguments(label, layer, output), self.timeout)?;
        tracing::debug!("engine output: {}", result.stdout.trim());

        if !result.success() {
            return Err(ExportError::Failed {
                status: result.status,
                stderr: result.stderr,
            });
        }

        match std::fs::metadata(output) {
            Ok(meta) if meta.is_file() => Ok(Exported {
                path: output.to_path_buf(),
                bytes: meta.len(),
            }),
            _ => Err(ExportError::MissingOutput {
                path: output.to_path_buf(),
            }),
        }
    }

    /// Export both layers; a failure in one doesn't stop the other.
    pub fn export_all(&self, label: &LabelConfig) -> Vec<(Layer, Result<Exported, ExportError>)> {
        Layer::ALL
            .into_iter()
            .map(|layer| {
                let output = match layer {
                    Layer::Foreground => &label.foreground_output,
                    Layer::Background => &label.background_output,
                };
                let result = self.export(label, layer, output);
                if let Err(e) = &result {
                    tracing::debug!("{} layer export failed: {e}", layer.render_mode());
                }
                (layer, result)
            })
            .collect()
    }
}
