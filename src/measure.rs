//! Text dimension estimation.
//!
//! Three strategies, most accurate first:
//!
//! 1. [`RenderMeasurement`] renders the text with the engine and measures
//!    the resulting mesh.
//! 2. [`FontMetricsMeasurement`] measures glyph boxes with `rusttype` and
//!    corrects the width toward what the engine produces.
//! 3. [`CharHeuristic`] multiplies the character count by an average
//!    advance ratio. Always succeeds.
//!
//! [`DimensionEstimator`] tries them in that order and returns the first
//! usable answer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusttype::{point, Font, Scale};

use crate::config::{Config, FontSettings};
use crate::engine::{scad_string, Engine};
use crate::stl;

/// Text extent in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

impl TextExtent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// One way of measuring text.
pub trait MeasureStrategy {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Measure `text` at `font_size` mm, or `None` if this strategy can't.
    fn attempt(&self, text: &str, font_size: f64) -> Option<TextExtent>;
}

/// Renders the text with the engine and measures the mesh.
#[derive(Debug, Clone)]
pub struct RenderMeasurement {
    engine: Option<Engine>,
    font_name: String,
    timeout: Duration,
    scratch_dir: Option<PathBuf>,
}

impl RenderMeasurement {
    pub fn new(engine: Option<Engine>, font_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            engine,
            font_name: font_name.into(),
            timeout,
            scratch_dir: None,
        }
    }

    /// Create scratch files under `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Minimal document: the text alone, anchored at its natural origin.
    pub fn document(&self, text: &str, font_size: f64) -> String {
        format!(
            "linear_extrude(1)\n    text({}, size={}, font={}, halign=\"left\", valign=\"baseline\");\n",
            scad_string(text),
            font_size,
            scad_string(&self.font_name),
        )
    }

    fn measure(&self, engine: &Engine, text: &str, font_size: f64) -> anyhow::Result<Option<TextExtent>> {
        // Dropping the directory removes both files on every return path.
        let mut builder = tempfile::Builder::new();
        builder.prefix("label-measure-");
        let scratch = match &self.scratch_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        let input = scratch.path().join("text.scad");
        let output = scratch.path().join("text.stl");
        std::fs::write(&input, self.document(text, font_size))?;

        let result = engine.run(
            [Path::new("-o"), output.as_path(), input.as_path()],
            Some(self.timeout),
        )?;
        if !result.success() {
            tracing::debug!("measurement render exited with {}: {}", result.status, result.stderr.trim());
            return Ok(None);
        }
        if !output.is_file() {
            return Ok(None);
        }

        let bounds = stl::load_bounds(&output)?;
        Ok(bounds.map(|b| TextExtent::new(b.width(), b.height())))
    }
}

impl MeasureStrategy for RenderMeasurement {
    fn name(&self) -> &'static str {
        "engine render"
    }

    fn attempt(&self, text: &str, font_size: f64) -> Option<TextExtent> {
        let engine = self.engine.as_ref()?;
        match self.measure(engine, text, font_size) {
            Ok(extent) => extent,
            Err(e) => {
                tracing::debug!("measurement render failed: {e:#}");
                None
            }
        }
    }
}

/// Measures glyph bounding boxes from a local font file.
#[derive(Debug, Clone)]
pub struct FontMetricsMeasurement {
    font_path: Option<PathBuf>,
    reference_glyph: char,
    reference_px: f32,
    width_correction: f64,
}

impl FontMetricsMeasurement {
    pub fn new(font_path: Option<PathBuf>, settings: &FontSettings) -> Self {
        Self {
            font_path,
            reference_glyph: settings.reference_glyph,
            reference_px: settings.reference_px,
            width_correction: settings.width_correction,
        }
    }

    fn measure(&self, path: &Path, text: &str, font_size: f64) -> Option<TextExtent> {
        let bytes = std::fs::read(path).ok()?;
        let font = Font::try_from_vec(bytes)?;

        let px_per_mm = self.px_per_mm(&font)?;
        let pixel_size = (font_size * px_per_mm).trunc() as f32;
        if pixel_size < 1.0 {
            return None;
        }
        let (width_px, height_px) = text_pixel_box(&font, text, em_scale(&font, pixel_size)?)?;

        Some(TextExtent::new(
            f64::from(width_px) / px_per_mm * self.width_correction,
            f64::from(height_px) / px_per_mm,
        ))
    }

    /// Pixels per millimetre of font size: the reference size over the cap
    /// height of the reference glyph at that size.
    fn px_per_mm(&self, font: &Font<'_>) -> Option<f64> {
        let cap_px = self.cap_height_px(font)?;
        Some(f64::from(self.reference_px) / f64::from(cap_px))
    }

    fn cap_height_px(&self, font: &Font<'_>) -> Option<i32> {
        let cap_box = font
            .glyph(self.reference_glyph)
            .scaled(em_scale(font, self.reference_px)?)
            .positioned(point(0.0, 0.0))
            .pixel_bounding_box()?;
        (cap_box.height() > 0).then(|| cap_box.height())
    }
}

/// Scale at which `px` is the em size.
///
/// `Scale::uniform` sizes the ascent-to-descent span instead, which is larger
/// than the em for most fonts; pixel sizes elsewhere (FreeType, the engine)
/// mean the em.
fn em_scale(font: &Font<'_>, px: f32) -> Option<Scale> {
    let units_per_em = f32::from(font.units_per_em());
    let v = font.v_metrics_unscaled();
    let span = v.ascent - v.descent;
    if units_per_em <= 0.0 || span <= 0.0 {
        return None;
    }
    Some(Scale::uniform(px * span / units_per_em))
}

/// Pixel size of the inked area of `text` laid out on one line.
fn text_pixel_box(font: &Font<'_>, text: &str, scale: Scale) -> Option<(i32, i32)> {
    let ascent = font.v_metrics(scale).ascent;
    font.layout(text, scale, point(0.0, ascent))
        .filter_map(|glyph| glyph.pixel_bounding_box())
        .reduce(|mut acc, bb| {
            acc.min.x = acc.min.x.min(bb.min.x);
            acc.min.y = acc.min.y.min(bb.min.y);
            acc.max.x = acc.max.x.max(bb.max.x);
            acc.max.y = acc.max.y.max(bb.max.y);
            acc
        })
        .map(|bb| (bb.width(), bb.height()))
}

impl MeasureStrategy for FontMetricsMeasurement {
    fn name(&self) -> &'static str {
        "font metrics"
    }

    fn attempt(&self, text: &str, font_size: f64) -> Option<TextExtent> {
        let path = self.font_path.as_deref()?;
        let extent = self.measure(path, text, font_size);
        if extent.is_none() {
            tracing::debug!("font metrics unavailable for {}", path.display());
        }
        extent
    }
}

/// Character count times an average advance ratio.
#[derive(Debug, Clone, Copy)]
pub struct CharHeuristic {
    pub advance_ratio: f64,
}

impl CharHeuristic {
    pub fn estimate(&self, text: &str, font_size: f64) -> TextExtent {
        let chars = text.chars().count() as f64;
        TextExtent::new(chars * font_size * self.advance_ratio, font_size)
    }
}

impl MeasureStrategy for CharHeuristic {
    fn name(&self) -> &'static str {
        "character heuristic"
    }

    fn attempt(&self, text: &str, font_size: f64) -> Option<TextExtent> {
        Some(self.estimate(text, font_size))
    }
}

/// Tries each strategy in order, ending with the character heuristic.
pub struct DimensionEstimator {
    strategies: Vec<Box<dyn MeasureStrategy>>,
    fallback: CharHeuristic,
}

impl DimensionEstimator {
    /// Estimator with only the terminal heuristic.
    pub fn new(fallback: CharHeuristic) -> Self {
        Self {
            strategies: Vec::new(),
            fallback,
        }
    }

    /// Append a strategy; earlier strategies take priority.
    pub fn with_strategy(mut self, strategy: impl MeasureStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// The full chain: engine render, then font metrics, then the heuristic.
    pub fn from_config(config: &Config, engine: Option<Engine>, font_path: Option<PathBuf>) -> Self {
        let mut render = RenderMeasurement::new(engine, config.font.engine_font_name(), config.measure_timeout());
        if let Some(dir) = &config.engine.scratch_dir {
            render = render.with_scratch_dir(dir);
        }

        Self::new(CharHeuristic {
            advance_ratio: config.font.advance_ratio,
        })
        .with_strategy(render)
        .with_strategy(FontMetricsMeasurement::new(font_path, &config.font))
    }

    /// Estimated text extent. Never fails.
    pub fn estimate(&self, text: &str, font_size: f64) -> TextExtent {
        for strategy in &self.strategies {
            match strategy.attempt(text, font_size) {
                Some(extent) if extent.is_usable() => {
                    tracing::info!(
                        "measured {:?} with {}: {:.2} x {:.2} mm",
                        text,
                        strategy.name(),
                        extent.width,
                        extent.height
                    );
                    return extent;
                }
                Some(extent) => {
                    tracing::debug!("{} gave unusable extent {:?}", strategy.name(), extent);
                }
                None => tracing::debug!("{} gave no result", strategy.name()),
            }
        }

        let extent = self.fallback.estimate(text, font_size);
        tracing::info!(
            "estimated {:?} with {}: {:.2} x {:.2} mm",
            text,
            self.fallback.name(),
            extent.width,
            extent.height
        );
        extent
    }
}
