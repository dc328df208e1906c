//! Label sizing. Turns a measured text box into outer label dimensions.

use crate::config::Defaults;
use crate::measure::{DimensionEstimator, TextExtent};

/// Optional icon placed to the left of the text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Icon {
    pub size: f64,
}

impl Icon {
    /// Square icon of the configured `icon_size`.
    pub fn from_defaults(d: &Defaults) -> Self {
        Self { size: d.icon_size }
    }
}

/// Recommended label size plus the raw text measurement it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSize {
    /// Whole millimetres.
    pub width: u32,
    /// Whole millimetres.
    pub height: u32,
    /// Unrounded, for display only.
    pub text: TextExtent,
}

/// Computes label dimensions from text measurements.
pub struct LabelSizer<'a> {
    defaults: &'a Defaults,
    estimator: &'a DimensionEstimator,
}

impl<'a> LabelSizer<'a> {
    pub fn new(defaults: &'a Defaults, estimator: &'a DimensionEstimator) -> Self {
        Self { defaults, estimator }
    }

    /// Measure `text` and size a label around it.
    pub fn size(&self, text: &str, font_size: f64, icon: Option<Icon>) -> LabelSize {
        let extent = self.estimator.estimate(text, font_size);
        size_for_extent(self.defaults, extent, font_size, icon)
    }
}

/// Size a label around an already measured text box.
///
/// Padding surrounds the content, the border surrounds the padding, and the
/// result never drops below the magnet spacing or the configured minimums.
/// Rounding is half away from zero (`f64::round`).
pub fn size_for_extent(d: &Defaults, text: TextExtent, font_size: f64, icon: Option<Icon>) -> LabelSize {
    let mut content_width = text.width + 2.0 * d.min_padding;
    if let Some(icon) = icon {
        content_width += icon.size + d.min_padding;
    }
    let icon_height = icon.map_or(0.0, |i| i.size);
    let content_height = font_size.max(icon_height) + 2.0 * d.min_padding;

    let width = (content_width + 2.0 * d.border_width)
        .max(d.min_width_for_magnets())
        .max(d.min_width);
    let height = (content_height + 2.0 * d.border_width).max(d.min_height);

    LabelSize {
        width: to_whole_mm(width),
        height: to_whole_mm(height),
        text,
    }
}

fn to_whole_mm(value: f64) -> u32 {
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{CharHeuristic, MeasureStrategy};

    fn heuristic_only() -> DimensionEstimator {
        DimensionEstimator::new(CharHeuristic { advance_ratio: 0.87 })
    }

    #[test]
    fn hello_at_20mm() {
        let defaults = Defaults::default();
        let estimator = heuristic_only();
        let size = LabelSizer::new(&defaults, &estimator).size("HELLO", 20.0, None);

        assert!((size.text.width - 87.0).abs() < 1e-9);
        assert_eq!(size.text.height, 20.0);
        assert_eq!(size.width, 99);
        assert_eq!(size.height, 32);
    }

    #[test]
    fn asa_at_default_size() {
        let defaults = Defaults::default();
        let estimator = heuristic_only();
        let size = LabelSizer::new(&defaults, &estimator).size("ASA", 12.0, None);

        // 3 * 12 * 0.87 = 31.32, + 8 padding + 4 border
        assert_eq!(size.width, 43);
        assert_eq!(size.height, 24);
    }

    #[test]
    fn short_text_hits_floors() {
        let defaults = Defaults::default();
        let size = size_for_extent(&defaults, TextExtent::new(1.74, 2.0), 2.0, None);
        // 1.74 + 8 + 4 = 13.74 is below 2 * 10 + 6 = 26 and the 30 minimum
        assert_eq!(size.width, 30);
        // 2 + 8 + 4 = 14 is below the 15 minimum
        assert_eq!(size.height, 15);
    }

    #[test]
    fn magnet_spacing_can_exceed_min_width() {
        let defaults = Defaults {
            min_width: 10.0,
            magnet_inset: 15.0,
            ..Defaults::default()
        };
        let size = size_for_extent(&defaults, TextExtent::new(1.0, 1.0), 1.0, None);
        assert_eq!(size.width, 36);
    }

    #[test]
    fn icon_adds_width_and_height() {
        let defaults = Defaults::default();
        let icon = Some(Icon::from_defaults(&defaults));
        let size = size_for_extent(&defaults, TextExtent::new(40.0, 6.0), 6.0, icon);
        // 40 + 8 + 10 + 4 + 4
        assert_eq!(size.width, 66);
        // max(6, 10) + 8 + 4
        assert_eq!(size.height, 22);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let defaults = Defaults::default();
        let size = size_for_extent(&defaults, TextExtent::new(30.5, 12.0), 12.5, None);
        assert_eq!(size.width, 43); // 42.5
        assert_eq!(size.height, 25); // 24.5
    }

    #[test]
    fn floors_hold_for_many_inputs() {
        let defaults = Defaults::default();
        let estimator = heuristic_only();
        let sizer = LabelSizer::new(&defaults, &estimator);
        let min_w = defaults.min_width_for_magnets().max(defaults.min_width) as u32;

        for text in ["I", "ASA", "HELLO WORLD", "ÄÖÜ ß", "a much longer label text"] {
            for font_size in [0.5, 1.0, 5.0, 12.0, 40.0] {
                for icon in [None, Some(Icon { size: 10.0 })] {
                    let size = sizer.size(text, font_size, icon);
                    assert!(size.width >= min_w, "{text} {font_size}");
                    assert!(size.height >= defaults.min_height as u32, "{text} {font_size}");
                }
            }
        }
    }

    #[test]
    fn width_grows_with_text_length() {
        let defaults = Defaults::default();
        let estimator = heuristic_only();
        let sizer = LabelSizer::new(&defaults, &estimator);

        let mut previous = 0;
        for len in 1..40 {
            let text = "W".repeat(len);
            let size = sizer.size(&text, 12.0, None);
            assert!(size.width >= previous);
            previous = size.width;
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        struct Constant;
        impl MeasureStrategy for Constant {
            fn name(&self) -> &'static str {
                "constant"
            }
            fn attempt(&self, _text: &str, _font_size: f64) -> Option<TextExtent> {
                Some(TextExtent::new(33.3, 11.1))
            }
        }

        let defaults = Defaults::default();
        let estimator = heuristic_only().with_strategy(Constant);
        let sizer = LabelSizer::new(&defaults, &estimator);
        let first = sizer.size("TEST", 12.0, None);
        for _ in 0..5 {
            assert_eq!(sizer.size("TEST", 12.0, None), first);
        }
        assert_eq!(first.text, TextExtent::new(33.3, 11.1));
    }
}
