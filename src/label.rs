//! The finalized label parameters and output file naming.

use std::path::PathBuf;

use crate::measure::TextExtent;
use crate::palette::Color;

pub const STL_EXTENSION: &str = ".stl";

/// Everything needed to export one label. Built once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelConfig {
    pub text: String,
    pub font_size: f64,
    pub width: u32,
    pub height: u32,
    /// Raw measurement, shown in the summary.
    pub text_extent: TextExtent,
    pub foreground: Color,
    pub background: Color,
    pub foreground_output: PathBuf,
    pub background_output: PathBuf,
}

/// Lowercase `text` with every non-alphanumeric character replaced by `_`.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Default file names for the two layers.
pub fn default_file_names(text: &str) -> (String, String) {
    let safe = sanitize(text);
    (
        format!("label_{safe}_color1{STL_EXTENSION}"),
        format!("label_{safe}_color2{STL_EXTENSION}"),
    )
}

/// Append `.stl` unless the name already ends with it.
pub fn ensure_stl_extension(name: &str) -> String {
    if name.ends_with(STL_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{STL_EXTENSION}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_punctuation_and_lowercases() {
        assert_eq!(sanitize("ASA"), "asa");
        assert_eq!(sanitize("PLA+ 1.75mm"), "pla__1_75mm");
        assert_eq!(sanitize("Über/Öl"), "über_öl");
    }

    #[test]
    fn default_names_use_sanitized_text() {
        let (fg, bg) = default_file_names("My Box");
        assert_eq!(fg, "label_my_box_color1.stl");
        assert_eq!(bg, "label_my_box_color2.stl");
    }

    #[test]
    fn stl_extension_appended_exactly_once() {
        assert_eq!(ensure_stl_extension("front"), "front.stl");
        assert_eq!(ensure_stl_extension("front.stl"), "front.stl");
        assert_eq!(ensure_stl_extension(&ensure_stl_extension("a.b")), "a.b.stl");
        assert_eq!(ensure_stl_extension("front.STL"), "front.STL.stl");
    }
}
