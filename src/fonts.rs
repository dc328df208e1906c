//! Font file lookup.
//!
//! The engine renders text in the bold face, so bold files are listed before
//! regular ones. When no known path matches, a handful of font directories
//! are scanned for any file whose name contains the family.

use std::path::{Path, PathBuf};

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// Known install locations per family, bold variants first.
const KNOWN_FONTS: &[(&str, &[&str])] = &[
    (
        "Arial",
        &[
            "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
            "/Library/Fonts/Arial Bold.ttf",
            "/usr/share/fonts/truetype/msttcorefonts/Arial_Bold.ttf",
            "/usr/share/fonts/truetype/msttcorefonts/arialbd.ttf",
            "C:/Windows/Fonts/arialbd.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
            "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf",
            "C:/Windows/Fonts/arial.ttf",
        ],
    ),
    (
        "Helvetica",
        &[
            "/System/Library/Fonts/Helvetica.ttc",
            "/Library/Fonts/Helvetica.ttc",
        ],
    ),
];

/// Finds a font file for a family name.
#[derive(Debug, Clone)]
pub struct FontLocator {
    known: Vec<(String, Vec<PathBuf>)>,
    scan_dirs: Vec<PathBuf>,
}

impl Default for FontLocator {
    fn default() -> Self {
        let known = KNOWN_FONTS
            .iter()
            .map(|(family, paths)| {
                (family.to_string(), paths.iter().map(PathBuf::from).collect())
            })
            .collect();

        let mut scan_dirs: Vec<PathBuf> = [
            "/Library/Fonts",
            "/System/Library/Fonts",
            "/System/Library/Fonts/Supplemental",
            "/usr/share/fonts/truetype/msttcorefonts",
            "/usr/share/fonts/TTF",
            "/usr/local/share/fonts",
            "C:/Windows/Fonts",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        if let Some(home) = dirs::home_dir() {
            scan_dirs.push(home.join("Library/Fonts"));
        }
        if let Some(dir) = dirs::font_dir() {
            if !scan_dirs.contains(&dir) {
                scan_dirs.push(dir);
            }
        }

        Self::new(known, scan_dirs)
    }
}

impl FontLocator {
    pub fn new(known: Vec<(String, Vec<PathBuf>)>, scan_dirs: Vec<PathBuf>) -> Self {
        Self { known, scan_dirs }
    }

    /// First font file matching `family`, or `None`.
    ///
    /// A known family matches when its name appears in `family`, ignoring
    /// case, so "Arial Black" still finds the Arial table.
    pub fn locate(&self, family: &str) -> Option<PathBuf> {
        let wanted = family.to_lowercase();

        let known = self
            .known
            .iter()
            .filter(|(name, _)| wanted.contains(&name.to_lowercase()))
            .flat_map(|(_, paths)| paths.iter())
            .find(|p| p.is_file());
        if let Some(path) = known {
            tracing::debug!("font {family} found at {}", path.display());
            return Some(path.clone());
        }

        let scanned = self.scan_dirs.iter().find_map(|dir| scan_dir(dir, &wanted));
        match &scanned {
            Some(path) => tracing::debug!("font {family} found by scan at {}", path.display()),
            None => tracing::debug!("no font file found for {family}"),
        }
        scanned
    }
}

/// Best font file in `dir` whose name contains `needle`.
///
/// Bold files win over others; ties go to the shortest then alphabetical
/// name so results don't depend on directory order.
fn scan_dir(dir: &Path, needle: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;

    let mut matches: Vec<(bool, String, PathBuf)> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_font_extension(path))
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().to_lowercase();
            name.contains(needle).then(|| (is_bold_name(&name), name, path))
        })
        .collect();

    matches.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(a.1.len().cmp(&b.1.len()))
            .then(a.1.cmp(&b.1))
    });
    matches.into_iter().next().map(|(_, _, path)| path)
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| FONT_EXTENSIONS.contains(&ext.as_str()))
}

fn is_bold_name(name: &str) -> bool {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    stem.contains("bold") || stem.ends_with("bd")
}
