//! ASCII STL scanning.
//!
//! Only the extent of the mesh matters here, so facets and normals are
//! skipped and every `vertex x y z` line is folded into a bounding box:
//!
//! ```text
//! solid name
//!   facet normal nx ny nz
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//! endsolid name
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Axis-aligned bounding box in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds2 {
    fn from_point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Scan ASCII STL lines for vertices.
///
/// Returns `None` when no parseable vertex was found. Malformed vertex
/// lines are skipped rather than failing the whole scan.
pub fn scan_bounds<R: BufRead>(reader: R) -> std::io::Result<Option<Bounds2>> {
    let mut bounds: Option<Bounds2> = None;

    for line in reader.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if !parts.next().is_some_and(|w| w.eq_ignore_ascii_case("vertex")) {
            continue;
        }

        let coords: Vec<f64> = parts.take(3).filter_map(|p| p.parse().ok()).collect();
        let &[x, y, _] = coords.as_slice() else {
            continue;
        };
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }

        match bounds.as_mut() {
            Some(b) => b.include(x, y),
            None => bounds = Some(Bounds2::from_point(x, y)),
        }
    }

    Ok(bounds)
}

/// Scan an STL file on disk. See [`scan_bounds`].
pub fn load_bounds(path: &Path) -> std::io::Result<Option<Bounds2>> {
    let file = File::open(path)?;
    scan_bounds(BufReader::new(file))
}
