//! I/O modules for ISCE products, rasters, baselines and `.rsc` files

pub mod baseline;
pub mod isce_xml;
pub mod orbit;
pub mod product;
pub mod raster;
pub mod rsc;

pub use isce_xml::Component;
pub use orbit::OrbitReader;
pub use raster::IsceRaster;
pub use rsc::RscMetadata;

use crate::types::{PrepError, PrepResult};
use std::path::{Path, PathBuf};

/// Sorted files matching `pattern` below `dir`
pub fn glob_sorted(dir: &Path, pattern: &str) -> PrepResult<Vec<PathBuf>> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let mut files = glob::glob(&full)
        .map_err(|e| PrepError::InvalidFormat(format!("Invalid pattern {}: {}", full, e)))?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}
