use crate::io::glob_sorted;
use crate::io::isce_xml::Component;
use crate::io::raster::{read_attribute, IsceRaster};
use crate::io::rsc::RscMetadata;
use crate::types::{PrepError, PrepResult};
use ndarray::{Array2, Axis};
use std::path::{Path, PathBuf};

/// Geometry rasters used for metadata, in lookup order
pub const GEOMETRY_BASENAMES: [&str; 4] = ["hgt", "lat", "lon", "los"];

/// Rows kept clear of the valid-data edge when picking corners
const ROW_BUFFER: usize = 2;

/// Geometry raster paths `<geom_dir>/<name>.rdr` that exist
pub fn existing_rdr_files(geom_dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    let geom_dir = std::fs::canonicalize(geom_dir).unwrap_or_else(|_| geom_dir.to_path_buf());
    names
        .iter()
        .map(|name| geom_dir.join(format!("{}.rdr", name)))
        .filter(|p| p.is_file())
        .collect()
}

/// Multilook factors of the geometry relative to its full-resolution
/// version, and the effective number of independent looks for
/// coherence estimation.
///
/// The first of `hgt`, `lat`, `lon`, `los` that has a `<file>.full.xml`
/// descriptor decides `ALOOKS` / `RLOOKS`; both default to 1.
pub fn extract_multilook_number(geom_dir: &Path, meta: &RscMetadata) -> PrepResult<RscMetadata> {
    let mut meta = meta.clone();

    for base in GEOMETRY_BASENAMES {
        let mut fnames = glob_sorted(geom_dir, &format!("{}*.rdr", base))?;
        fnames.extend(glob_sorted(geom_dir, &format!("{}*.geo", base))?);
        let Some(fname) = fnames.first() else {
            continue;
        };

        let mut full_xml = fname.as_os_str().to_owned();
        full_xml.push(".full.xml");
        let full_xml = PathBuf::from(full_xml);
        if !full_xml.is_file() {
            continue;
        }

        let full = Component::load(&full_xml)?;
        let full_length = full.get_i64("length")?;
        let full_width = full.get_i64("width")?;
        let multilooked = read_attribute(fname)?;
        let length = multilooked.get_f64("LENGTH")? as i64;
        let width = multilooked.get_f64("WIDTH")? as i64;
        if length <= 0 || width <= 0 {
            return Err(PrepError::InvalidFormat(format!(
                "Invalid size {}x{} of {}",
                length,
                width,
                fname.display()
            )));
        }

        meta.insert("ALOOKS", (full_length / length).to_string());
        meta.insert("RLOOKS", (full_width / width).to_string());
        log::debug!(
            "multilook number from {}: {} x {}",
            fname.display(),
            full_length / length,
            full_width / width
        );
        break;
    }

    for key in ["ALOOKS", "RLOOKS"] {
        if !meta.contains_key(key) {
            meta.insert(key, "1");
        }
    }

    let rg_fact = meta.get_f64("rangeResolution")? / meta.get_f64("rangePixelSize")?;
    let az_fact = meta.get_f64("azimuthResolution")? / meta.get_f64("azimuthPixelSize")?;
    let looks = meta.get_f64("RLOOKS")? * meta.get_f64("ALOOKS")?;
    meta.insert_f64("NCORRLOOKS", looks / (rg_fact * az_fact));
    Ok(meta)
}

/// First and last row with no zero sample, moved `buffer` rows inward.
///
/// Merged multi-swath geometry is zero-filled outside the data; a raster
/// without zeros uses its own edges.
pub fn nonzero_row_range(data: &Array2<f64>, buffer: usize) -> PrepResult<(usize, usize)> {
    let rows = data.nrows();
    let (first, last) = if data.iter().all(|v| *v != 0.0) {
        (0, rows.saturating_sub(1))
    } else {
        let full_rows: Vec<usize> = data
            .axis_iter(Axis(0))
            .enumerate()
            .filter(|(_, row)| row.iter().all(|v| *v != 0.0))
            .map(|(i, _)| i)
            .collect();
        match (full_rows.first(), full_rows.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => {
                return Err(PrepError::Processing(
                    "No row without zero values in geometry raster".to_string(),
                ))
            }
        }
    };

    let r0 = first + buffer;
    let r1 = last.checked_sub(buffer).filter(|r1| *r1 < rows);
    match r1 {
        Some(r1) if r0 < rows => Ok((r0, r1)),
        _ => Err(PrepError::Processing(format!(
            "Geometry raster with {} rows is too small for a {}-row buffer",
            rows, buffer
        ))),
    }
}

/// Radar heading (ROI_PAC convention, degrees in [-180, 180]) from the
/// ISCE line-of-sight azimuth angle
pub fn azimuth_angle_to_heading(az_angle: f64) -> f64 {
    let mut heading = -(270.0 + az_angle);
    heading -= (heading / 360.0).round_ties_even() * 360.0;
    heading
}

/// Mean of the non-zero, non-NaN samples
fn nonzero_mean(data: &Array2<f64>) -> Option<f64> {
    let (sum, count) = data
        .iter()
        .filter(|v| **v != 0.0 && !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Corner coordinates of a lat/lon raster at the valid-row range
fn corner_values(raster: &IsceRaster, prefix: &str, meta: &mut RscMetadata) -> PrepResult<()> {
    let data = raster.read_band(1)?;
    let (r0, r1) = nonzero_row_range(&data, ROW_BUFFER)?;
    let last_col = data.ncols() - 1;
    let corners = [(r0, 0), (r0, last_col), (r1, 0), (r1, last_col)];
    for (i, (row, col)) in corners.iter().enumerate() {
        meta.insert(
            format!("{}_REF{}", prefix, i + 1),
            raster.format_sample(data[[*row, *col]]),
        );
    }
    Ok(())
}

/// Add geometry-derived metadata: multilook numbers, multilooked pixel
/// sizes, `LAT_REF1..4` / `LON_REF1..4` corners and `HEADING`.
pub fn extract_geometry_metadata(geom_dir: &Path, meta: &RscMetadata) -> PrepResult<RscMetadata> {
    let geom_files = existing_rdr_files(geom_dir, &GEOMETRY_BASENAMES);
    log::info!(
        "extract metadata from geometry files: {:?}",
        geom_files
            .iter()
            .filter_map(|f| f.file_name().and_then(|n| n.to_str()))
            .collect::<Vec<_>>()
    );

    let mut meta = extract_multilook_number(geom_dir, meta)?;

    let range_pixel_size = meta.get_f64("rangePixelSize")? * meta.get_f64("RLOOKS")?;
    let azimuth_pixel_size = meta.get_f64("azimuthPixelSize")? * meta.get_f64("ALOOKS")?;
    meta.insert_f64("rangePixelSize", range_pixel_size);
    meta.insert_f64("azimuthPixelSize", azimuth_pixel_size);

    for geom_file in &geom_files {
        let base = geom_file
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("");
        match base {
            "lat" => corner_values(&IsceRaster::open(geom_file)?, "LAT", &mut meta)?,
            "lon" => corner_values(&IsceRaster::open(geom_file)?, "LON", &mut meta)?,
            "los" => {
                let raster = IsceRaster::open(geom_file)?;
                // band 1: incidence angle, band 2: azimuth angle
                let az = raster.read_band(2)?;
                let az_angle = nonzero_mean(&az).ok_or_else(|| {
                    PrepError::Processing(format!(
                        "No valid azimuth angle in {}",
                        geom_file.display()
                    ))
                })?;
                let heading = azimuth_angle_to_heading(az_angle);
                log::debug!("mean azimuth angle {} -> heading {}", az_angle, heading);
                meta.insert("HEADING", raster.format_sample(heading));
            }
            _ => {}
        }
    }
    Ok(meta)
}
