use crate::core::geometry::existing_rdr_files;
use crate::io::baseline::BaselineTimeseries;
use crate::io::glob_sorted;
use crate::io::raster::read_attribute;
use crate::io::rsc::{format_float, write_roipac_rsc, RscMetadata};
use crate::types::{PrepError, PrepResult};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Geometry rasters that get their own `.rsc` file
pub const GEOMETRY_RSC_BASENAMES: [&str; 6] =
    ["hgt", "lat", "lon", "los", "shadowMask", "incLocal"];

/// Reference and secondary date from an interferogram directory name
/// such as `20170102_20170114`
pub fn parse_date_pair(name: &str) -> PrepResult<(String, String)> {
    let re = Regex::new(r"(\d{6,8})_(\d{6,8})")
        .map_err(|e| PrepError::Processing(format!("Invalid date pair pattern: {}", e)))?;
    let caps = re.captures(name).ok_or_else(|| {
        PrepError::InvalidFormat(format!("No date pair in directory name: {}", name))
    })?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

/// Copy of `meta` with the metadata unique to one interferogram:
/// `DATE12` in `YYMMDD-YYMMDD` and, with a baseline time-series, the
/// perpendicular baseline of the pair.
pub fn add_ifgram_metadata(
    meta: &RscMetadata,
    dates: (&str, &str),
    baselines: Option<&BaselineTimeseries>,
) -> PrepResult<RscMetadata> {
    let (date1, date2) = dates;
    let short = |date: &str| -> PrepResult<String> {
        date.get(2..)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PrepError::InvalidFormat(format!("Invalid date: {}", date)))
    };

    let mut meta = meta.clone();
    meta.insert("DATE12", format!("{}-{}", short(date1)?, short(date2)?));

    if let Some(baselines) = baselines {
        match (baselines.get(date1), baselines.get(date2)) {
            (Some(b1), Some(b2)) => {
                meta.insert("P_BASELINE_TOP_HDR", format_float(b2[0] - b1[0]));
                meta.insert("P_BASELINE_BOTTOM_HDR", format_float(b2[1] - b1[1]));
            }
            _ => log::warn!(
                "no perp baseline for {}_{}, skip P_BASELINE_*_HDR",
                date1,
                date2
            ),
        }
    }
    Ok(meta)
}

fn rsc_path(file: &Path) -> PathBuf {
    let mut rsc = file.as_os_str().to_owned();
    rsc.push(".rsc");
    PathBuf::from(rsc)
}

/// Write `<file>.rsc` next to each existing geometry raster of
/// `geom_dir`: the raster's own attributes, overridden by `meta`.
pub fn prepare_geometry(
    geom_dir: &Path,
    meta: &RscMetadata,
    update_mode: bool,
) -> PrepResult<RscMetadata> {
    log::info!("prepare .rsc file for geometry files");

    for geom_file in existing_rdr_files(geom_dir, &GEOMETRY_RSC_BASENAMES) {
        let mut geom_meta = read_attribute(&geom_file)?;
        geom_meta.update(meta);

        let rsc_file = rsc_path(&geom_file);
        if write_roipac_rsc(&geom_meta, &rsc_file, update_mode)? {
            log::info!("write file: {}", rsc_file.display());
        }
    }
    Ok(meta.clone())
}

fn prepare_ifgram_file(
    ifg_file: &Path,
    meta: &RscMetadata,
    baselines: Option<&BaselineTimeseries>,
    update_mode: bool,
) -> PrepResult<String> {
    let dir_name = ifg_file
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let (date1, date2) = parse_date_pair(dir_name)?;

    let mut ifg_meta = read_attribute(ifg_file)?;
    ifg_meta.update(meta);
    let ifg_meta = add_ifgram_metadata(&ifg_meta, (&date1, &date2), baselines)?;

    write_roipac_rsc(&ifg_meta, rsc_path(ifg_file), update_mode)?;
    Ok(format!("{}_{}", date1, date2))
}

/// Write `<file>.rsc` for every `ifg_dir/*/pattern` file, in path
/// order. Returns the number of files processed.
pub fn prepare_stack(
    ifg_dir: &Path,
    pattern: &str,
    meta: &RscMetadata,
    baselines: Option<&BaselineTimeseries>,
    update_mode: bool,
) -> PrepResult<usize> {
    log::info!("prepare .rsc file for {}", pattern);
    let ifg_dir = std::fs::canonicalize(ifg_dir).unwrap_or_else(|_| ifg_dir.to_path_buf());
    let ifg_files = glob_sorted(&ifg_dir, &format!("*/{}", pattern))?;
    if ifg_files.is_empty() {
        return Err(PrepError::NotFound(format!(
            "no file found in pattern: {}",
            pattern
        )));
    }

    // in path order; a failing pair leaves the earlier ones written
    let num_file = ifg_files.len();
    for (i, ifg_file) in ifg_files.iter().enumerate() {
        let pair = prepare_ifgram_file(ifg_file, meta, baselines, update_mode)?;
        log::debug!("[{}/{}] {}", i + 1, num_file, pair);
        if (i + 1) % 100 == 0 || i + 1 == num_file {
            log::info!("{}/{} .rsc files prepared for {}", i + 1, num_file, pattern);
        }
    }

    Ok(num_file)
}
