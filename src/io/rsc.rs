use crate::types::{PrepError, PrepResult};
use chrono::{NaiveDateTime, Timelike};
use num_traits::Float;
use std::collections::BTreeMap;
use std::fmt::{Display, LowerExp};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Tool-specific attribute names and the standard key each one maps to
const STANDARD_METADATA_KEYS: &[(&str, &[&str])] = &[
    ("ALOOKS", &["azimuth_looks"]),
    ("RLOOKS", &["range_looks"]),
    (
        "AZIMUTH_PIXEL_SIZE",
        &["azimuthPixelSize", "azimuth_pixel_spacing", "az_pixel_spacing", "azimuth_spacing"],
    ),
    (
        "RANGE_PIXEL_SIZE",
        &["rangePixelSize", "range_pixel_spacing", "rg_pixel_spacing", "range_spacing"],
    ),
    ("CENTER_LINE_UTC", &["center_time"]),
    ("DATA_TYPE", &["dataType", "data_type"]),
    ("EARTH_RADIUS", &["earthRadius", "earth_radius_below_sensor", "earth_radius"]),
    ("HEADING", &["HEADING_DEG", "heading", "centre_heading"]),
    ("HEIGHT", &["altitude", "SC_height"]),
    ("BANDS", &["number_bands", "bands"]),
    ("BYTE_ORDER", &["byte_order", "byteOrder"]),
    ("INTERLEAVE", &["scheme", "interleave"]),
    (
        "LENGTH",
        &[
            "length",
            "FILE_LENGTH",
            "lines",
            "azimuth_lines",
            "nlines",
            "az_samp",
            "interferogram_azimuth_lines",
            "num_output_lines",
        ],
    ),
    ("LAT_REF1", &["first_near_lat"]),
    ("LON_REF1", &["first_near_long"]),
    ("LAT_REF2", &["first_far_lat"]),
    ("LON_REF2", &["first_far_long"]),
    ("LAT_REF3", &["last_near_lat"]),
    ("LON_REF3", &["last_near_long"]),
    ("LAT_REF4", &["last_far_lat"]),
    ("LON_REF4", &["last_far_long"]),
    ("ORBIT_DIRECTION", &["passDirection", "pass"]),
    ("NO_DATA_VALUE", &["NoDataValue"]),
    ("PLATFORM", &["spacecraftName", "sensor", "mission"]),
    ("POLARIZATION", &["polarization"]),
    ("PRF", &["prf", "pulse_repetition_frequency"]),
    (
        "STARTING_RANGE",
        &["startingRange", "near_range_slc", "near_range", "slant_range_to_first_pixel"],
    ),
    (
        "WAVELENGTH",
        &["wavelength", "Wavelength", "radarWavelength", "radar_wavelength"],
    ),
    (
        "WIDTH",
        &[
            "width",
            "Width",
            "samples",
            "range_samp",
            "interferogram_width",
            "num_samples_per_line",
        ],
    ),
    ("X_FIRST", &["corner_lon", "corner_east"]),
    ("X_STEP", &["post_lon", "post_east"]),
    ("Y_FIRST", &["corner_lat", "corner_north"]),
    ("Y_STEP", &["post_lat", "post_north"]),
];

/// Ordered string-valued metadata record.
///
/// Keys iterate in byte order, which is also the order they are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RscMetadata {
    entries: BTreeMap<String, String>,
}

impl RscMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries.insert(key.into(), value.into());
    }

    /// Insert a float formatted the way the downstream reader expects
    pub fn insert_f64<K: Into<String>>(&mut self, key: K, value: f64) {
        self.insert(key, format_float(value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_f64(&self, key: &str) -> PrepResult<f64> {
        let value = self
            .get(key)
            .ok_or_else(|| PrepError::Metadata(format!("Missing metadata key: {}", key)))?;
        value.trim().parse::<f64>().map_err(|e| {
            PrepError::InvalidFormat(format!("Invalid number for {}: {} ({})", key, value, e))
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Copy every entry of `other` into `self`, overriding existing keys
    pub fn update(&mut self, other: &RscMetadata) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RscMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = RscMetadata::new();
        for (k, v) in iter {
            meta.insert(k, v);
        }
        meta
    }
}

/// Rename tool-specific keys to their standard names.
///
/// A standard key already present wins over any alias, and the alias is
/// dropped.
pub fn standardize_metadata(meta: &RscMetadata) -> RscMetadata {
    let mut out = meta.clone();
    for (key, value) in meta.iter() {
        let standard = STANDARD_METADATA_KEYS
            .iter()
            .find(|(_, aliases)| aliases.contains(&key.as_str()))
            .map(|(std_key, _)| *std_key);

        if let Some(std_key) = standard {
            out.remove(key);
            if !meta.contains_key(std_key) {
                out.insert(std_key, value.clone());
            }
        }
    }
    out
}

/// Read a ROI_PAC `.rsc` file
pub fn read_roipac_rsc<P: AsRef<Path>>(path: P) -> PrepResult<RscMetadata> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| PrepError::Io(std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))))?;

    let mut meta = RscMetadata::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
            continue;
        }
        let line = line.replace('\t', " ");
        if let Some((key, value)) = line.split_once(' ') {
            let value = value.trim();
            if !value.is_empty() {
                meta.insert(key.trim(), value);
            }
        }
    }
    Ok(meta)
}

/// Read a `key<delimiter>value` template file. Comment lines and
/// trailing `#` comments are ignored, as are keys with empty values.
pub fn read_template<P: AsRef<Path>>(path: P, delimiter: char) -> PrepResult<RscMetadata> {
    let content = fs::read_to_string(path.as_ref())?;
    let mut meta = RscMetadata::new();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') || line.starts_with('%') {
            continue;
        }
        if let Some((key, value)) = line.split_once(delimiter) {
            let value = value.split('#').next().unwrap_or("").trim();
            if !value.is_empty() {
                meta.insert(key.trim(), value);
            }
        }
    }
    Ok(meta)
}

/// Write a ROI_PAC `.rsc` file.
///
/// Keys with an empty value are left out, since they cannot be read
/// back. In update mode an existing file with identical contents is
/// left untouched. Returns `true` when the file was written.
pub fn write_roipac_rsc<P: AsRef<Path>>(
    meta: &RscMetadata,
    path: P,
    update_mode: bool,
) -> PrepResult<bool> {
    let path = path.as_ref();
    let meta: RscMetadata = meta.iter().filter(|(_, v)| !v.trim().is_empty()).collect();

    if update_mode && path.is_file() {
        match read_roipac_rsc(path) {
            Ok(existing) if existing == meta => {
                log::debug!("{} exists and is up to date, skip writing", path.display());
                return Ok(false);
            }
            Ok(_) => {}
            Err(e) => log::warn!("Could not read existing {}: {}", path.display(), e),
        }
    }

    let width = meta.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for (key, value) in meta.iter() {
        writeln!(writer, "{:<width$}    {}", key, value, width = width)?;
    }
    writer.flush()?;
    log::debug!("Wrote {}", path.display());
    Ok(true)
}

/// Whether an output needs regenerating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOrSkip {
    Run,
    Skip,
}

/// `Skip` when `out_file` exists and none of `in_files` was modified
/// after it
pub fn run_or_skip<P: AsRef<Path>>(out_file: P, in_files: &[&Path]) -> PrepResult<RunOrSkip> {
    let out_file = out_file.as_ref();
    if !out_file.is_file() {
        log::debug!("{} does not exist, run", out_file.display());
        return Ok(RunOrSkip::Run);
    }

    let out_time = fs::metadata(out_file)?.modified()?;
    for in_file in in_files {
        let in_time = fs::metadata(in_file)?.modified()?;
        if in_time > out_time {
            log::info!(
                "{} is newer than {}, run",
                in_file.display(),
                out_file.display()
            );
            return Ok(RunOrSkip::Run);
        }
    }

    log::info!("{} exists and is newer than its inputs, skip", out_file.display());
    Ok(RunOrSkip::Skip)
}

/// Shortest round-trip text of a float, in the notation the downstream
/// reader writes: integral values keep a trailing `.0`, and magnitudes
/// outside `[1e-4, 1e16)` use a signed two-digit exponent (`1e-05`).
pub fn format_float<T: Float + Display + LowerExp>(value: T) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > T::zero() { "inf" } else { "-inf" }.to_string();
    }
    if value.is_zero() {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sci = format!("{:e}", value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (sci.clone(), 0),
    };

    if !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let plain = format!("{}", value);
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

/// `YYYY-MM-DD HH:MM:SS`, with `.ffffff` only for non-zero microseconds
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    let micros = dt.nanosecond() / 1_000;
    if micros == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        format!("{}.{:06}", dt.format("%Y-%m-%d %H:%M:%S"), micros)
    }
}
