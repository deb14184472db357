use crate::core::geodesy::{norm, Ellipsoid};
use crate::core::geometry::extract_geometry_metadata;
use crate::io::glob_sorted;
use crate::io::orbit::{seconds_between, OrbitReader};
use crate::io::product::{StripmapFrame, TopsSwathProduct, SPEED_OF_LIGHT};
use crate::io::rsc::{
    format_datetime, read_roipac_rsc, run_or_skip, standardize_metadata,
    write_roipac_rsc, RscMetadata, RunOrSkip,
};
use crate::types::{OrbitData, PrepError, PrepResult, Processor};
use chrono::{NaiveDateTime, Timelike};
use std::path::{Path, PathBuf};

/// Spatial resolution of one Sentinel-1 IW sub-swath
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwathResolution {
    pub range_resolution: f64,
    pub azimuth_resolution: f64,
}

/// Sentinel-1 TOPS resolution per sub-swath (Sentinel-1 Product
/// Definition, table 7-5). Typical azimuth resolution / pixel size is
/// 1.46, range 1.33.
pub const TOPS_RESOLUTION: [(&str, SwathResolution); 3] = [
    (
        "IW1",
        SwathResolution {
            range_resolution: 2.7,
            azimuth_resolution: 22.5,
        },
    ),
    (
        "IW2",
        SwathResolution {
            range_resolution: 3.1,
            azimuth_resolution: 22.7,
        },
    ),
    (
        "IW3",
        SwathResolution {
            range_resolution: 3.5,
            azimuth_resolution: 22.6,
        },
    ),
];

pub fn tops_resolution(swath: &str) -> PrepResult<SwathResolution> {
    TOPS_RESOLUTION
        .iter()
        .find(|(name, _)| *name == swath)
        .map(|(_, res)| *res)
        .ok_or_else(|| PrepError::Metadata(format!("No TOPS resolution for swath {}", swath)))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Detect the ISCE stack processor from the metadata file location
pub fn get_processor<P: AsRef<Path>>(meta_file: P) -> PrepResult<Processor> {
    let meta_file = meta_file.as_ref();
    let meta_dir = parent_dir(meta_file);

    let processor = if !glob_sorted(&meta_dir, "IW*.xml")?.is_empty() {
        Processor::Tops
    } else if meta_dir.join("data.dat").is_file() {
        Processor::Stripmap
    } else if meta_file.to_string_lossy().ends_with(".xml") {
        Processor::Stripmap
    } else {
        return Err(PrepError::InvalidFormat(format!(
            "Un-recognized ISCE processor for metadata file: {}",
            meta_file.display()
        )));
    };
    log::debug!("{} -> ISCE/{}", meta_file.display(), processor);
    Ok(processor)
}

/// Seconds of day of a timestamp, whole seconds only
fn center_line_utc(time: &NaiveDateTime) -> f64 {
    time.hour() as f64 * 3600.0 + time.minute() as f64 * 60.0 + time.second() as f64
}

/// Platform speed, peg radius of curvature and ellipsoid height at
/// the middle of the acquisition
struct OrbitGeometry {
    speed: f64,
    earth_radius: f64,
    altitude: f64,
}

impl OrbitGeometry {
    fn at(orbit: &OrbitData, sensing_mid: NaiveDateTime) -> PrepResult<Self> {
        let (position, velocity) = OrbitReader::interpolate(orbit, sensing_mid)?;
        let heading = OrbitReader::enu_heading(orbit, sensing_mid)?;

        let elp = Ellipsoid::wgs84();
        let llh = elp.xyz_to_llh(position);
        let geometry = Self {
            speed: norm(&velocity),
            earth_radius: elp.radius_of_curvature(llh[0], heading),
            altitude: llh[2],
        };
        log::debug!(
            "Orbit at {}: speed {:.3} m/s, heading {:.3} deg, radius {:.3} m, height {:.3} m",
            sensing_mid,
            geometry.speed,
            heading,
            geometry.earth_radius,
            geometry.altitude
        );
        Ok(geometry)
    }
}

/// Sub-swath whose resolution applies to `xml_file`: its stem for
/// `IW*.xml`, the middle swath `IW2` for any other name
fn resolution_swath(xml_file: &Path) -> &str {
    let file_name = xml_file.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if file_name.starts_with("IW") {
        xml_file.file_stem().and_then(|n| n.to_str()).unwrap_or("IW2")
    } else {
        "IW2"
    }
}

/// Scene metadata of a Sentinel-1 TOPS swath product (`IW*.xml`)
pub fn extract_tops_metadata<P: AsRef<Path>>(xml_file: P) -> PrepResult<RscMetadata> {
    let xml_file = xml_file.as_ref();
    let product = TopsSwathProduct::load(xml_file)?;
    let burst = product.first_burst();
    let burst_end = product.last_burst();

    let mut meta = RscMetadata::new();
    meta.insert_f64("prf", burst.prf);
    meta.insert("startUTC", format_datetime(&burst.burst_start_utc));
    meta.insert("stopUTC", format_datetime(&burst_end.burst_stop_utc));
    meta.insert_f64("radarWavelength", burst.radar_wavelength);
    meta.insert_f64("startingRange", burst.starting_range);
    meta.insert("passDirection", burst.pass_direction.clone());
    meta.insert("polarization", burst.polarization.clone());
    meta.insert("trackNumber", burst.track_number.to_string());
    meta.insert("orbitNumber", burst.orbit_number.to_string());
    meta.insert_f64("CENTER_LINE_UTC", center_line_utc(&burst.burst_start_utc));

    let geometry = OrbitGeometry::at(&burst.orbit, burst.sensing_mid)?;
    meta.insert_f64("azimuthPixelSize", geometry.speed * burst.azimuth_time_interval);
    meta.insert_f64("rangePixelSize", burst.range_pixel_size);

    let resolution = tops_resolution(resolution_swath(xml_file))?;
    meta.insert_f64("azimuthResolution", resolution.azimuth_resolution);
    meta.insert_f64("rangeResolution", resolution.range_resolution);

    meta.insert_f64("earthRadius", geometry.earth_radius);
    meta.insert_f64("altitude", geometry.altitude);

    meta.insert("beam_mode", "IW");
    meta.insert("swathNumber", burst.swath_number.to_string());
    let swath_files = glob_sorted(&parent_dir(xml_file), "IW*.xml")?;
    if swath_files.len() > 1 {
        let mut swath_numbers = swath_files
            .iter()
            .map(|f| TopsSwathProduct::load(f).map(|p| p.first_burst().swath_number))
            .collect::<PrepResult<Vec<_>>>()?;
        swath_numbers.sort_unstable();
        let joined: String = swath_numbers.iter().map(|n| n.to_string()).collect();
        meta.insert("swathNumber", joined);
    }

    // ASF frame number: 5 s per frame since the ascending node
    let first_frame =
        (0.2 * seconds_between(burst.burst_start_utc, product.ascending_node_time)).trunc() as i64;
    let last_frame =
        (0.2 * seconds_between(burst_end.burst_stop_utc, product.ascending_node_time)).trunc() as i64;
    meta.insert("firstFrameNumber", first_frame.to_string());
    meta.insert("lastFrameNumber", last_frame.to_string());

    if let Some(name) = &product.spacecraft_name {
        meta.insert("spacecraftName", name.clone());
    }
    Ok(meta)
}

/// Scene metadata of a StripMap frame
pub fn extract_stripmap_metadata<P: AsRef<Path>>(meta_file: P) -> PrepResult<RscMetadata> {
    let frame = StripmapFrame::load(meta_file)?;

    let mut meta = RscMetadata::new();
    meta.insert_f64("prf", frame.prf);
    meta.insert("startUTC", format_datetime(&frame.sensing_start));
    meta.insert("stopUTC", format_datetime(&frame.sensing_stop));
    meta.insert_f64("radarWavelength", frame.radar_wavelength);
    meta.insert_f64("startingRange", frame.starting_range);
    meta.insert("polarization", frame.polarization.clone());
    meta.insert("trackNumber", frame.track_number.to_string());
    meta.insert("orbitNumber", frame.orbit_number.to_string());
    meta.insert_f64("CENTER_LINE_UTC", center_line_utc(&frame.sensing_start));

    let geometry = OrbitGeometry::at(&frame.orbit, frame.sensing_mid)?;
    meta.insert_f64("azimuthResolution", frame.antenna_length / 2.0);
    meta.insert_f64("azimuthPixelSize", geometry.speed / frame.prf);

    let range_bandwidth = frame.instrument.pulse_length * frame.instrument.chirp_slope;
    meta.insert_f64(
        "rangeResolution",
        (SPEED_OF_LIGHT / (2.0 * range_bandwidth)).abs(),
    );
    meta.insert_f64("rangePixelSize", frame.instrument.range_pixel_size);

    meta.insert_f64("earthRadius", geometry.earth_radius);
    meta.insert_f64("altitude", geometry.altitude);

    meta.insert("beam_mode", "SM");
    if let Some(name) = &frame.spacecraft_name {
        meta.insert("spacecraftName", name.clone());
    }
    Ok(meta)
}

/// Common metadata of an ISCE stack, written to `data.rsc`.
///
/// `rsc_file` defaults to `data.rsc` next to `meta_file`. In update mode
/// an existing `data.rsc` newer than `meta_file` is read back instead of
/// being regenerated.
pub fn extract_isce_metadata(
    meta_file: &Path,
    geom_dir: Option<&Path>,
    rsc_file: Option<&Path>,
    update_mode: bool,
) -> PrepResult<RscMetadata> {
    let rsc_file = rsc_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| parent_dir(meta_file).join("data.rsc"));

    if update_mode && run_or_skip(&rsc_file, &[meta_file])? == RunOrSkip::Skip {
        return read_roipac_rsc(&rsc_file);
    }

    let mut meta = match get_processor(meta_file)? {
        Processor::Tops => {
            log::info!(
                "extract metadata from ISCE/topsStack xml file: {}",
                meta_file.display()
            );
            extract_tops_metadata(meta_file)?
        }
        Processor::Stripmap => {
            log::info!(
                "extract metadata from ISCE/stripmapStack file: {}",
                meta_file.display()
            );
            extract_stripmap_metadata(meta_file)?
        }
    };

    if let Some(geom_dir) = geom_dir {
        meta = extract_geometry_metadata(geom_dir, &meta)?;
    }

    meta.insert("PROCESSOR", "isce");
    meta.insert("ANTENNA_SIDE", "-1");

    let meta = standardize_metadata(&meta);
    log::info!("writing {}", rsc_file.display());
    write_roipac_rsc(&meta, &rsc_file, false)?;
    Ok(meta)
}
