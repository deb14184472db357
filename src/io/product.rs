use crate::io::isce_xml::Component;
use crate::io::orbit::OrbitReader;
use crate::types::{OrbitData, PrepError, PrepResult};
use chrono::NaiveDateTime;
use std::path::Path;

/// Speed of light in m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

fn midpoint(start: NaiveDateTime, stop: NaiveDateTime) -> NaiveDateTime {
    start + (stop - start) / 2
}

/// Normalize a polarization label: `H/V` -> `HV`, `b'VV'` -> `VV`
pub fn normalize_polarization(raw: &str) -> String {
    let pol = raw.trim().replace('/', "");
    if let Some(rest) = pol.strip_prefix("b'") {
        rest.chars().take(2).collect()
    } else {
        pol
    }
}

/// One burst of a TOPS swath
#[derive(Debug, Clone)]
pub struct Burst {
    pub prf: f64,
    pub burst_start_utc: NaiveDateTime,
    pub burst_stop_utc: NaiveDateTime,
    pub sensing_mid: NaiveDateTime,
    pub radar_wavelength: f64,
    pub starting_range: f64,
    pub pass_direction: String,
    pub polarization: String,
    pub track_number: i64,
    pub orbit_number: i64,
    pub swath_number: i64,
    pub azimuth_time_interval: f64,
    pub range_pixel_size: f64,
    pub orbit: OrbitData,
}

impl Burst {
    pub fn from_component(burst: &Component) -> PrepResult<Self> {
        let burst_start_utc = burst.get_datetime("burstStartUTC")?;
        let burst_stop_utc = burst.get_datetime("burstStopUTC")?;

        let sensing_mid = if burst.has_property("sensingMid") {
            burst.get_datetime("sensingMid")?
        } else if burst.has_property("sensingStart") && burst.has_property("sensingStop") {
            midpoint(burst.get_datetime("sensingStart")?, burst.get_datetime("sensingStop")?)
        } else {
            midpoint(burst_start_utc, burst_stop_utc)
        };

        let orbit = OrbitReader::from_component(burst.require_child("orbit")?)?;

        Ok(Self {
            prf: burst.get_f64("prf")?,
            burst_start_utc,
            burst_stop_utc,
            sensing_mid,
            radar_wavelength: burst.get_f64("radarWavelength")?,
            starting_range: burst.get_f64("startingRange")?,
            pass_direction: burst.get_str("passDirection")?.to_string(),
            polarization: normalize_polarization(burst.get_str("polarization")?),
            track_number: burst.get_i64("trackNumber")?,
            orbit_number: burst.get_i64("orbitNumber")?,
            swath_number: burst.get_i64("swathNumber")?,
            azimuth_time_interval: burst.get_f64("azimuthTimeInterval")?,
            range_pixel_size: burst.get_f64("rangePixelSize")?,
            orbit,
        })
    }
}

/// A Sentinel-1 TOPS swath product, e.g. `reference/IW2.xml`
#[derive(Debug, Clone)]
pub struct TopsSwathProduct {
    pub ascending_node_time: NaiveDateTime,
    pub spacecraft_name: Option<String>,
    pub bursts: Vec<Burst>,
}

impl TopsSwathProduct {
    pub fn load<P: AsRef<Path>>(path: P) -> PrepResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading TOPS swath product: {}", path.display());
        Self::from_component(Component::load(path)?.product_root())
            .map_err(|e| PrepError::Metadata(format!("{}: {}", path.display(), e)))
    }

    pub fn from_component(product: &Component) -> PrepResult<Self> {
        let bursts = product
            .require_child("bursts")?
            .components
            .iter()
            .map(Burst::from_component)
            .collect::<PrepResult<Vec<_>>>()?;

        if bursts.is_empty() {
            return Err(PrepError::Metadata(
                "TOPS product contains no bursts".to_string(),
            ));
        }

        Ok(Self {
            ascending_node_time: product.get_datetime("ascendingNodeTime")?,
            spacecraft_name: product
                .find_property(&["spacecraftName", "mission"])
                .map(str::to_string),
            bursts,
        })
    }

    pub fn first_burst(&self) -> &Burst {
        &self.bursts[0]
    }

    pub fn last_burst(&self) -> &Burst {
        &self.bursts[self.bursts.len() - 1]
    }
}

/// Radar instrument parameters of a StripMap frame
#[derive(Debug, Clone)]
pub struct Instrument {
    pub pulse_length: f64,
    pub chirp_slope: f64,
    pub range_pixel_size: f64,
}

/// A StripMap frame, as dumped by stripmapApp / stripmapStack
#[derive(Debug, Clone)]
pub struct StripmapFrame {
    pub prf: f64,
    pub sensing_start: NaiveDateTime,
    pub sensing_stop: NaiveDateTime,
    pub sensing_mid: NaiveDateTime,
    pub radar_wavelength: f64,
    pub starting_range: f64,
    pub polarization: String,
    pub track_number: i64,
    pub orbit_number: i64,
    pub antenna_length: f64,
    pub spacecraft_name: Option<String>,
    pub instrument: Instrument,
    pub orbit: OrbitData,
}

impl StripmapFrame {
    /// Load a frame from an XML dump.
    ///
    /// The stripmapStack shelve (`data.dat`) stores pickled Python
    /// objects and cannot be read here.
    pub fn load<P: AsRef<Path>>(path: P) -> PrepResult<Self> {
        let path = path.as_ref();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name == "data.dat" {
            return Err(PrepError::Unsupported(format!(
                "{} is a Python shelve of pickled frame objects; pass the frame XML \
                 (e.g. the stripmapApp <date>_slc_crop.xml) instead",
                path.display()
            )));
        }
        if !name.ends_with(".xml") {
            return Err(PrepError::InvalidFormat(format!(
                "un-recognized isce/stripmap metadata file: {}",
                path.display()
            )));
        }

        log::debug!("Loading StripMap frame: {}", path.display());
        Self::from_component(Component::load(path)?.product_root())
            .map_err(|e| PrepError::Metadata(format!("{}: {}", path.display(), e)))
    }

    pub fn from_component(frame: &Component) -> PrepResult<Self> {
        let instrument = frame.require_child("instrument")?;
        let platform = instrument
            .child("platform")
            .or_else(|| frame.child("platform"))
            .ok_or_else(|| PrepError::Metadata("Missing platform component".to_string()))?;

        // Frame accessors delegate to the instrument in ISCE
        let frame_or_instrument = |name: &str| -> PrepResult<f64> {
            if frame.has_property(name) {
                frame.get_f64(name)
            } else {
                instrument.get_f64(name)
            }
        };

        let sensing_start = frame.get_datetime("sensingStart")?;
        let sensing_stop = frame.get_datetime("sensingStop")?;
        let sensing_mid = if frame.has_property("sensingMid") {
            frame.get_datetime("sensingMid")?
        } else {
            midpoint(sensing_start, sensing_stop)
        };

        let range_pixel_size = if instrument.has_property("rangePixelSize") {
            instrument.get_f64("rangePixelSize")?
        } else {
            SPEED_OF_LIGHT / (2.0 * instrument.get_f64("rangeSamplingRate")?)
        };

        let orbit_node = frame
            .child("orbit")
            .or_else(|| frame.find_descendant("orbit"))
            .ok_or_else(|| PrepError::Metadata("Missing orbit component".to_string()))?;

        Ok(Self {
            prf: frame_or_instrument("prf")?,
            sensing_start,
            sensing_stop,
            sensing_mid,
            radar_wavelength: frame_or_instrument("radarWavelength")?,
            starting_range: frame.get_f64("startingRange")?,
            polarization: normalize_polarization(frame.get_str("polarization")?),
            track_number: frame.get_i64("trackNumber")?,
            orbit_number: frame.get_i64("orbitNumber")?,
            antenna_length: platform.get_f64("antennaLength")?,
            spacecraft_name: platform
                .find_property(&["spacecraftName", "mission"])
                .map(str::to_string),
            instrument: Instrument {
                pulse_length: instrument.get_f64("pulseLength")?,
                chirp_slope: instrument.get_f64("chirpSlope")?,
                range_pixel_size,
            },
            orbit: OrbitReader::from_component(orbit_node)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_polarization() {
        assert_eq!(normalize_polarization("HH"), "HH");
        assert_eq!(normalize_polarization("H/V"), "HV");
        assert_eq!(normalize_polarization("b'VV'"), "VV");
    }

    #[test]
    fn test_product_without_bursts_is_error() {
        let xml = r#"<productmanager_name>
    <component name="instance">
        <property name="ascendingnodetime"><value>2017-01-02 13:00:00</value></property>
        <property name="spacecraftname"><value>Sentinel-1A</value></property>
        <component name="bursts"></component>
    </component>
</productmanager_name>"#;
        let root = Component::parse(xml).unwrap();
        let err = TopsSwathProduct::from_component(root.product_root()).unwrap_err();
        assert!(matches!(err, PrepError::Metadata(_)));
        assert!(err.to_string().contains("no bursts"), "unexpected error: {}", err);

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("IW1.xml");
        std::fs::write(&path, xml).unwrap();
        assert!(matches!(TopsSwathProduct::load(&path), Err(PrepError::Metadata(_))));
    }

    #[test]
    fn test_shelve_file_is_unsupported() {
        let err = StripmapFrame::load("/tmp/referenceShelve/data.dat").unwrap_err();
        assert!(matches!(err, PrepError::Unsupported(_)));
    }

    #[test]
    fn test_frame_range_pixel_size_from_sampling_rate() {
        let xml = r#"<frame>
    <property name="sensing_start"><value>2012-05-07 06:10:00</value></property>
    <property name="sensing_stop"><value>2012-05-07 06:10:10</value></property>
    <property name="starting_range"><value>847000.0</value></property>
    <property name="polarization"><value>HH</value></property>
    <property name="track_number"><value>402</value></property>
    <property name="orbit_number"><value>27350</value></property>
    <component name="instrument">
        <property name="prf"><value>2159.827</value></property>
        <property name="radar_wavelength"><value>0.236057</value></property>
        <property name="pulse_length"><value>2.7e-05</value></property>
        <property name="chirp_slope"><value>-5.18518e+11</value></property>
        <property name="range_sampling_rate"><value>16000000.0</value></property>
        <component name="platform">
            <property name="antenna_length"><value>8.9</value></property>
            <property name="mission"><value>ALOS</value></property>
        </component>
    </component>
    <component name="orbit">
        <component name="state_vectors">
            <component name="sv1">
                <property name="time"><value>2012-05-07 06:09:50</value></property>
                <property name="position"><value>[1.0, 2.0, 3.0]</value></property>
                <property name="velocity"><value>[4.0, 5.0, 6.0]</value></property>
            </component>
        </component>
    </component>
</frame>"#;
        let frame = StripmapFrame::from_component(&Component::parse(xml).unwrap()).unwrap();
        assert!((frame.instrument.range_pixel_size - SPEED_OF_LIGHT / 32.0e6).abs() < 1e-9);
        assert_eq!(frame.sensing_mid.format("%H:%M:%S").to_string(), "06:10:05");
        assert_eq!(frame.spacecraft_name.as_deref(), Some("ALOS"));
        assert_eq!(frame.track_number, 402);
    }
}
