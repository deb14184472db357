//! Synthetic ISCE stack fixtures shared by the integration tests
#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Orbit radius and along-track speed of the synthetic satellite
pub const ORBIT_RADIUS: f64 = 7_071_000.0;
pub const ORBIT_SPEED: f64 = 7_500.0;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, micro: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .expect("valid date")
        .and_hms_micro_opt(h, min, s, micro)
        .expect("valid time")
}

/// State vectors of a circular polar orbit over the equator at `t0`,
/// heading north. One vector every 10 s from `t0 - 10 s`.
pub fn orbit_xml(t0: NaiveDateTime, count: usize) -> String {
    let omega = ORBIT_SPEED / ORBIT_RADIUS;
    let mut xml = String::from("<component name=\"orbit\">\n<component name=\"state_vectors\">\n");
    for k in 0..count {
        let dt = 10.0 * k as f64 - 10.0;
        let time = t0 + Duration::seconds(dt as i64);
        let theta = omega * dt;
        let position = [ORBIT_RADIUS * theta.cos(), 0.0, ORBIT_RADIUS * theta.sin()];
        let velocity = [-ORBIT_SPEED * theta.sin(), 0.0, ORBIT_SPEED * theta.cos()];
        xml.push_str(&format!(
            "<component name=\"statevector{}\">\n\
             <property name=\"time\"><value>{}</value></property>\n\
             <property name=\"position\"><value>[{:.9}, {:.9}, {:.9}]</value></property>\n\
             <property name=\"velocity\"><value>[{:.12}, {:.12}, {:.12}]</value></property>\n\
             </component>\n",
            k + 1,
            time.format("%Y-%m-%d %H:%M:%S"),
            position[0],
            position[1],
            position[2],
            velocity[0],
            velocity[1],
            velocity[2],
        ));
    }
    xml.push_str("</component>\n</component>\n");
    xml
}

/// A Sentinel-1 swath product with two bursts
pub fn write_tops_product(path: &Path, swath_number: u32) {
    let t0 = datetime(2017, 1, 2, 13, 10, 0, 0);
    let bursts = [
        (
            datetime(2017, 1, 2, 13, 10, 0, 123_456),
            datetime(2017, 1, 2, 13, 10, 3, 200_000),
        ),
        (
            datetime(2017, 1, 2, 13, 10, 2, 900_000),
            datetime(2017, 1, 2, 13, 10, 6, 0),
        ),
    ];

    let mut xml = String::from(
        "<productmanager_name>\n<component name=\"instance\">\n\
         <property name=\"ascendingnodetime\"><value>2017-01-02 13:00:00</value></property>\n\
         <property name=\"spacecraftname\"><value>Sentinel-1A</value></property>\n\
         <component name=\"bursts\">\n",
    );
    for (i, (start, stop)) in bursts.iter().enumerate() {
        xml.push_str(&format!(
            "<component name=\"burst{}\">\n\
             <property name=\"burststartutc\"><value>{}</value></property>\n\
             <property name=\"burststoputc\"><value>{}</value></property>\n\
             <property name=\"prf\"><value>1717.128973878037</value></property>\n\
             <property name=\"radarwavelength\"><value>0.05546576</value></property>\n\
             <property name=\"startingrange\"><value>800000.0</value></property>\n\
             <property name=\"passdirection\"><value>ASCENDING</value></property>\n\
             <property name=\"polarization\"><value>VV</value></property>\n\
             <property name=\"tracknumber\"><value>64</value></property>\n\
             <property name=\"orbitnumber\"><value>14660</value></property>\n\
             <property name=\"swathnumber\"><value>{}</value></property>\n\
             <property name=\"azimuthtimeinterval\"><value>0.002</value></property>\n\
             <property name=\"rangepixelsize\"><value>2.329562</value></property>\n\
             {}</component>\n",
            i + 1,
            start.format("%Y-%m-%d %H:%M:%S%.6f"),
            stop.format("%Y-%m-%d %H:%M:%S%.6f"),
            swath_number,
            orbit_xml(t0, 6),
        ));
    }
    xml.push_str("</component>\n</component>\n</productmanager_name>\n");
    fs::write(path, xml).expect("Failed to write TOPS product");
}

/// A StripMap frame dump with instrument, platform and orbit
pub fn write_stripmap_frame(path: &Path) {
    let t0 = datetime(2012, 5, 7, 6, 10, 0, 0);
    let xml = format!(
        r#"<frame>
    <property name="sensing_start"><value>2012-05-07 06:10:00.250000</value></property>
    <property name="sensing_stop"><value>2012-05-07 06:10:10.250000</value></property>
    <property name="starting_range"><value>847000.0</value></property>
    <property name="polarization"><value>H/H</value></property>
    <property name="track_number"><value>402</value></property>
    <property name="orbit_number"><value>27350</value></property>
    <component name="instrument">
        <property name="prf"><value>2500.0</value></property>
        <property name="radar_wavelength"><value>0.236057</value></property>
        <property name="pulse_length"><value>2.7e-05</value></property>
        <property name="chirp_slope"><value>-5.18518e+11</value></property>
        <property name="range_pixel_size"><value>9.368514</value></property>
        <component name="platform">
            <property name="antenna_length"><value>8.9</value></property>
            <property name="mission"><value>ALOS</value></property>
        </component>
    </component>
    {}
</frame>"#,
        orbit_xml(t0, 6)
    );
    fs::write(path, xml).expect("Failed to write StripMap frame");
}

/// ISCE image descriptor `<file>.xml`
pub fn image_xml(width: usize, length: usize, bands: usize, dtype: &str, scheme: &str) -> String {
    format!(
        r#"<imageFile>
    <property name="width"><value>{}</value></property>
    <property name="length"><value>{}</value></property>
    <property name="number_bands"><value>{}</value></property>
    <property name="data_type"><value>{}</value></property>
    <property name="scheme"><value>{}</value></property>
    <property name="byte_order"><value>l</value></property>
</imageFile>"#,
        width, length, bands, dtype, scheme
    )
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

pub fn write_f64_raster(path: &Path, width: usize, length: usize, value: impl Fn(usize, usize) -> f64) {
    let mut f = fs::File::create(path).expect("Failed to create raster");
    for row in 0..length {
        for col in 0..width {
            f.write_all(&value(row, col).to_le_bytes()).expect("Failed to write raster");
        }
    }
    fs::write(with_suffix(path, ".xml"), image_xml(width, length, 1, "DOUBLE", "BIP"))
        .expect("Failed to write raster descriptor");
}

pub const GEOM_WIDTH: usize = 8;
pub const GEOM_LENGTH: usize = 10;

/// `hgt`, `lat`, `lon`, `los` rasters, multilooked 10 x 3 from a
/// 100 x 24 full-resolution grid
pub fn write_geometry(geom_dir: &Path) {
    fs::create_dir_all(geom_dir).expect("Failed to create geometry dir");
    let (w, l) = (GEOM_WIDTH, GEOM_LENGTH);

    write_f64_raster(&geom_dir.join("hgt.rdr"), w, l, |_, _| 100.0);
    write_f64_raster(&geom_dir.join("lat.rdr"), w, l, |r, _| 30.0 + 0.5 * r as f64);
    write_f64_raster(&geom_dir.join("lon.rdr"), w, l, |_, c| -118.0 + 0.25 * c as f64);
    fs::write(
        geom_dir.join("hgt.rdr.full.xml"),
        image_xml(w * 3, l * 10, 1, "DOUBLE", "BIP"),
    )
    .expect("Failed to write full-resolution descriptor");

    // band 1 incidence, band 2 azimuth angle; first row zero-filled
    let los = geom_dir.join("los.rdr");
    let mut f = fs::File::create(&los).expect("Failed to create los");
    for row in 0..l {
        for value in [35.0f32, 100.0f32] {
            for _ in 0..w {
                let v = if row == 0 { 0.0f32 } else { value };
                f.write_all(&v.to_le_bytes()).expect("Failed to write los");
            }
        }
    }
    fs::write(with_suffix(&los, ".xml"), image_xml(w, l, 2, "FLOAT", "BIL"))
        .expect("Failed to write los descriptor");
}

/// `<ifg_dir>/<pair>/<name>` with only its descriptor holding content
pub fn write_ifgram(ifg_dir: &Path, pair: &str, name: &str) -> PathBuf {
    let dir = ifg_dir.join(pair);
    fs::create_dir_all(&dir).expect("Failed to create interferogram dir");
    let path = dir.join(name);
    fs::write(&path, b"").expect("Failed to write interferogram");
    fs::write(
        with_suffix(&path, ".xml"),
        image_xml(GEOM_WIDTH, GEOM_LENGTH, 2, "FLOAT", "BIL"),
    )
    .expect("Failed to write interferogram descriptor");
    path
}

pub fn rsc_of(path: &Path) -> PathBuf {
    with_suffix(path, ".rsc")
}
