use crate::io::isce_xml::Component;
use crate::io::rsc::{format_float, standardize_metadata, RscMetadata};
use crate::types::{Interleave, PrepError, PrepResult, RasterDataType};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Extensions that only mark the grid (radar / geocoded / full resolution)
const GRID_EXTENSIONS: [&str; 3] = ["rdr", "geo", "full"];

/// Physical unit by file type
fn unit_for_file_type(file_type: &str) -> Option<&'static str> {
    match file_type {
        ".unw" | ".int" | ".flat" => Some("radian"),
        ".cor" | ".coh" | ".conncomp" | "shadowMask" | "waterMask" => Some("1"),
        "hgt" | "z" => Some("m"),
        "lat" | "lon" | "los" | "incLocal" => Some("degree"),
        _ => None,
    }
}

/// Path of the ISCE descriptor for a raster: `<file>.xml`
pub fn xml_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut name = path.as_ref().as_os_str().to_owned();
    name.push(".xml");
    PathBuf::from(name)
}

/// File type used in the `FILE_TYPE` attribute.
///
/// `filt_fine.unw` gives `.unw`; geometry rasters such as `hgt.rdr`
/// have only a grid extension and give their base name, `hgt`.
pub fn file_type<P: AsRef<Path>>(path: P) -> String {
    let name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut stem = name.as_str();
    while let Some((base, ext)) = stem.rsplit_once('.') {
        if GRID_EXTENSIONS.contains(&ext) && !base.is_empty() {
            stem = base;
        } else {
            break;
        }
    }

    match stem.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => format!(".{}", ext),
        _ => stem.to_string(),
    }
}

/// Flat binary raster described by an ISCE image `.xml` file
#[derive(Debug, Clone)]
pub struct IsceRaster {
    pub path: PathBuf,
    pub width: usize,
    pub length: usize,
    pub bands: usize,
    pub data_type: RasterDataType,
    pub interleave: Interleave,
    pub little_endian: bool,
}

impl IsceRaster {
    /// Open a raster through its `.xml` descriptor
    pub fn open<P: AsRef<Path>>(path: P) -> PrepResult<Self> {
        let path = path.as_ref().to_path_buf();
        let xml = Component::load(xml_path(&path))?;

        let width = xml.get_i64("width")?;
        let length = xml.get_i64("length")?;
        if width <= 0 || length <= 0 {
            return Err(PrepError::InvalidFormat(format!(
                "Invalid raster size {}x{} for {}",
                width,
                length,
                path.display()
            )));
        }

        let bands = match xml.property("number_bands") {
            Some(_) => xml.get_i64("number_bands")?.max(1) as usize,
            None => 1,
        };
        let data_type = RasterDataType::from_isce(xml.get_str("data_type")?)?;
        let interleave = match xml.property("scheme") {
            Some(s) => Interleave::from_isce(s)?,
            None => Interleave::BIP,
        };
        let little_endian = !matches!(
            xml.property("byte_order").map(|s| s.to_lowercase()),
            Some(ref s) if s.starts_with('b')
        );

        Ok(Self {
            path,
            width: width as usize,
            length: length as usize,
            bands,
            data_type,
            interleave,
            little_endian,
        })
    }

    /// Read one band (1-based) as a `length x width` array.
    /// Complex samples are returned as magnitude.
    pub fn read_band(&self, band: usize) -> PrepResult<Array2<f64>> {
        if band == 0 || band > self.bands {
            return Err(PrepError::InvalidFormat(format!(
                "Band {} out of range 1..={} for {}",
                band,
                self.bands,
                self.path.display()
            )));
        }
        log::debug!(
            "Reading band {} of {} ({}x{}, {:?}, {})",
            band,
            self.path.display(),
            self.length,
            self.width,
            self.data_type,
            self.interleave
        );

        #[cfg(feature = "gdal")]
        {
            self.read_band_gdal(band)
        }
        #[cfg(not(feature = "gdal"))]
        {
            self.read_band_native(band)
        }
    }

    fn read_band_native(&self, band: usize) -> PrepResult<Array2<f64>> {
        let size = self.data_type.size();
        let expected = (self.width * self.length * self.bands * size) as u64;
        let actual = std::fs::metadata(&self.path)?.len();
        if actual < expected {
            return Err(PrepError::InvalidFormat(format!(
                "{} holds {} bytes, descriptor requires {}",
                self.path.display(),
                actual,
                expected
            )));
        }

        let mut reader = BufReader::new(File::open(&self.path)?);
        let b = band - 1;
        let row_samples = match self.interleave {
            Interleave::BIP => self.width * self.bands,
            Interleave::BIL | Interleave::BSQ => self.width,
        };
        let mut row_bytes = vec![0u8; row_samples * size];
        let mut data = Vec::with_capacity(self.width * self.length);

        for row in 0..self.length {
            let sample_offset = match self.interleave {
                Interleave::BIL => (row * self.bands + b) * self.width,
                Interleave::BSQ => (b * self.length + row) * self.width,
                Interleave::BIP => row * self.width * self.bands,
            };
            reader.seek(SeekFrom::Start((sample_offset * size) as u64))?;
            reader.read_exact(&mut row_bytes)?;

            for col in 0..self.width {
                let idx = match self.interleave {
                    Interleave::BIP => col * self.bands + b,
                    _ => col,
                };
                data.push(self.decode(&row_bytes[idx * size..(idx + 1) * size]));
            }
        }

        Array2::from_shape_vec((self.length, self.width), data)
            .map_err(|e| PrepError::Processing(format!("Failed to reshape raster: {}", e)))
    }

    #[cfg(feature = "gdal")]
    fn read_band_gdal(&self, band: usize) -> PrepResult<Array2<f64>> {
        use gdal::Dataset;

        // ISCE writes a VRT next to each raster; fall back to the binary
        let mut vrt = self.path.as_os_str().to_owned();
        vrt.push(".vrt");
        let vrt = PathBuf::from(vrt);
        let source = if vrt.is_file() { vrt } else { self.path.clone() };

        let dataset = Dataset::open(&source)?;
        let (width, height) = dataset.raster_size();
        let rasterband = dataset.rasterband(band as isize)?;
        let buffer = rasterband.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
        Array2::from_shape_vec((height, width), buffer.data)
            .map_err(|e| PrepError::Processing(format!("Failed to reshape raster: {}", e)))
    }

    fn decode(&self, bytes: &[u8]) -> f64 {
        let little_endian = self.little_endian;
        macro_rules! num {
            ($t:ty, $b:expr) => {{
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice($b);
                if little_endian {
                    <$t>::from_le_bytes(buf)
                } else {
                    <$t>::from_be_bytes(buf)
                }
            }};
        }

        match self.data_type {
            RasterDataType::Byte => bytes[0] as f64,
            RasterDataType::Short => num!(i16, bytes) as f64,
            RasterDataType::Int => num!(i32, bytes) as f64,
            RasterDataType::Long => num!(i64, bytes) as f64,
            RasterDataType::Float => num!(f32, bytes) as f64,
            RasterDataType::Double => num!(f64, bytes),
            RasterDataType::CFloat => {
                let re = num!(f32, &bytes[..4]) as f64;
                let im = num!(f32, &bytes[4..]) as f64;
                re.hypot(im)
            }
            RasterDataType::CDouble => {
                let re = num!(f64, &bytes[..8]);
                let im = num!(f64, &bytes[8..]);
                re.hypot(im)
            }
        }
    }

    /// Text of a sample at the raster's own precision
    pub fn format_sample(&self, value: f64) -> String {
        if self.data_type.is_single_precision() {
            format_float(value as f32)
        } else {
            format_float(value)
        }
    }
}

/// Attributes of an ISCE raster, read from its `.xml` descriptor and
/// standardized.
pub fn read_attribute<P: AsRef<Path>>(path: P) -> PrepResult<RscMetadata> {
    let path = path.as_ref();
    let xml = Component::load(xml_path(path))?;

    let mut meta = RscMetadata::new();
    for property in &xml.properties {
        let value = property.value.as_deref().map(str::trim).filter(|v| !v.is_empty());
        if let Some(value) = value {
            meta.insert(property.name.clone(), value);
        }
    }

    // Geocoded grids carry their posting in coordinate1 (x) / coordinate2 (y)
    for (coord_name, prefix) in [("coordinate1", "X"), ("coordinate2", "Y")] {
        let Some(coord) = xml.child(coord_name) else {
            continue;
        };
        let (Ok(step), Ok(first)) = (coord.get_f64("delta"), coord.get_f64("startingvalue")) else {
            continue;
        };
        if step.abs() < 1.0 && step.abs() > 1e-7 {
            meta.insert_f64(format!("{}_STEP", prefix), step);
            meta.insert_f64(format!("{}_FIRST", prefix), first - step / 2.0);
            meta.insert(format!("{}_UNIT", prefix), "degrees");
        }
    }

    let mut meta = standardize_metadata(&meta);

    if let Some(data_type) = meta.get("DATA_TYPE") {
        let numpy_name = RasterDataType::from_isce(data_type)?.numpy_name();
        meta.insert("DATA_TYPE", numpy_name);
    }
    if let Some(byte_order) = meta.get("BYTE_ORDER") {
        let byte_order = if byte_order.to_lowercase().starts_with('b') {
            "big-endian"
        } else {
            "little-endian"
        };
        meta.insert("BYTE_ORDER", byte_order);
    }
    if let Some(interleave) = meta.get("INTERLEAVE") {
        let interleave = Interleave::from_isce(interleave)?.to_string();
        meta.insert("INTERLEAVE", interleave);
    }

    let ftype = file_type(path);
    if let Some(unit) = unit_for_file_type(&ftype) {
        meta.insert("UNIT", unit);
    }
    meta.insert("FILE_TYPE", ftype);
    meta.insert("PROCESSOR", "isce");
    let abs = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    meta.insert("FILE_PATH", abs.display().to_string());

    Ok(meta)
}
