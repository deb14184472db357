use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// ISCE stack processor that produced the inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Processor {
    /// Sentinel-1 TOPS stack (topsStack)
    Tops,
    /// StripMap stack or stripmapApp
    Stripmap,
}

impl std::fmt::Display for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Processor::Tops => write!(f, "tops"),
            Processor::Stripmap => write!(f, "stripmap"),
        }
    }
}

/// Orbit state vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateVector {
    pub time: NaiveDateTime,
    pub position: [f64; 3], // [x, y, z] in meters (ECEF)
    pub velocity: [f64; 3], // [vx, vy, vz] in m/s
}

/// Orbit made of time-sorted state vectors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrbitData {
    pub state_vectors: Vec<StateVector>,
}

/// Sample type of an ISCE raster, as named in its `.xml` descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterDataType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    CFloat,
    CDouble,
}

impl RasterDataType {
    pub fn from_isce(name: &str) -> PrepResult<Self> {
        match name.trim().to_uppercase().as_str() {
            "BYTE" | "CHAR" => Ok(RasterDataType::Byte),
            "SHORT" | "CIRCULAR_SHORT" => Ok(RasterDataType::Short),
            "INT" => Ok(RasterDataType::Int),
            "LONG" => Ok(RasterDataType::Long),
            "FLOAT" => Ok(RasterDataType::Float),
            "DOUBLE" => Ok(RasterDataType::Double),
            "CFLOAT" => Ok(RasterDataType::CFloat),
            "CDOUBLE" => Ok(RasterDataType::CDouble),
            other => Err(PrepError::InvalidFormat(format!(
                "Unknown ISCE data type: {}",
                other
            ))),
        }
    }

    /// Bytes per sample
    pub fn size(&self) -> usize {
        match self {
            RasterDataType::Byte => 1,
            RasterDataType::Short => 2,
            RasterDataType::Int | RasterDataType::Float => 4,
            RasterDataType::Long | RasterDataType::Double | RasterDataType::CFloat => 8,
            RasterDataType::CDouble => 16,
        }
    }

    /// Name written to the `DATA_TYPE` attribute
    pub fn numpy_name(&self) -> &'static str {
        match self {
            RasterDataType::Byte => "uint8",
            RasterDataType::Short => "int16",
            RasterDataType::Int => "int32",
            RasterDataType::Long => "int64",
            RasterDataType::Float => "float32",
            RasterDataType::Double => "float64",
            RasterDataType::CFloat => "complex64",
            RasterDataType::CDouble => "complex128",
        }
    }

    /// Samples stored at single precision
    pub fn is_single_precision(&self) -> bool {
        matches!(self, RasterDataType::Float | RasterDataType::CFloat)
    }
}

/// Band interleaving scheme of a multi-band raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interleave {
    BIL,
    BIP,
    BSQ,
}

impl Interleave {
    pub fn from_isce(name: &str) -> PrepResult<Self> {
        match name.trim().to_uppercase().as_str() {
            "BIL" => Ok(Interleave::BIL),
            "BIP" => Ok(Interleave::BIP),
            "BSQ" => Ok(Interleave::BSQ),
            other => Err(PrepError::InvalidFormat(format!(
                "Unknown interleave scheme: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Interleave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interleave::BIL => write!(f, "BIL"),
            Interleave::BIP => write!(f, "BIP"),
            Interleave::BSQ => write!(f, "BSQ"),
        }
    }
}

/// Error types for metadata preparation
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Unsupported input: {0}")]
    Unsupported(String),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for metadata preparation
pub type PrepResult<T> = Result<T, PrepError>;
