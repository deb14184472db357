//! isce-prep: ISCE stack metadata for time-series analysis
//!
//! Reads the metadata of an ISCE topsStack or stripmapStack run (swath
//! or frame XML, geometry rasters, baseline text files) and writes the
//! ROI_PAC `.rsc` sidecar files that InSAR time-series tools load next
//! to each interferogram and geometry raster.

pub mod cli;
pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{Interleave, OrbitData, PrepError, PrepResult, Processor, RasterDataType, StateVector};

pub use io::{IsceRaster, OrbitReader, RscMetadata};
pub use io::baseline::{read_baseline_timeseries, BaselineTimeseries};

pub use crate::core::{
    add_ifgram_metadata, extract_geometry_metadata, extract_isce_metadata, extract_multilook_number,
    get_processor, prepare_geometry, prepare_stack,
};
