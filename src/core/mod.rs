//! Metadata extraction and `.rsc` preparation

pub mod geodesy;
pub mod geometry;
pub mod metadata;
pub mod stack;

pub use geometry::{extract_geometry_metadata, extract_multilook_number};
pub use metadata::{extract_isce_metadata, extract_stripmap_metadata, extract_tops_metadata, get_processor};
pub use stack::{add_ifgram_metadata, prepare_geometry, prepare_stack};
