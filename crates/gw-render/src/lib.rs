pub mod hit;
pub mod raster;

pub use raster::{RasterError, RasterLayer, StampMode};
