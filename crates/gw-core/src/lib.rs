pub mod config;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;

pub use config::EngineConfig;
pub use error::ConfigError;
pub use geometry::{CanvasMetrics, Corner, Footprint, GridDims, GridPoint};
pub use id::{AssetId, EntityId, LayerId};
pub use model::*;

// Re-export kurbo so downstream crates share one geometry vocabulary
pub use kurbo;
