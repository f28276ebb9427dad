//! Engine tuning knobs.
//!
//! Every field has a default; a host may load overrides from JSON, where any
//! missing field keeps its default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Raster buffer pixels per cell. Freehand layers use this instead of the
    /// on-screen tile size so strokes keep their resolution across zoom.
    pub base_tile_px: u32,

    /// Resize handles hit within this many CSS px of a rotated corner.
    pub handle_hit_px: f64,

    /// Rotate ring radius = half-diagonal + this gap (CSS px).
    pub ring_gap_px: f64,

    /// Rotate ring hit tolerance (CSS px) on either side of the radius.
    pub ring_hit_px: f64,

    /// EMA alpha for the freehand brush, in `(0, 1]`.
    pub brush_smoothing: f64,

    /// Smallest extent a resize can produce, in tiles.
    pub min_extent_tiles: f64,

    /// Maximum undo depth. Oldest entries are trimmed first.
    pub history_depth: usize,

    /// Seed for stamp randomization. `None` seeds from the OS.
    pub rng_seed: Option<u64>,

    /// A zoom marquee smaller than this on both axes is ignored (CSS px).
    pub marquee_min_px: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_tile_px: 32,
            handle_hit_px: 10.0,
            ring_gap_px: 8.0,
            ring_hit_px: 8.0,
            brush_smoothing: 0.55,
            min_extent_tiles: 1.0,
            history_depth: 200,
            rng_seed: None,
            marquee_min_px: 2.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] for values the engine cannot work with.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_tile_px == 0 {
            return Err(ConfigError::OutOfRange {
                field: "baseTilePx",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.brush_smoothing > 0.0 && self.brush_smoothing <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "brushSmoothing",
                reason: format!("{} is outside (0, 1]", self.brush_smoothing),
            });
        }
        if !(self.min_extent_tiles >= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "minExtentTiles",
                reason: "must be at least one tile".into(),
            });
        }
        for (field, v) in [
            ("handleHitPx", self.handle_hit_px),
            ("ringGapPx", self.ring_gap_px),
            ("ringHitPx", self.ring_hit_px),
            ("marqueeMinPx", self.marquee_min_px),
        ] {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: format!("{v} must be a non-negative number"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let c = EngineConfig::from_json(r#"{ "brushSmoothing": 0.3, "rngSeed": 7 }"#).unwrap();
        assert_eq!(c.brush_smoothing, 0.3);
        assert_eq!(c.rng_seed, Some(7));
        assert_eq!(c.handle_hit_px, 10.0);
        assert_eq!(c.history_depth, 200);
    }

    #[test]
    fn rejects_bad_alpha() {
        let err = EngineConfig::from_json(r#"{ "brushSmoothing": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "brushSmoothing", .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json("{ nope"),
            Err(ConfigError::Json(_))
        ));
    }
}
