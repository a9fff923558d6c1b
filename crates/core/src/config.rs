use serde::{Deserialize, Serialize};

use crate::error::{NaviewError, Result};
use crate::types::Point;

/// Pins loop `loop_number` (creation order, 1-based) to a fixed radius.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Radloop {
    pub loop_number: usize,
    pub radius: f64,
}

/// What to do with crossing pairs in the input.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PseudoknotPolicy {
    /// Fail with `NaviewError::Pseudoknot`.
    #[default]
    Reject,
    /// Remove crossing pairs and lay out the nested remainder.
    Strip,
}

/// Tuning constants for the layout.
///
/// Deserialized with `#[serde(default)]`, so any omitted field uses the
/// default value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NaviewConfig {
    /// Minimum spacing between neighbouring bases before a segment is extruded.
    pub lencut: f64,
    /// Distance between consecutive rungs of a helix.
    pub helix_factor: f64,
    /// Scale from backbone units to output units.
    pub backbone_distance: f64,
    /// Fitted loop radii are divided by this before placement.
    pub radius_reduction_factor: f64,
    /// Output translation applied after scaling.
    pub origin: Point,
    pub radloops: Vec<Radloop>,
    pub pseudoknots: PseudoknotPolicy,
    /// Turn the crossed-regions warning into `NaviewError::CrossedRegions`.
    pub strict_crossings: bool,
}

impl Default for NaviewConfig {
    fn default() -> Self {
        NaviewConfig {
            lencut: 0.8,
            helix_factor: 0.6,
            backbone_distance: 27.0,
            radius_reduction_factor: 1.4,
            origin: Point { x: 100.0, y: 100.0 },
            radloops: Vec::new(),
            pseudoknots: PseudoknotPolicy::Reject,
            strict_crossings: false,
        }
    }
}

impl NaviewConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("lencut", self.lencut),
            ("helix_factor", self.helix_factor),
            ("backbone_distance", self.backbone_distance),
            ("radius_reduction_factor", self.radius_reduction_factor),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(NaviewError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        if !self.origin.x.is_finite() || !self.origin.y.is_finite() {
            return Err(NaviewError::InvalidConfig("origin must be finite".into()));
        }
        // The fitted radius is floored at sqrt(2)/2; after reduction it must
        // still exceed half a pair width.
        if self.radius_reduction_factor >= std::f64::consts::SQRT_2 {
            return Err(NaviewError::InvalidConfig(format!(
                "radius_reduction_factor must be below sqrt(2), got {}",
                self.radius_reduction_factor
            )));
        }
        for rl in &self.radloops {
            if rl.loop_number == 0 {
                return Err(NaviewError::InvalidConfig(
                    "radloop loop numbers start at 1".into(),
                ));
            }
            if !rl.radius.is_finite() || rl.radius <= 0.5 {
                return Err(NaviewError::InvalidConfig(format!(
                    "radloop radius for loop {} must exceed 0.5, got {}",
                    rl.loop_number, rl.radius
                )));
            }
        }
        Ok(())
    }

    /// Radius pinned for `loop_number`, if any. Later entries win.
    pub(crate) fn radloop_for(&self, loop_number: usize) -> Option<f64> {
        self.radloops
            .iter()
            .rev()
            .find(|rl| rl.loop_number == loop_number)
            .map(|rl| rl.radius)
    }
}
