use serde::{Deserialize, Serialize};

/// Configuration for resolving stream inputs from upstream history.
///
/// Missing fields take their default values when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Number of samples in the local fit used for point queries.
    ///
    /// Three samples give a quadratic through the nearest neighbors.
    pub num_points: usize,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self { num_points: 3 }
    }
}

impl InterpolationConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_points` is zero.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_points == 0 {
            return Err("num_points must be positive");
        }
        Ok(())
    }
}
