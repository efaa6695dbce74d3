//! Market efficiency supplied by the JEEFHH resource-balancing subsystem.
//!
//! The balancing itself lives elsewhere; this core only consumes the result.

use serde::{Deserialize, Serialize};

fn one() -> f64 {
    1.0
}

/// Per-resource satisfaction ratios (jobs, energy, education, food, housing, healthcare).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JeefhhComponents {
    #[serde(default = "one")]
    pub jobs: f64,
    #[serde(default = "one")]
    pub energy: f64,
    #[serde(default = "one")]
    pub education: f64,
    #[serde(default = "one")]
    pub food: f64,
    #[serde(default = "one")]
    pub housing: f64,
    #[serde(default = "one")]
    pub healthcare: f64,
}

impl Default for JeefhhComponents {
    fn default() -> Self {
        Self {
            jobs: 1.0,
            energy: 1.0,
            education: 1.0,
            food: 1.0,
            housing: 1.0,
            healthcare: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketEfficiency {
    #[serde(default = "one")]
    pub overall: f64,
    #[serde(default)]
    pub components: JeefhhComponents,
}

impl MarketEfficiency {
    pub fn uniform(overall: f64) -> Self {
        Self {
            overall,
            components: JeefhhComponents::default(),
        }
    }

    /// Multiplier applied to revenue. Non-finite or negative inputs read as zero.
    pub fn revenue_factor(&self) -> f64 {
        if self.overall.is_finite() {
            self.overall.max(0.0)
        } else {
            0.0
        }
    }
}

impl Default for MarketEfficiency {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}
