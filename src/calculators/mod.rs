mod livability;
mod performance;

pub use livability::{
    attenuate, carens_score, multiplier_from_score, CarensScore, LivabilityCalculator,
    MAX_MULTIPLIER, MIN_MULTIPLIER, NEUTRAL_MULTIPLIER,
};
pub use performance::{PerformanceCalculator, PerformanceInputs, PerformanceResult};
