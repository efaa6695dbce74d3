pub mod cache;
pub mod calculators;
pub mod config;
pub mod daily;
pub mod decay;
pub mod definitions;
pub mod engine;
pub mod error;
pub mod invalidation;
pub mod market;
pub mod rng;
pub mod scenario;
pub mod simulation;
pub mod snapshot;
pub mod spatial;
pub mod web;
pub mod world;

pub use config::SimulationConfig;
pub use engine::{Engine, EngineSettings};
pub use error::SimError;
pub use simulation::Simulation;
pub use spatial::LocationKey;
