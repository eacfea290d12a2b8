//! Orchestrator configuration synthesis.

mod synthesizer;

pub use synthesizer::{ConfigSynthesizer, SynthesisRequest};
