//! Generates GuardrailsOrchestrator configuration from the detector and
//! generation services discoverable in a namespace.

pub mod cli;

pub use autoconfig_application::{ConfigSynthesizer, SynthesisRequest};
pub use autoconfig_domain as domain;
pub use autoconfig_ports as ports;
