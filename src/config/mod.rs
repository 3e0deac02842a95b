//! Configuration management
//!
//! This module handles the simulator settings: block layout, difficulty,
//! mining workers and domain-parameter generation.

pub mod settings;

pub use settings::Settings;
