pub mod artifact;
pub mod capture_models;
pub mod config;
pub mod detection;
pub mod error;
pub mod state;
