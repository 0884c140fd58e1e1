//! beacon-core — shared configuration for the Beacon registry.
//! All other Beacon crates depend on this one (directly or via the daemon).

pub mod config;

pub use config::{BeaconConfig, ConfigError};
