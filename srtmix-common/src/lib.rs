//! # srtmix Common Library
//!
//! Shared code for the srtmix workspace:
//! - Render configuration types and TOML configuration loading
//! - Render event types exchanged with the render worker
//! - SRT timestamp conversion
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use config::{DurationMode, RenderConfig};
pub use error::{Error, Result};
