//! # Nudge Core
//! Shared error type, configuration, and the delivery trait seam.

pub mod config;
pub mod error;
pub mod traits;

pub use config::Config;
pub use error::{NudgeError, Result};
pub use traits::Delivery;
