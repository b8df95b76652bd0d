//! Water potability prediction.
//!
//! Turns one water-quality sample (18 physicochemical and contextual
//! measurements) into a SAFE / NOT SAFE verdict using a pre-trained binary
//! classifier and a configurable decision threshold on P(not safe).

pub mod api;
pub mod config;
pub mod error;
pub mod ml;
pub mod models;

pub use error::{AppError, Result};
