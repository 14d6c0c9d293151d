//! Core types and trait definitions for the Magneto space-weather bot.
//!
//! No HTTP or database dependencies live here. The store and bot crates
//! build on these types.

pub mod error;
pub mod keyboard;
pub mod store;
pub mod transport;
pub mod user;

pub use error::{Error, Result};
