//! Domain rules shared by the media job client and its callers.
//!
//! Everything here is pure: seed policy, upscale-resolution lookup,
//! and request validation. No I/O happens in this crate.

pub mod error;
pub mod resolution;
pub mod seed;
pub mod types;
pub mod validation;
