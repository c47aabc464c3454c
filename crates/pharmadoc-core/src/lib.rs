//! # pharmadoc-core
//!
//! Core crate for the PharmaDoc session keeper. Contains the storage trait,
//! configuration schemas, token and profile types, cross-instance session
//! events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other PharmaDoc crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
