//! Catalog back-office core - shared types library.
//!
//! This crate provides the types used across the back-office components:
//! - `admin` - Administration server (repositories, services, JSON routes)
//! - `cli` - Command-line tools for migrations, seeding and admin creation
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`validation`] - Field length rules evaluated against raw form input

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{FieldError, FieldReason, FieldRule, RawInput, ValidationErrors};
