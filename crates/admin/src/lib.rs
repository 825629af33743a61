//! Catalog back-office library.
//!
//! JSON API for managing back-office admins (with their roles and
//! permissions) and the product catalog: categories, brands and items.
//!
//! # Security
//!
//! Every catalog and admin endpoint requires a logged-in admin holding the
//! matching `*.manage` permission, or the `super_admin` role.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
