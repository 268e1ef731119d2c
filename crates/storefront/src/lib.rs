//! Eco Brews storefront library.
//!
//! The café website as a library, so the binary stays a thin wrapper and
//! handlers can be unit tested.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod content;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod site;
pub mod state;
