//! Eco Brews Core - Shared domain types.
//!
//! This crate provides the types shared by the Eco Brews components:
//! - `storefront` - The public café website
//! - `cli` - Operator tools for seeding the backend and awarding points
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. All persistence lives in the hosted data backend; these types
//! describe the values the storefront reads from and writes to it.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, statuses and loyalty tiers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
