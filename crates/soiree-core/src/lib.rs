//! Core types, rules and trait definitions for the Soirée party backend.
//!
//! This crate has no HTTP or database dependencies. The
//! relationship, visibility and membership rules live here as pure functions;
//! storage backends call them inside their own transactions.

pub mod error;
pub mod lifecycle;
pub mod media;
pub mod membership;
pub mod party;
pub mod relationship;
pub mod store;
pub mod user;
pub mod visibility;

pub use error::{Error, Result};
