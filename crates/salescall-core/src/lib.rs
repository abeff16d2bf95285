//! Core types and trait definitions for the sales call record store.
//!
//! This crate is free of database dependencies. The SQLite backend and the
//! admin tool both depend on it.

// Native `async fn` in traits; the `Send` bounds are spelled out on the trait.
#![allow(async_fn_in_trait)]

pub mod daily;
pub mod detail;
pub mod error;
pub mod report;
pub mod salesperson;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
