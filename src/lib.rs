//! Catalog loaders and terminal browser for the PokeAPI.
//!
//! The [`loader`] module holds the two aggregation strategies; [`session`]
//! owns per-listing state on top of them, and [`ui`] renders sessions with
//! `ratatui`.

pub mod api;
pub mod collection;
pub mod config;
pub mod error;
pub mod ident;
pub mod loader;
pub mod models;
pub mod session;
pub mod ui;
pub mod utils;

pub use error::{CatalogError, FetchError, Result};
