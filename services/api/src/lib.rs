//! Podcast API Library Crate
//!
//! This library contains the web-facing half of the podcast service: the
//! configuration, the application state, the API handlers and the routing.
//! The binaries under `bin/` are thin wrappers around this library.

pub mod audio_utils;
pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod bootstrap;
pub mod state;
