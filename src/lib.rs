//! dvremux - Dolby Vision MP4 remuxing tool
//!
//! This library crate exposes the configuration layer for integration testing.

pub mod config;
