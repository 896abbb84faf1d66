//! Mediaforge - batch media conversion
//!
//! This library crate exposes the binary's configuration loading for
//! integration testing. The conversion core lives in the `mf-*` crates.

pub mod config;
