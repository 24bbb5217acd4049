//! appsearch library
//!
//! Mac App Store search for Alfred with a bounded, content-addressed artwork cache.
//! The binary is a thin wrapper around `app::run`; the modules are public so the
//! integration tests can drive the engine with a stub transport.

pub mod app;
pub mod cache;
pub mod cli;
pub mod engine;
pub mod feedback;
pub mod logging;
pub mod search;
pub mod signal;
