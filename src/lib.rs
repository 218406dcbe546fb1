//! skylook - city weather lookup for the terminal
//!
//! The library exposes the app's modules for testing.

pub mod action;
pub mod api;
pub mod backdrop;
pub mod components;
pub mod condition;
pub mod config;
pub mod effect;
pub mod logging;
pub mod reducer;
pub mod state;
