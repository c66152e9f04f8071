// src/display/mod.rs
//! Display modules for local viewing

pub mod terminal;

pub use terminal::TerminalDisplay;
