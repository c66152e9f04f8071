// src/gps/mod.rs
//! GPS data handling and parsing

pub mod data;
pub mod nmea;
pub mod store;

pub use data::Fix;
pub use nmea::{parse_sentence, Sentence};
pub use store::FixStore;
