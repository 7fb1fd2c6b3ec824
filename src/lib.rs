//! Planning Center to pedal project sync - shared modules for the binary.

pub mod catalog;
pub mod config;
pub mod merge;
pub mod models;
pub mod pco;
pub mod progress;
pub mod project;
pub mod report;
pub mod safety;
pub mod sync;
pub mod time_signature;
