//! Judgment-oracle infrastructure.

pub mod client;

pub use client::HttpOracle;
