//! Infrastructure layer module
//!
//! This module contains all infrastructure adapters and external integrations:
//! - Database implementation (`SQLite` with sqlx)
//! - HTTP judgment oracle
//! - Simulated production system
//! - Configuration management
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod database;
pub mod oracle;
pub mod simulation;

pub use config::{ConfigError, ConfigLoader};
pub use database::{DatabaseConnection, ExperienceRepositoryImpl};
pub use oracle::HttpOracle;
pub use simulation::SimulatedProduction;
