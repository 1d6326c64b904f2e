use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{Incident, SystemMetrics};

/// Source of incidents and metric snapshots.
///
/// The control loop consumes the production system only through this
/// interface; the built-in implementation is a simulator, but anything
/// that can raise incidents and report metrics fits.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    /// Raise a new incident and degrade the system accordingly.
    ///
    /// # Errors
    /// A failure here is fatal to the learning session: incident
    /// generation is assumed reliable, so an error indicates a
    /// misconfigured source rather than a transient fault.
    async fn generate_incident(&self) -> Result<Incident>;

    /// Snapshot the system's current metrics.
    async fn current_metrics(&self) -> Result<SystemMetrics>;
}
