//! Health report served by `GET /health`.

use serde::Serialize;

use crate::settings::ServiceSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// The handler runs but the store probe failed.
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Connected,
    Error,
}

/// Snapshot of the deployment and its store connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: String,
    pub service: String,
    pub environment: String,
    pub region: String,
    pub table_name: String,
    pub database: DatabaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_error: Option<String>,
}

impl HealthReport {
    /// Build a report from the outcome of a store probe.
    #[must_use]
    pub fn new(settings: &ServiceSettings, timestamp: String, probe_error: Option<String>) -> Self {
        let (status, database) = if probe_error.is_some() {
            (HealthStatus::Degraded, DatabaseStatus::Error)
        } else {
            (HealthStatus::Healthy, DatabaseStatus::Connected)
        };
        Self {
            status,
            timestamp,
            service: settings.service_name.clone(),
            environment: settings.environment.to_string(),
            region: settings.region.clone(),
            table_name: settings.table_name.clone(),
            database,
            database_error: probe_error,
        }
    }
}
