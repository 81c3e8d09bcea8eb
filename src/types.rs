use serde::Serialize;
use uuid::Uuid;

use crate::{ChangePlan, PlanMode, Platform, ReconcileError};

/// One interface on one device, as captured from the inventory snapshot.
#[derive(Debug, Clone)]
pub struct InterfaceConfig {
    pub device: String,
    pub name: String,
    pub platform: Platform,
    /// Overrides the run's default policy key for this interface.
    pub policy_key: Option<String>,
    /// Configuration text belonging to this interface only.
    pub config: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyReason {
    PolicyNotFound,
    PolicyMalformed,
    ConfigParseAnomaly,
    UnsupportedPlatform,
}

/// Structured warning record surfaced to the operator. Never fatal for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub interface: Option<String>,
    pub reason: AnomalyReason,
    pub detail: String,
}

impl Anomaly {
    pub fn for_interface(interface: &str, error: &ReconcileError) -> Self {
        Anomaly {
            interface: Some(interface.to_string()),
            reason: AnomalyReason::from(error),
            detail: error.to_string(),
        }
    }

    pub fn global(error: &ReconcileError) -> Self {
        Anomaly {
            interface: None,
            reason: AnomalyReason::from(error),
            detail: error.to_string(),
        }
    }
}

impl From<&ReconcileError> for AnomalyReason {
    fn from(error: &ReconcileError) -> Self {
        match error {
            ReconcileError::PolicyNotFound(_) => AnomalyReason::PolicyNotFound,
            ReconcileError::ConfigParseAnomaly { .. } | ReconcileError::InvalidRelayAddress(_) => {
                AnomalyReason::ConfigParseAnomaly
            }
            ReconcileError::UnsupportedPlatform(_) => AnomalyReason::UnsupportedPlatform,
            ReconcileError::PolicyMalformed { .. }
            | ReconcileError::PolicyListFormat(_)
            | ReconcileError::Settings { .. } => AnomalyReason::PolicyMalformed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: PlanMode,
    /// Policy key used for interfaces that carry none of their own.
    pub default_key: Option<String>,
    /// Skip interfaces that have no relay helpers configured.
    pub only_with_relays: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub interfaces_seen: usize,
    pub interfaces_with_relays: usize,
    pub interfaces_skipped: usize,
    pub plans_generated: usize,
    pub noop_plans: usize,
    pub relays_to_remove: usize,
    pub relays_to_add: usize,
    pub anomalies: usize,
}

/// Everything one reconciliation pass produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: PlanMode,
    pub plans: Vec<ChangePlan>,
    pub anomalies: Vec<Anomaly>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn has_changes(&self) -> bool {
        self.plans.iter().any(|p| !p.noop)
    }

    pub fn plan_for(&self, interface: &str) -> Option<&ChangePlan> {
        self.plans.iter().find(|p| p.interface == interface)
    }
}
