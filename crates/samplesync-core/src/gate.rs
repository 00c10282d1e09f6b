//! Pre-flight validation gate
//!
//! Advisory check a caller may run before committing an appointment change.
//! The orchestrator never consults it; the caller decides whether to block.

use crate::cascade::CascadeResolver;
use crate::status::{sample_status_for, AppointmentStatus, SampleStatus};
use crate::types::Appointment;
use serde::{Deserialize, Serialize};

/// Gate verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    /// Whether the change looks safe to commit
    pub can_update: bool,
    /// Explanation when `can_update` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GateDecision {
    /// Change is fine
    #[must_use]
    pub fn allow() -> Self {
        Self {
            can_update: true,
            reason: None,
        }
    }

    /// Change is advised against
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            can_update: false,
            reason: Some(reason.into()),
        }
    }
}

/// Advisory appointment transition gate
#[derive(Debug, Clone)]
pub struct TransitionGate {
    resolver: CascadeResolver,
}

impl TransitionGate {
    /// Create gate over a resolver
    #[inline]
    #[must_use]
    pub fn new(resolver: CascadeResolver) -> Self {
        Self { resolver }
    }

    /// Whether moving `appointment` to `new_status` is advisable
    ///
    /// Statuses that imply testing or completion need at least one sample on
    /// the appointment's order. A resolution failure denies with the failure
    /// as reason.
    pub async fn can_transition_appointment(
        &self,
        appointment: &Appointment,
        new_status: AppointmentStatus,
    ) -> GateDecision {
        let Some(target) = sample_status_for(new_status) else {
            return GateDecision::allow();
        };

        if !matches!(target, SampleStatus::Processing | SampleStatus::Completed) {
            return GateDecision::allow();
        }

        let Some(order_id) = &appointment.order_id else {
            return GateDecision::deny(format!(
                "cannot move appointment to {}: it has no order, so no samples exist",
                new_status.label()
            ));
        };

        match self.resolver.resolve_samples(order_id).await {
            Ok(samples) if samples.is_empty() => GateDecision::deny(format!(
                "cannot move appointment to {}: order {order_id} has no samples yet",
                new_status.label()
            )),
            Ok(_) => GateDecision::allow(),
            Err(e) => {
                tracing::warn!(%order_id, error = %e, "gate could not inspect samples");
                GateDecision::deny(format!("could not inspect samples: {e}"))
            }
        }
    }
}
