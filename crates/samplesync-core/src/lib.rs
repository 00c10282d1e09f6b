//! SampleSync Core - sample lifecycle synchronization
//!
//! Keeps lab samples in step with the appointment workflow that drives them:
//! - Classifies appointment and sample statuses
//! - Validates sample transitions (advisory)
//! - Resolves Order -> SampleKit -> Sample cascades
//! - Applies status changes in batches with per-item error isolation
//! - Orchestrates commit-then-cascade with eventual consistency
//!
//! # Example
//!
//! ```rust,ignore
//! use samplesync_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), SyncError> {
//! let lab = Arc::new(InMemoryLab::new());
//! let orchestrator =
//!     AppointmentSampleOrchestrator::new(SyncConfig::new(), lab.clone(), lab.clone(), lab);
//!
//! let appointment = Appointment::new("a1", AppointmentStatus::SampleReceived).with_order("o1");
//! let report = orchestrator
//!     .update_appointment_with_samples(&appointment, AppointmentStatus::Testing)
//!     .await?;
//!
//! println!("outcome: {:?}", report.outcome());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod batch;
pub mod cascade;
pub mod config;
pub mod error;
pub mod gate;
pub mod memory;
pub mod orchestrator;
pub mod resource;
pub mod status;
pub mod summary;
pub mod transition;
pub mod types;
pub mod updater;

// Re-exports for convenience
pub use batch::{BatchResult, BatchSynchronizer, SampleFailure, SkipReason, SkippedSample};
pub use cascade::CascadeResolver;
pub use config::SyncConfig;
pub use error::{ConfigError, ErrorKind, ResourceKind, SyncError};
pub use gate::{GateDecision, TransitionGate};
pub use memory::{InMemoryLab, LabSnapshot};
pub use orchestrator::{AppointmentSampleOrchestrator, SyncOutcome, SyncReport};
pub use resource::{AppointmentCommitter, SampleKitResource, SampleResource};
pub use status::{sample_status_for, AppointmentStatus, ParseStatusError, SampleStatus};
pub use summary::OrderSampleSummary;
pub use transition::{is_terminal, is_valid_transition, next_possible};
pub use types::{
    Appointment, AppointmentId, KitId, OrderId, SampleId, SampleKit, SampleRecord, SampleUpdate,
};
pub use updater::{Clock, SampleUpdater};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with SampleSync Core
    pub use crate::{
        Appointment, AppointmentCommitter, AppointmentSampleOrchestrator, AppointmentStatus,
        BatchResult, InMemoryLab, SampleKitResource, SampleRecord, SampleResource, SampleStatus,
        SyncConfig, SyncError, SyncOutcome, SyncReport,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
