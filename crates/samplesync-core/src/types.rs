//! Core types for SampleSync
//!
//! Defines the records the engine reads and writes:
//! - Opaque resource identifiers
//! - Appointments, sample kits and samples
//! - The sample update payload

use crate::status::{AppointmentStatus, SampleStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw id
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Raw id
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Sample identifier
    SampleId
);
opaque_id!(
    /// Sample kit identifier
    KitId
);
opaque_id!(
    /// Order identifier
    OrderId
);
opaque_id!(
    /// Appointment identifier
    AppointmentId
);

/// Scheduled lab interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    /// Appointment id
    pub id: AppointmentId,
    /// Current workflow status
    pub status: AppointmentStatus,
    /// Order this appointment serves, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

impl Appointment {
    /// Create appointment
    #[inline]
    pub fn new(id: impl Into<AppointmentId>, status: AppointmentStatus) -> Self {
        Self {
            id: id.into(),
            status,
            order_id: None,
        }
    }

    /// With order reference
    #[inline]
    #[must_use]
    pub fn with_order(mut self, order_id: impl Into<OrderId>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }
}

/// Physical collection kit belonging to one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleKit {
    /// Kit id
    pub id: KitId,
    /// Owning order
    pub order_id: OrderId,
    /// Forward pointer to the sample extracted from this kit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_id: Option<SampleId>,
}

impl SampleKit {
    /// Create kit for an order
    #[inline]
    pub fn new(id: impl Into<KitId>, order_id: impl Into<OrderId>) -> Self {
        Self {
            id: id.into(),
            order_id: order_id.into(),
            samples_id: None,
        }
    }

    /// With forward sample pointer
    #[inline]
    #[must_use]
    pub fn with_sample(mut self, sample_id: impl Into<SampleId>) -> Self {
        self.samples_id = Some(sample_id.into());
        self
    }
}

/// Lab sample as stored by the sample resource
///
/// Only `id`, `status` and `notes` are inspected; every other field is
/// carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Sample id
    pub id: SampleId,
    /// Lifecycle status
    pub status: SampleStatus,
    /// Append-only audit log
    #[serde(default)]
    pub notes: String,
    /// Back pointer to the owning kit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_kits_id: Option<KitId>,
    /// Pass-through fields (sample code, type, shipping tracking, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SampleRecord {
    /// Create sample record
    #[inline]
    pub fn new(id: impl Into<SampleId>, status: SampleStatus) -> Self {
        Self {
            id: id.into(),
            status,
            notes: String::new(),
            sample_kits_id: None,
            extra: Map::new(),
        }
    }

    /// With owning kit
    #[inline]
    #[must_use]
    pub fn in_kit(mut self, kit_id: impl Into<KitId>) -> Self {
        self.sample_kits_id = Some(kit_id.into());
        self
    }

    /// With initial notes
    #[inline]
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// With a pass-through field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Notes log as individual lines
    pub fn note_lines(&self) -> impl Iterator<Item = &str> {
        self.notes.lines().filter(|line| !line.is_empty())
    }
}

/// Payload written by `SampleResource::update_sample`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleUpdate {
    /// New status
    pub status: SampleStatus,
    /// Full notes log, previous content included
    pub notes: String,
}
