//! Domain models shared between handlers and repositories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A prescription as returned by the API. Display names are denormalized by
/// the list query and omitted when not loaded (e.g. right after create).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub physician_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physician_name: Option<String>,
    pub drug_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drug_name: Option<String>,
    pub quantity: i32,
    pub sig: String,
    /// Assigned by the store at insert time, never by the caller.
    pub prescribed_at: DateTime<Utc>,
}

/// Aggregate row for the top-drugs analytics query. Derived, not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopDrug {
    pub drug_id: i64,
    pub drug_name: String,
    pub total_quantity: i64,
}

/// Lightweight list item for physician-linked patient dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
}

/// Lightweight list item for patient-linked physician dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Physician {
    pub id: i64,
    pub name: String,
}

/// Fields of a prescription the caller supplies on create. The store assigns
/// `id` and `prescribed_at`.
#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub patient_id: i64,
    pub physician_id: i64,
    pub drug_id: i64,
    pub quantity: i32,
    pub sig: String,
}
