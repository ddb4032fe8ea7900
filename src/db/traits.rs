//! Repository contract shared by all store implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::{NewPrescription, Patient, Physician, Prescription, TopDrug},
    Result,
};

/// Default page size for prescription listings when no limit is supplied.
pub const DEFAULT_LIST_LIMIT: i64 = 50;
/// Hard ceiling for prescription listings.
pub const MAX_LIST_LIMIT: i64 = 200;

/// RBAC-aware filters for prescription listings.
///
/// Exactly one of `patient_id` / `physician_id` is normally set based on the
/// caller's role; admins may combine both.
#[derive(Debug, Clone, Default)]
pub struct ListPrescriptionsFilter {
    pub patient_id: Option<i64>,
    pub physician_id: Option<i64>,
    pub limit: i64,
}

impl ListPrescriptionsFilter {
    /// Clamp the limit to [1, 200], falling back to the default of 50 for
    /// unset or out-of-range values.
    pub fn effective_limit(&self) -> i64 {
        if self.limit >= 1 && self.limit <= MAX_LIST_LIMIT {
            self.limit
        } else {
            DEFAULT_LIST_LIMIT
        }
    }
}

/// Backing-store health as reported by the readiness endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Ok,
    Down,
    /// No store configured; connectivity cannot be determined.
    #[serde(rename = "unknown")]
    Unconfigured,
}

/// Persistence abstraction over the relational store.
///
/// Deliberately a trait object seam: one implementation is backed by Postgres,
/// one is an in-memory store for tests and local development, and one is an
/// unconfigured stub. Selected once at process start.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Insert a prescription. The store assigns `id` and `prescribed_at`
    /// (server clock). Unresolvable foreign keys surface as
    /// [`crate::Error::InvalidReference`].
    async fn create_prescription(&self, p: NewPrescription) -> Result<Prescription>;

    /// Case-sensitive exact-name lookup-or-insert. Atomic with respect to
    /// concurrent callers using the same name: identical-name calls converge
    /// to one id, never two.
    async fn find_or_create_drug(&self, name: &str) -> Result<i64>;

    /// Existence check on the physician-patient link table. A missing row is
    /// `Ok(false)`, not an error.
    async fn is_physician_patient_linked(
        &self,
        physician_id: i64,
        patient_id: i64,
    ) -> Result<bool>;

    /// List prescriptions with denormalized display names, newest first
    /// (prescribed_at descending, id descending as tie-break).
    async fn list_prescriptions(
        &self,
        filter: ListPrescriptionsFilter,
    ) -> Result<Vec<Prescription>>;

    /// Patients linked to a physician, ordered by name then id ascending.
    async fn list_patients_for_physician(&self, physician_id: i64) -> Result<Vec<Patient>>;

    /// Physicians linked to a patient, ordered by name then id ascending.
    async fn list_physicians_for_patient(&self, patient_id: i64) -> Result<Vec<Physician>>;

    /// Sum quantity per drug over prescriptions with `prescribed_at` in
    /// `[from, to)`, optionally restricted to one patient. Ordered by total
    /// descending, drug id ascending as tie-break, truncated to `limit`.
    /// Drugs with no matching prescriptions are absent (no zero-fill).
    async fn top_drugs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
        patient_id: Option<i64>,
    ) -> Result<Vec<TopDrug>>;

    /// Lightweight connectivity probe for readiness checks.
    async fn ping(&self) -> StoreStatus;
}
