//! Placeholder repository used when no database URL is configured.
//!
//! The server still starts so health checks and CORS behave normally; writes
//! fail with an internal error and reads return empty results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::traits::{ListPrescriptionsFilter, Repository, StoreStatus},
    models::{NewPrescription, Patient, Physician, Prescription, TopDrug},
    Error, Result,
};

#[derive(Debug, Default, Clone)]
pub struct UnconfiguredRepository;

#[async_trait]
impl Repository for UnconfiguredRepository {
    async fn create_prescription(&self, _p: NewPrescription) -> Result<Prescription> {
        Err(Error::Internal("database not configured".to_string()))
    }

    async fn find_or_create_drug(&self, _name: &str) -> Result<i64> {
        Err(Error::Internal("database not configured".to_string()))
    }

    async fn is_physician_patient_linked(
        &self,
        _physician_id: i64,
        _patient_id: i64,
    ) -> Result<bool> {
        Ok(false)
    }

    async fn list_prescriptions(
        &self,
        _filter: ListPrescriptionsFilter,
    ) -> Result<Vec<Prescription>> {
        Ok(Vec::new())
    }

    async fn list_patients_for_physician(&self, _physician_id: i64) -> Result<Vec<Patient>> {
        Ok(Vec::new())
    }

    async fn list_physicians_for_patient(&self, _patient_id: i64) -> Result<Vec<Physician>> {
        Ok(Vec::new())
    }

    async fn top_drugs(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
        _limit: i64,
        _patient_id: Option<i64>,
    ) -> Result<Vec<TopDrug>> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> StoreStatus {
        StoreStatus::Unconfigured
    }
}
