//! In-memory `Repository` implementation.
//!
//! Mirrors the Postgres contract closely enough for the integration test
//! suite and for running the server without a database: foreign keys are
//! enforced, drug names are unique, ordering and interval semantics match the
//! SQL queries. A single mutex serializes writers, which stands in for the
//! store-side atomicity of the Postgres upsert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Mutex;

use crate::{
    db::traits::{ListPrescriptionsFilter, Repository, StoreStatus},
    models::{NewPrescription, Patient, Physician, Prescription, TopDrug},
    Error, Result,
};

#[derive(Debug, Default)]
struct Inner {
    patients: Vec<Patient>,
    physicians: Vec<Physician>,
    drugs: Vec<(i64, String)>,
    links: HashSet<(i64, i64)>,
    prescriptions: Vec<StoredPrescription>,
    next_patient_id: i64,
    next_physician_id: i64,
    next_drug_id: i64,
    next_prescription_id: i64,
}

#[derive(Debug, Clone)]
struct StoredPrescription {
    id: i64,
    patient_id: i64,
    physician_id: i64,
    drug_id: i64,
    quantity: i32,
    sig: String,
    prescribed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_patient(&self, name: &str) -> i64 {
        let mut inner = self.inner.lock().expect("repository lock poisoned");
        inner.next_patient_id += 1;
        let id = inner.next_patient_id;
        inner.patients.push(Patient {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_physician(&self, name: &str) -> i64 {
        let mut inner = self.inner.lock().expect("repository lock poisoned");
        inner.next_physician_id += 1;
        let id = inner.next_physician_id;
        inner.physicians.push(Physician {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_link(&self, physician_id: i64, patient_id: i64) {
        let mut inner = self.inner.lock().expect("repository lock poisoned");
        inner.links.insert((physician_id, patient_id));
    }

    /// Seed a prescription with a controlled timestamp. Test-only entry point
    /// for exercising interval and ordering semantics.
    pub fn add_prescription_at(
        &self,
        patient_id: i64,
        physician_id: i64,
        drug_id: i64,
        quantity: i32,
        sig: &str,
        prescribed_at: DateTime<Utc>,
    ) -> i64 {
        let mut inner = self.inner.lock().expect("repository lock poisoned");
        inner.next_prescription_id += 1;
        let id = inner.next_prescription_id;
        inner.prescriptions.push(StoredPrescription {
            id,
            patient_id,
            physician_id,
            drug_id,
            quantity,
            sig: sig.to_string(),
            prescribed_at,
        });
        id
    }
}

impl Inner {
    fn has_patient(&self, id: i64) -> bool {
        self.patients.iter().any(|p| p.id == id)
    }

    fn has_physician(&self, id: i64) -> bool {
        self.physicians.iter().any(|p| p.id == id)
    }

    fn drug_name(&self, id: i64) -> Option<&str> {
        self.drugs
            .iter()
            .find(|(drug_id, _)| *drug_id == id)
            .map(|(_, name)| name.as_str())
    }

    fn hydrate(&self, stored: &StoredPrescription) -> Prescription {
        Prescription {
            id: stored.id,
            patient_id: stored.patient_id,
            patient_name: self
                .patients
                .iter()
                .find(|p| p.id == stored.patient_id)
                .map(|p| p.name.clone()),
            physician_id: stored.physician_id,
            physician_name: self
                .physicians
                .iter()
                .find(|p| p.id == stored.physician_id)
                .map(|p| p.name.clone()),
            drug_id: stored.drug_id,
            drug_name: self.drug_name(stored.drug_id).map(|n| n.to_string()),
            quantity: stored.quantity,
            sig: stored.sig.clone(),
            prescribed_at: stored.prescribed_at,
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_prescription(&self, p: NewPrescription) -> Result<Prescription> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| Error::Internal("repository lock poisoned".to_string()))?;

        if !inner.has_patient(p.patient_id)
            || !inner.has_physician(p.physician_id)
            || inner.drug_name(p.drug_id).is_none()
        {
            return Err(Error::InvalidReference);
        }

        inner.next_prescription_id += 1;
        let stored = StoredPrescription {
            id: inner.next_prescription_id,
            patient_id: p.patient_id,
            physician_id: p.physician_id,
            drug_id: p.drug_id,
            quantity: p.quantity,
            sig: p.sig,
            prescribed_at: Utc::now(),
        };
        let created = Prescription {
            id: stored.id,
            patient_id: stored.patient_id,
            patient_name: None,
            physician_id: stored.physician_id,
            physician_name: None,
            drug_id: stored.drug_id,
            drug_name: None,
            quantity: stored.quantity,
            sig: stored.sig.clone(),
            prescribed_at: stored.prescribed_at,
        };
        inner.prescriptions.push(stored);
        Ok(created)
    }

    async fn find_or_create_drug(&self, name: &str) -> Result<i64> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| Error::Internal("repository lock poisoned".to_string()))?;

        if let Some((id, _)) = inner.drugs.iter().find(|(_, n)| n == name) {
            return Ok(*id);
        }

        inner.next_drug_id += 1;
        let id = inner.next_drug_id;
        inner.drugs.push((id, name.to_string()));
        Ok(id)
    }

    async fn is_physician_patient_linked(
        &self,
        physician_id: i64,
        patient_id: i64,
    ) -> Result<bool> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| Error::Internal("repository lock poisoned".to_string()))?;
        Ok(inner.links.contains(&(physician_id, patient_id)))
    }

    async fn list_prescriptions(
        &self,
        filter: ListPrescriptionsFilter,
    ) -> Result<Vec<Prescription>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| Error::Internal("repository lock poisoned".to_string()))?;

        let mut matches: Vec<&StoredPrescription> = inner
            .prescriptions
            .iter()
            .filter(|pr| filter.patient_id.map_or(true, |id| pr.patient_id == id))
            .filter(|pr| filter.physician_id.map_or(true, |id| pr.physician_id == id))
            .collect();

        // Newest first, id descending as tie-break.
        matches.sort_by(|a, b| {
            b.prescribed_at
                .cmp(&a.prescribed_at)
                .then(b.id.cmp(&a.id))
        });
        matches.truncate(filter.effective_limit() as usize);

        Ok(matches.into_iter().map(|pr| inner.hydrate(pr)).collect())
    }

    async fn list_patients_for_physician(&self, physician_id: i64) -> Result<Vec<Patient>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| Error::Internal("repository lock poisoned".to_string()))?;

        let mut patients: Vec<Patient> = inner
            .patients
            .iter()
            .filter(|p| inner.links.contains(&(physician_id, p.id)))
            .cloned()
            .collect();
        patients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(patients)
    }

    async fn list_physicians_for_patient(&self, patient_id: i64) -> Result<Vec<Physician>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| Error::Internal("repository lock poisoned".to_string()))?;

        let mut physicians: Vec<Physician> = inner
            .physicians
            .iter()
            .filter(|ph| inner.links.contains(&(ph.id, patient_id)))
            .cloned()
            .collect();
        physicians.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(physicians)
    }

    async fn top_drugs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
        patient_id: Option<i64>,
    ) -> Result<Vec<TopDrug>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| Error::Internal("repository lock poisoned".to_string()))?;

        let mut totals: Vec<TopDrug> = Vec::new();
        for pr in inner
            .prescriptions
            .iter()
            // Half-open interval: `to` is exclusive.
            .filter(|pr| pr.prescribed_at >= from && pr.prescribed_at < to)
            .filter(|pr| patient_id.map_or(true, |id| pr.patient_id == id))
        {
            match totals.iter_mut().find(|t| t.drug_id == pr.drug_id) {
                Some(total) => total.total_quantity += i64::from(pr.quantity),
                None => totals.push(TopDrug {
                    drug_id: pr.drug_id,
                    drug_name: inner
                        .drug_name(pr.drug_id)
                        .unwrap_or_default()
                        .to_string(),
                    total_quantity: i64::from(pr.quantity),
                }),
            }
        }

        totals.sort_by(|a, b| {
            b.total_quantity
                .cmp(&a.total_quantity)
                .then(a.drug_id.cmp(&b.drug_id))
        });
        totals.truncate(limit as usize);
        Ok(totals)
    }

    async fn ping(&self) -> StoreStatus {
        StoreStatus::Ok
    }
}
