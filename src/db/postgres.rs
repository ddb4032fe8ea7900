//! PostgreSQL-backed `Repository` implementation.
//!
//! All cross-request coordination (drug-name uniqueness, foreign-key
//! integrity, link existence) is delegated to Postgres: each operation is a
//! single parameterized statement and relies on the store's transactional
//! guarantees.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::{
    db::traits::{ListPrescriptionsFilter, Repository, StoreStatus},
    models::{NewPrescription, Patient, Physician, Prescription, TopDrug},
    Error, Result,
};

/// Postgres error code for foreign_key_violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
    ping_timeout: Duration,
}

impl PgRepository {
    pub fn new(pool: PgPool, ping_timeout: Duration) -> Self {
        Self { pool, ping_timeout }
    }
}

fn map_create_error(e: sqlx::Error) -> Error {
    if let Some(code) = e.as_database_error().and_then(|d| d.code()) {
        if code == FOREIGN_KEY_VIOLATION {
            return Error::InvalidReference;
        }
    }
    Error::Database(e)
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_prescription(&self, p: NewPrescription) -> Result<Prescription> {
        // prescribed_at is never passed from the application layer; the column
        // default (now()) assigns it. A caller-supplied zero-value timestamp
        // previously corrupted display ordering.
        let row = sqlx::query(
            "INSERT INTO prescriptions (patient_id, physician_id, drug_id, quantity, sig)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, prescribed_at",
        )
        .bind(p.patient_id)
        .bind(p.physician_id)
        .bind(p.drug_id)
        .bind(p.quantity)
        .bind(&p.sig)
        .fetch_one(&self.pool)
        .await
        .map_err(map_create_error)?;

        Ok(Prescription {
            id: row.get("id"),
            patient_id: p.patient_id,
            patient_name: None,
            physician_id: p.physician_id,
            physician_name: None,
            drug_id: p.drug_id,
            drug_name: None,
            quantity: p.quantity,
            sig: p.sig,
            prescribed_at: row.get("prescribed_at"),
        })
    }

    async fn find_or_create_drug(&self, name: &str) -> Result<i64> {
        // Upsert so concurrent identical-name calls converge on one id. The
        // no-op update is what makes RETURNING work on the conflict path.
        let row = sqlx::query(
            "INSERT INTO drugs (name)
             VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("id"))
    }

    async fn is_physician_patient_linked(
        &self,
        physician_id: i64,
        patient_id: i64,
    ) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM physician_patients WHERE physician_id = $1 AND patient_id = $2 LIMIT 1",
        )
        .bind(physician_id)
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.is_some())
    }

    async fn list_prescriptions(
        &self,
        filter: ListPrescriptionsFilter,
    ) -> Result<Vec<Prescription>> {
        let limit = filter.effective_limit();

        let mut sql = String::from(
            "SELECT pr.id,
                    pr.patient_id, p.name AS patient_name,
                    pr.physician_id, ph.name AS physician_name,
                    pr.drug_id, d.name AS drug_name,
                    pr.quantity, pr.sig, pr.prescribed_at
             FROM prescriptions pr
             JOIN patients p    ON p.id = pr.patient_id
             JOIN physicians ph ON ph.id = pr.physician_id
             JOIN drugs d       ON d.id = pr.drug_id
             WHERE 1=1",
        );

        let mut arg_count = 0;
        if filter.patient_id.is_some() {
            arg_count += 1;
            sql.push_str(&format!(" AND pr.patient_id = ${arg_count}"));
        }
        if filter.physician_id.is_some() {
            arg_count += 1;
            sql.push_str(&format!(" AND pr.physician_id = ${arg_count}"));
        }
        sql.push_str(&format!(
            " ORDER BY pr.prescribed_at DESC, pr.id DESC LIMIT ${}",
            arg_count + 1
        ));

        let mut query = sqlx::query(&sql);
        if let Some(patient_id) = filter.patient_id {
            query = query.bind(patient_id);
        }
        if let Some(physician_id) = filter.physician_id {
            query = query.bind(physician_id);
        }
        query = query.bind(limit);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Prescription {
                id: r.get("id"),
                patient_id: r.get("patient_id"),
                patient_name: Some(r.get("patient_name")),
                physician_id: r.get("physician_id"),
                physician_name: Some(r.get("physician_name")),
                drug_id: r.get("drug_id"),
                drug_name: Some(r.get("drug_name")),
                quantity: r.get("quantity"),
                sig: r.get("sig"),
                prescribed_at: r.get("prescribed_at"),
            })
            .collect())
    }

    async fn list_patients_for_physician(&self, physician_id: i64) -> Result<Vec<Patient>> {
        let rows = sqlx::query(
            "SELECT p.id, p.name
             FROM physician_patients pp
             JOIN patients p ON p.id = pp.patient_id
             WHERE pp.physician_id = $1
             ORDER BY p.name ASC, p.id ASC",
        )
        .bind(physician_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Patient {
                id: r.get("id"),
                name: r.get("name"),
            })
            .collect())
    }

    async fn list_physicians_for_patient(&self, patient_id: i64) -> Result<Vec<Physician>> {
        let rows = sqlx::query(
            "SELECT ph.id, ph.name
             FROM physician_patients pp
             JOIN physicians ph ON ph.id = pp.physician_id
             WHERE pp.patient_id = $1
             ORDER BY ph.name ASC, ph.id ASC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Physician {
                id: r.get("id"),
                name: r.get("name"),
            })
            .collect())
    }

    async fn top_drugs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
        patient_id: Option<i64>,
    ) -> Result<Vec<TopDrug>> {
        // Half-open interval: `to` is exclusive.
        let mut sql = String::from(
            "SELECT d.id, d.name, COALESCE(SUM(pr.quantity), 0)::BIGINT AS total_qty
             FROM prescriptions pr
             JOIN drugs d ON d.id = pr.drug_id
             WHERE pr.prescribed_at >= $1 AND pr.prescribed_at < $2",
        );

        if patient_id.is_some() {
            sql.push_str(" AND pr.patient_id = $3");
            sql.push_str(" GROUP BY d.id, d.name ORDER BY total_qty DESC, d.id ASC LIMIT $4");
        } else {
            sql.push_str(" GROUP BY d.id, d.name ORDER BY total_qty DESC, d.id ASC LIMIT $3");
        }

        let mut query = sqlx::query(&sql).bind(from).bind(to);
        if let Some(patient_id) = patient_id {
            query = query.bind(patient_id);
        }
        query = query.bind(limit);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| TopDrug {
                drug_id: r.get("id"),
                drug_name: r.get("name"),
                total_quantity: r.get("total_qty"),
            })
            .collect())
    }

    async fn ping(&self) -> StoreStatus {
        let probe = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(self.ping_timeout, probe).await {
            Ok(Ok(_)) => StoreStatus::Ok,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "database ping failed");
                StoreStatus::Down
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.ping_timeout, "database ping timed out");
                StoreStatus::Down
            }
        }
    }
}
