//! Prescription create and list endpoints.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{Identity, Role},
    db::traits::{ListPrescriptionsFilter, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT},
    models::NewPrescription,
    state::AppState,
    Error, Result,
};

/// Body of `POST /prescriptions`. Missing fields deserialize to zero values
/// so the validator reports the field-specific message rather than a generic
/// decode failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePrescriptionRequest {
    pub patient_id: i64,
    pub physician_id: i64,
    pub drug_id: i64,
    pub drug_name: String,
    pub quantity: i32,
    pub sig: String,
}

impl CreatePrescriptionRequest {
    /// Structural and business validation, first violation wins.
    pub fn validate(&self) -> Result<()> {
        if self.patient_id <= 0 {
            return Err(Error::InvalidInput("patient_id must be > 0".to_string()));
        }
        if self.physician_id <= 0 {
            return Err(Error::InvalidInput("physician_id must be > 0".to_string()));
        }
        // Either a positive drug_id or a non-blank drug_name must be provided.
        if self.drug_id <= 0 {
            let trimmed = self.drug_name.trim();
            if trimmed.is_empty() {
                if self.drug_name.is_empty() {
                    return Err(Error::InvalidInput(
                        "either drug_id (>0) or drug_name is required".to_string(),
                    ));
                }
                return Err(Error::InvalidInput(
                    "drug_name cannot be blank".to_string(),
                ));
            }
            if trimmed.chars().count() > 200 {
                return Err(Error::InvalidInput("drug_name too long".to_string()));
            }
        }
        if self.quantity <= 0 {
            return Err(Error::InvalidInput("quantity must be > 0".to_string()));
        }
        if self.sig.is_empty() {
            return Err(Error::InvalidInput("sig is required".to_string()));
        }
        if self.sig.chars().count() > 500 {
            return Err(Error::InvalidInput("sig too long".to_string()));
        }
        Ok(())
    }
}

pub async fn create_prescription(
    State(state): State<AppState>,
    identity: Identity,
    body: std::result::Result<Json<CreatePrescriptionRequest>, JsonRejection>,
) -> Result<Response> {
    // Only physicians may create prescriptions; admins and patients are forbidden.
    if identity.role != Role::Physician {
        return Err(Error::Forbidden(
            "only physicians may create prescriptions".to_string(),
        ));
    }
    let caller_id = identity.caller_id()?;

    let Json(req) =
        body.map_err(|_| Error::InvalidInput("invalid JSON body".to_string()))?;
    req.validate()?;

    // Physician RBAC: must create as themselves and be linked to the patient.
    if req.physician_id != caller_id {
        return Err(Error::Forbidden(
            "physicians may only create as themselves".to_string(),
        ));
    }
    let linked = state
        .repo
        .is_physician_patient_linked(caller_id, req.patient_id)
        .await?;
    if !linked {
        return Err(Error::Forbidden(
            "physician not linked to patient".to_string(),
        ));
    }

    // Resolve the drug: use the provided id, or find/create by trimmed name.
    let drug_id = if req.drug_id > 0 {
        req.drug_id
    } else {
        state
            .repo
            .find_or_create_drug(req.drug_name.trim())
            .await?
    };

    let created = state
        .repo
        .create_prescription(NewPrescription {
            patient_id: req.patient_id,
            physician_id: req.physician_id,
            drug_id,
            quantity: req.quantity,
            sig: req.sig,
        })
        .await?;

    tracing::info!(
        prescription_id = created.id,
        physician_id = created.physician_id,
        patient_id = created.patient_id,
        "prescription created"
    );

    Ok((StatusCode::CREATED, Json(created)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    limit: Option<String>,
    patient_id: Option<String>,
    physician_id: Option<String>,
}

pub async fn list_prescriptions(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let limit = match query.limit.as_deref() {
        None => DEFAULT_LIST_LIMIT,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 1 && n <= MAX_LIST_LIMIT => n,
            // Out-of-range values are rejected, not clamped.
            _ => return Err(Error::InvalidInput("limit must be 1..200".to_string())),
        },
    };

    let mut filter = ListPrescriptionsFilter {
        limit,
        ..Default::default()
    };

    match identity.role {
        Role::Patient => {
            filter.patient_id = Some(identity.caller_id()?);
        }
        Role::Physician => {
            filter.physician_id = Some(identity.caller_id()?);
        }
        Role::Admin => {
            // Admins may combine optional query filters.
            if let Some(raw) = query.patient_id.as_deref() {
                match raw.parse::<i64>() {
                    Ok(n) if n > 0 => filter.patient_id = Some(n),
                    _ => return Err(Error::InvalidInput("invalid patient_id".to_string())),
                }
            }
            if let Some(raw) = query.physician_id.as_deref() {
                match raw.parse::<i64>() {
                    Ok(n) if n > 0 => filter.physician_id = Some(n),
                    _ => return Err(Error::InvalidInput("invalid physician_id".to_string())),
                }
            }
        }
    }

    let items = state.repo.list_prescriptions(filter).await?;
    Ok(Json(json!({ "items": items, "limit": limit })).into_response())
}
