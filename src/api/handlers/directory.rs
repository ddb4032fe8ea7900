//! Link-table directory endpoints: which patients a physician treats and
//! which physicians a patient sees. Both feed dropdowns in the UI.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    auth::{Identity, Role},
    state::AppState,
    Error, Result,
};

/// Path ids are parsed by hand: a non-numeric or non-positive segment is an
/// unknown resource, not a bad request.
fn parse_path_id(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::NotFound("not found".to_string())),
    }
}

/// `GET /physicians/:id/patients`
pub async fn patients_for_physician(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response> {
    let physician_id = parse_path_id(&id)?;

    match identity.role {
        Role::Patient => {
            return Err(Error::Forbidden(
                "patients cannot access this resource".to_string(),
            ))
        }
        Role::Physician => {
            if identity.caller_id()? != physician_id {
                return Err(Error::Forbidden(
                    "physicians may only view their own patients".to_string(),
                ));
            }
        }
        Role::Admin => {}
    }

    let items = state.repo.list_patients_for_physician(physician_id).await?;
    Ok(Json(json!({ "items": items })).into_response())
}

/// `GET /patients/:id/physicians`
pub async fn physicians_for_patient(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response> {
    let patient_id = parse_path_id(&id)?;

    match identity.role {
        Role::Physician => {
            return Err(Error::Forbidden(
                "physicians cannot access this resource".to_string(),
            ))
        }
        Role::Patient => {
            if identity.caller_id()? != patient_id {
                return Err(Error::Forbidden(
                    "patients may only view their own physicians".to_string(),
                ));
            }
        }
        Role::Admin => {}
    }

    let items = state.repo.list_physicians_for_patient(patient_id).await?;
    Ok(Json(json!({ "items": items })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ids_must_be_positive_integers() {
        assert_eq!(parse_path_id("42").unwrap(), 42);
        for raw in ["abc", "0", "-1", "1.5", ""] {
            assert!(matches!(parse_path_id(raw), Err(Error::NotFound(_))));
        }
    }
}
