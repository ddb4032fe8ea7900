//! Top-drugs analytics endpoint.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{Identity, Role},
    state::AppState,
    Error, Result,
};

const DEFAULT_TOP_DRUGS_LIMIT: i64 = 10;
const MAX_TOP_DRUGS_LIMIT: i64 = 100;

/// Query is kept as raw strings so malformed values map to the documented
/// 400 messages instead of a generic deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct TopDrugsQuery {
    from: Option<String>,
    to: Option<String>,
    limit: Option<String>,
}

pub async fn top_drugs(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<TopDrugsQuery>,
) -> Result<Response> {
    let (from_raw, to_raw) = match (query.from.as_deref(), query.to.as_deref()) {
        (Some(f), Some(t)) if !f.is_empty() && !t.is_empty() => (f, t),
        _ => {
            return Err(Error::InvalidInput(
                "from and to query params are required (RFC3339 date or datetime)".to_string(),
            ))
        }
    };

    let from = parse_rfc3339(from_raw);
    let to = parse_rfc3339(to_raw);
    let (from, to) = match (from, to) {
        // Half-open interval [from, to): `to` must be strictly after `from`.
        (Some(from), Some(to)) if to > from => (from, to),
        _ => return Err(Error::InvalidInput("invalid from/to range".to_string())),
    };

    let limit = match query.limit.as_deref() {
        None => DEFAULT_TOP_DRUGS_LIMIT,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 1 && n <= MAX_TOP_DRUGS_LIMIT => n,
            _ => return Err(Error::InvalidInput("limit must be 1..100".to_string())),
        },
    };

    // Patients only ever see their own usage; admins and physicians are
    // unrestricted on this route.
    let patient_id = match identity.role {
        Role::Patient => Some(identity.caller_id()?),
        Role::Admin | Role::Physician => None,
    };

    let items = state.repo.top_drugs(from, to, limit, patient_id).await?;

    Ok(Json(json!({
        "from": from,
        "to": to,
        "limit": limit,
        "items": items,
    }))
    .into_response())
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset_and_zulu() {
        assert!(parse_rfc3339("2025-01-01T00:00:00Z").is_some());
        assert!(parse_rfc3339("2025-01-01T12:30:00+02:00").is_some());
        assert!(parse_rfc3339("2025-01-01").is_none());
        assert!(parse_rfc3339("yesterday").is_none());
    }
}
