//! Caller identity: roles, the per-request `Identity` value object, and the
//! pluggable strategy that produces it.
//!
//! Identity is caller-supplied via the `X-Role` / `X-User-ID` headers and is
//! not cryptographically verified. The strategy trait exists so a real
//! authentication layer can replace [`HeaderIdentity`] without touching any
//! RBAC logic in the handlers.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::fmt;
use std::sync::Arc;

use crate::{state::AppState, Error, Result};

pub const ROLE_HEADER: &str = "x-role";
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Physician,
    Patient,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "physician" => Some(Role::Physician),
            "patient" => Some(Role::Patient),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Physician => "physician",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request caller identity.
///
/// The role is always validated up front. The caller id is kept raw and only
/// validated by [`Identity::caller_id`] when a route actually needs it, so
/// routes that never compare against the caller (admin analytics) do not
/// reject requests over an unused header.
#[derive(Debug, Clone)]
pub struct Identity {
    pub role: Role,
    raw_user_id: Option<String>,
}

impl Identity {
    pub fn new(role: Role, raw_user_id: Option<String>) -> Self {
        Self { role, raw_user_id }
    }

    /// The caller's own id, validated on demand: positive integer or bust.
    pub fn caller_id(&self) -> Result<i64> {
        let raw = self
            .raw_user_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Unauthenticated("missing X-User-ID header".to_string()))?;

        match raw.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(Error::Unauthenticated(
                "invalid X-User-ID header".to_string(),
            )),
        }
    }
}

/// Produces an [`Identity`] from inbound request headers.
///
/// Kept as a trait so policy logic stays untouched when header trust is
/// replaced by a verified credential.
pub trait IdentityStrategy: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity>;
}

/// Trust-the-header strategy: `X-Role` names the role, `X-User-ID` the caller.
#[derive(Debug, Default, Clone)]
pub struct HeaderIdentity;

impl IdentityStrategy for HeaderIdentity {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity> {
        let role = headers
            .get(ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse)
            .ok_or_else(|| {
                Error::Unauthenticated("invalid or missing X-Role header".to_string())
            })?;

        // Non-ASCII bytes still count as a supplied id; the lossy form fails
        // the numeric check instead of reading as an absent header.
        let raw_user_id = headers
            .get(USER_ID_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_string());

        Ok(Identity::new(role, raw_user_id))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        state.identity.authenticate(&parts.headers)
    }
}

/// Convenience alias for the strategy held in application state.
pub type SharedIdentityStrategy = Arc<dyn IdentityStrategy>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(
                k.parse::<HeaderName>().unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    #[test]
    fn parses_all_three_roles() {
        for (raw, want) in [
            ("admin", Role::Admin),
            ("physician", Role::Physician),
            ("patient", Role::Patient),
        ] {
            let identity = HeaderIdentity
                .authenticate(&headers(&[("x-role", raw)]))
                .unwrap();
            assert_eq!(identity.role, want);
        }
    }

    #[test]
    fn rejects_unknown_or_missing_role() {
        for hdrs in [headers(&[]), headers(&[("x-role", "superuser")])] {
            let err = HeaderIdentity.authenticate(&hdrs).unwrap_err();
            assert!(matches!(err, Error::Unauthenticated(_)));
            assert_eq!(err.to_string(), "invalid or missing X-Role header");
        }
    }

    #[test]
    fn caller_id_is_validated_lazily() {
        // A garbage X-User-ID does not fail authentication...
        let identity = HeaderIdentity
            .authenticate(&headers(&[("x-role", "admin"), ("x-user-id", "abc")]))
            .unwrap();
        // ...only the on-demand lookup.
        assert!(matches!(
            identity.caller_id(),
            Err(Error::Unauthenticated(_))
        ));
    }

    #[test]
    fn caller_id_requires_a_positive_integer() {
        for raw in ["0", "-3", "1.5", ""] {
            let identity = HeaderIdentity
                .authenticate(&headers(&[("x-role", "patient"), ("x-user-id", raw)]))
                .unwrap();
            assert!(identity.caller_id().is_err(), "accepted {raw:?}");
        }

        let identity = HeaderIdentity
            .authenticate(&headers(&[("x-role", "patient"), ("x-user-id", "42")]))
            .unwrap();
        assert_eq!(identity.caller_id().unwrap(), 42);
    }

    #[test]
    fn unreadable_user_id_bytes_are_invalid_not_missing() {
        let mut map = headers(&[("x-role", "patient")]);
        map.insert(
            "x-user-id",
            HeaderValue::from_bytes(b"4\xc3\xa92").unwrap(),
        );

        let identity = HeaderIdentity.authenticate(&map).unwrap();
        assert_eq!(
            identity.caller_id().unwrap_err().to_string(),
            "invalid X-User-ID header"
        );
    }

    #[test]
    fn missing_user_id_has_its_own_message() {
        let identity = HeaderIdentity
            .authenticate(&headers(&[("x-role", "patient")]))
            .unwrap();
        assert_eq!(
            identity.caller_id().unwrap_err().to_string(),
            "missing X-User-ID header"
        );
    }
}
