//! Tenant scoping for every workflow call.
//!
//! A [`TenantScope`] is the only way to reach tenant data: store transactions and service
//! operations take one, and the HTTP layer builds it from the identity headers the upstream
//! gateway sets after validating the caller's bearer token.

use std::fmt;

use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";

/// Organisation boundary. Data under one tenant is invisible to every other tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity-provider user id (admins, recruiters, employers, candidates).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Recruiter,
    Employer,
    Trainer,
    VettingOfficer,
    Candidate,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Recruiter => "RECRUITER",
            Role::Employer => "EMPLOYER",
            Role::Trainer => "TRAINER",
            Role::VettingOfficer => "VETTING_OFFICER",
            Role::Candidate => "CANDIDATE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "ADMIN" => Some(Role::Admin),
            "RECRUITER" => Some(Role::Recruiter),
            "EMPLOYER" => Some(Role::Employer),
            "TRAINER" => Some(Role::Trainer),
            "VETTING_OFFICER" => Some(Role::VettingOfficer),
            "CANDIDATE" => Some(Role::Candidate),
            _ => None,
        }
    }
}

/// Authenticated caller acting inside one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    tenant_id: TenantId,
    user_id: UserId,
    role: Role,
}

impl TenantScope {
    pub fn new(tenant_id: TenantId, user_id: UserId, role: Role) -> Self {
        Self {
            tenant_id,
            user_id,
            role,
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ScopeRejection> {
        let tenant = header_value(headers, TENANT_HEADER)?;
        let user = header_value(headers, USER_HEADER)?;
        let raw_role = header_value(headers, ROLE_HEADER)?;
        let role = Role::parse(&raw_role).ok_or(ScopeRejection::UnknownRole(raw_role))?;

        Ok(Self::new(TenantId(tenant), UserId(user), role))
    }
}

fn header_value(headers: &HeaderMap, name: &'static str) -> Result<String, ScopeRejection> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ScopeRejection::MissingHeader(name))
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
{
    type Rejection = ScopeRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        TenantScope::from_headers(&parts.headers)
    }
}

/// Raised when the gateway identity headers are absent or malformed.
#[derive(Debug, thiserror::Error)]
pub enum ScopeRejection {
    #[error("missing credential header {0}")]
    MissingHeader(&'static str),
    #[error("unrecognised role '{0}'")]
    UnknownRole(String),
}

impl IntoResponse for ScopeRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": "Unauthorized",
            "message": self.to_string(),
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
