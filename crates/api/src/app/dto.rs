use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use casetrack_auth::{PermissionMap, Registration, Role, User, parse_permission_update};
use casetrack_cases::{Case, CaseDraft, CasePatch, CaseStatus, Priority};
use casetrack_core::{CaseId, CommentId, DomainError, UserId};
use casetrack_infra::{CaseListQuery, CasePage, UserStats, clamp_limit};

use crate::app::errors::ApiError;

// ─────────────────────────────────────────────────────────────────────────────
// Envelopes
// ─────────────────────────────────────────────────────────────────────────────

pub fn ok(data: impl Serialize) -> Response {
    envelope(StatusCode::OK, None, data)
}

pub fn ok_with_message(message: impl Into<String>, data: impl Serialize) -> Response {
    envelope(StatusCode::OK, Some(message.into()), data)
}

pub fn created(message: impl Into<String>, data: impl Serialize) -> Response {
    envelope(StatusCode::CREATED, Some(message.into()), data)
}

/// Success with a message and nothing else.
pub fn done(message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message.into() })),
    )
        .into_response()
}

/// Collections carry their length next to the data.
pub fn listed<T: Serialize>(items: &[T]) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "count": items.len(), "data": items })),
    )
        .into_response()
}

fn envelope(status: StatusCode, message: Option<String>, data: impl Serialize) -> Response {
    let mut body = json!({ "success": true, "data": data });
    if let Some(message) = message {
        body["message"] = Value::String(message);
    }
    (status, Json(body)).into_response()
}

pub fn case_page(page: CasePage) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "count": page.cases.len(),
            "hasMore": page.has_more,
            "nextCursor": page.next_cursor,
            "data": page.cases,
        })),
    )
        .into_response()
}

pub fn user_with_stats(user: User, stats: UserStats) -> Value {
    json!({
        "uid": user.uid,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "createdAt": user.created_at,
        "stats": stats,
    })
}

pub fn assignment(case: &Case) -> Value {
    json!({
        "id": case.id,
        "assignedTo": case.assigned_to,
        "assignedToName": case.assigned_to_name,
    })
}

pub fn watching(case: &Case, uid: &UserId) -> Value {
    json!({ "id": case.id, "watching": case.is_watched_by(uid) })
}

// ─────────────────────────────────────────────────────────────────────────────
// Path parameters
// ─────────────────────────────────────────────────────────────────────────────

/// A malformed id cannot name a stored case, so it reads as "not found".
pub fn case_id(raw: &str) -> Result<CaseId, ApiError> {
    raw.parse::<CaseId>()
        .map_err(|_| DomainError::not_found("Case not found").into())
}

pub fn comment_id(raw: &str) -> Result<CommentId, ApiError> {
    raw.parse::<CommentId>()
        .map_err(|_| DomainError::not_found("Comment not found").into())
}

pub fn user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse::<UserId>()
        .map_err(|_| DomainError::not_found("User not found").into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub uid: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl RegisterRequest {
    pub fn into_registration(self) -> Result<Registration, ApiError> {
        let uid: UserId = self.uid.as_deref().unwrap_or("").parse()?;
        Ok(Registration::new(
            uid,
            self.name.as_deref().unwrap_or(""),
            self.email.as_deref().unwrap_or(""),
        )?)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Option<String>,
}

impl ChangeRoleRequest {
    pub fn role(&self) -> Result<Role, ApiError> {
        Ok(self.role.as_deref().unwrap_or("").trim().parse::<Role>()?)
    }
}

#[derive(Debug, Deserialize)]
pub struct SetPermissionsRequest {
    pub permissions: Option<Value>,
}

impl SetPermissionsRequest {
    pub fn update(&self) -> Result<PermissionMap, ApiError> {
        let raw = self.permissions.as_ref().unwrap_or(&Value::Null);
        Ok(parse_permission_update(raw)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cases
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub due_date: Option<String>,
}

impl CreateCaseRequest {
    /// Priority, assignee and due date are admin-only on create. For anyone
    /// else they are dropped unparsed, so malformed values cannot fail the
    /// request.
    pub fn into_draft(self, is_admin: bool) -> Result<CaseDraft, ApiError> {
        let mut draft = CaseDraft::new(
            self.title.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
        )?;
        if !is_admin {
            return Ok(draft);
        }
        draft.priority = self
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?;
        draft.assigned_to = non_empty(self.assigned_to).map(UserId::new);
        draft.due_date = match non_empty(self.due_date) {
            Some(raw) => Some(parse_due_date(&raw)?),
            None => None,
        };
        Ok(draft)
    }
}

/// Update body. `null` and `""` for `assignedTo`/`dueDate` clear the field;
/// an absent key leaves it alone.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
}

impl UpdateCaseRequest {
    /// Non-admins are refused on the mere presence of an admin-only field, so
    /// only admins get those values parsed. A non-admin's patch keeps the
    /// presence with a placeholder value that the edit gate rejects unread.
    pub fn into_patch(self, is_admin: bool) -> Result<CasePatch, ApiError> {
        if !is_admin {
            return Ok(CasePatch {
                title: self.title,
                description: self.description,
                priority: self.priority.map(|_| Priority::default()),
                status: self.status.map(|_| CaseStatus::Open),
                assigned_to: self.assigned_to.map(|_| None),
                due_date: self.due_date.map(|_| None),
            });
        }
        Ok(CasePatch {
            title: self.title,
            description: self.description,
            priority: self
                .priority
                .as_deref()
                .map(str::parse::<Priority>)
                .transpose()?,
            status: self
                .status
                .as_deref()
                .map(str::parse::<CaseStatus>)
                .transpose()?,
            assigned_to: self
                .assigned_to
                .map(|value| non_empty(value).map(UserId::new)),
            due_date: match self.due_date {
                None => None,
                Some(value) => Some(match non_empty(value) {
                    Some(raw) => Some(parse_due_date(&raw)?),
                    None => None,
                }),
            },
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

impl UpdateStatusRequest {
    pub fn status(&self) -> Result<CaseStatus, ApiError> {
        let raw = self
            .status
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("Status is required"))?;
        Ok(raw.parse::<CaseStatus>()?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub assigned_to: Option<String>,
}

impl AssignRequest {
    /// `None`, `null` or `""` unassigns.
    pub fn assignee(self) -> Option<UserId> {
        non_empty(self.assigned_to).map(UserId::new)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCasesParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl ListCasesParams {
    pub fn into_query(self) -> Result<CaseListQuery, ApiError> {
        let status = match non_empty(self.status) {
            Some(s) if s == "All" => None,
            Some(s) => Some(s.parse::<CaseStatus>()?),
            None => None,
        };
        let priority = match non_empty(self.priority) {
            Some(p) if p == "All" => None,
            Some(p) => Some(p.parse::<Priority>()?),
            None => None,
        };
        Ok(CaseListQuery {
            status,
            priority,
            search: non_empty(self.search),
            limit: clamp_limit(self.limit.as_deref()),
            cursor: self.cursor.and_then(|c| c.parse().ok()),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Comments
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub message: Option<String>,
}

impl CommentRequest {
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// RFC 3339 timestamps, or bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::bad_request("Due date must be a valid date"))
}
