use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::api::format::{SubmissionView, TagGroupView};
use crate::app::AppState;
use crate::database::models::SubmissionListing;
use crate::database::store::SubmissionFilter;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{CreateSubmission, RiskMismatch, UpdateSubmission};
use crate::types::RiskLevel;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub organization_id: Option<Uuid>,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    #[serde(default)]
    pub tag_name: String,
    pub risk: Option<RiskLevel>,
    pub sensitive_info: Option<String>,
}

/// Omitted fields are left alone; `"sensitive_info": null` clears the note.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubmissionRequest {
    pub risk: Option<RiskLevel>,
    #[serde(default, deserialize_with = "present")]
    pub sensitive_info: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: Uuid,
    pub deleted: bool,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("Invalid submission id '{}'", id)))
}

/// Keeps the rejection's status for oversized or non-JSON bodies.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        let message = rejection.body_text();
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(message),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::unsupported_media_type(message),
            _ => ApiError::bad_request(message),
        }
    })
}

fn view(state: &AppState, user: &AuthUser, listing: &SubmissionListing) -> SubmissionView {
    SubmissionView::for_viewer(listing, &state.service.permission_context(user, listing))
}

/// GET /api/submissions - every role may list every submission
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<SubmissionView>> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let filter = SubmissionFilter {
        organization_id: query.organization_id,
        tag_name: query.tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
    };
    let listings = state.service.list(&filter).await?;
    Ok(ApiResponse::success(
        listings.iter().map(|l| view(&state, &user, l)).collect(),
    ))
}

/// POST /api/submissions
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateSubmissionRequest>, JsonRejection>,
) -> ApiResult<SubmissionView> {
    let request = body(payload)?;
    let created = state
        .service
        .create(
            &user,
            CreateSubmission {
                tag_name: request.tag_name,
                risk: request.risk,
                sensitive_info: request.sensitive_info,
            },
        )
        .await?;
    Ok(ApiResponse::created(view(&state, &user, &created)))
}

/// GET /api/submissions/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<SubmissionView> {
    let listing = state.service.get(parse_id(&id)?).await?;
    Ok(ApiResponse::success(view(&state, &user, &listing)))
}

/// PUT /api/submissions/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSubmissionRequest>, JsonRejection>,
) -> ApiResult<SubmissionView> {
    let id = parse_id(&id)?;
    let request = body(payload)?;
    let updated = state
        .service
        .update(
            &user,
            id,
            UpdateSubmission {
                risk: request.risk,
                sensitive_info: request.sensitive_info,
            },
        )
        .await?;
    Ok(ApiResponse::success(view(&state, &user, &updated)))
}

/// DELETE /api/submissions/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let id = parse_id(&id)?;
    state.service.delete(&user, id).await?;
    Ok(ApiResponse::success(Deleted { id, deleted: true }))
}

/// GET /api/submissions/tags/:tag
pub async fn by_tag(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(tag): Path<String>,
) -> ApiResult<TagGroupView> {
    let group = state.service.by_tag(&tag).await?;
    let views = group.submissions.iter().map(|l| view(&state, &user, l)).collect();
    Ok(ApiResponse::success(TagGroupView::new(&group, views)))
}

/// GET /api/submissions/mismatches
pub async fn mismatches(State(state): State<AppState>) -> ApiResult<Vec<RiskMismatch>> {
    Ok(ApiResponse::success(state.service.mismatches().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_absent_from_null() {
        let absent: UpdateSubmissionRequest = serde_json::from_str(r#"{"risk":"HIGH"}"#).unwrap();
        assert_eq!(absent.sensitive_info, None);
        assert_eq!(absent.risk, Some(RiskLevel::High));

        let cleared: UpdateSubmissionRequest = serde_json::from_str(r#"{"sensitive_info":null}"#).unwrap();
        assert_eq!(cleared.sensitive_info, Some(None));

        let set: UpdateSubmissionRequest = serde_json::from_str(r#"{"sensitive_info":"note"}"#).unwrap();
        assert_eq!(set.sensitive_info, Some(Some("note".to_string())));
    }

    #[test]
    fn rejects_unknown_risk() {
        assert!(serde_json::from_str::<UpdateSubmissionRequest>(r#"{"risk":"SEVERE"}"#).is_err());
    }
}
