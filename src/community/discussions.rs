//! Discussion REST API routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;

use super::models::{Comment, Discussion, DiscussionStatus};
use super::CommunityState;

pub fn discussions_router(state: Arc<CommunityState>) -> Router {
    Router::new()
        .route("/", post(create_discussion).get(list_discussions))
        .route(
            "/{id}",
            get(get_discussion)
                .put(update_discussion)
                .delete(delete_discussion),
        )
        .route("/{id}/comments", post(add_comment))
        .route("/{id}/comments/{comment_id}", delete(delete_comment))
        .route("/{id}/upvote", post(upvote_discussion))
        .route("/{id}/downvote", post(downvote_discussion))
        .route("/{id}/pin", post(pin_discussion))
        .route("/{id}/unpin", post(unpin_discussion))
        .route("/{id}/flag", post(flag_discussion))
        .route("/{id}/unflag", post(unflag_discussion))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CreateDiscussionRequest {
    pub title: String,
    pub body: String,
    pub user: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDiscussionRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<DiscussionStatus>,
    pub pinned: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub comment_body: String,
    pub comment_user: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscussionListQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub status: Option<String>,
    pub pinned: Option<bool>,
    pub flagged: Option<bool>,
    /// Comma-separated; a discussion matches if it carries any listed tag.
    pub tags: Option<String>,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionListResponse {
    pub discussions: Vec<Discussion>,
    pub total_pages: usize,
    pub current_page: usize,
}

fn find_discussion(state: &CommunityState, id: &str) -> Result<Discussion, ApiError> {
    state
        .db
        .find_discussion(id)?
        .ok_or_else(|| ApiError::NotFound("Discussion not found".to_string()))
}

async fn create_discussion(
    State(state): State<Arc<CommunityState>>,
    Json(req): Json<CreateDiscussionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    if req.body.trim().is_empty() {
        return Err(ApiError::Validation("Body content is required".to_string()));
    }
    if req.user.trim().is_empty() {
        return Err(ApiError::Validation("User is required".to_string()));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let discussion = Discussion {
        id: uuid::Uuid::new_v4().to_string(),
        title: req.title.trim().to_string(),
        body: req.body.trim().to_string(),
        user_id: req.user,
        tags: req.tags,
        comments: vec![],
        upvotes: 0,
        downvotes: 0,
        views: 0,
        pinned: false,
        status: DiscussionStatus::Open,
        flagged: false,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.create_discussion(&discussion)?;

    Ok((StatusCode::CREATED, Json(discussion)))
}

async fn list_discussions(
    State(state): State<Arc<CommunityState>>,
    Query(query): Query<DiscussionListQuery>,
) -> Result<Json<DiscussionListResponse>, ApiError> {
    let wanted_tags: Vec<String> = query
        .tags
        .as_deref()
        .map(|t| t.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();

    let matching: Vec<Discussion> = state
        .db
        .list_discussions()?
        .into_iter()
        .filter(|d| {
            query
                .status
                .as_deref()
                .is_none_or(|s| d.status.as_str() == s)
        })
        .filter(|d| query.pinned.is_none_or(|p| d.pinned == p))
        .filter(|d| query.flagged.is_none_or(|f| d.flagged == f))
        .filter(|d| {
            wanted_tags.is_empty() || d.tags.iter().any(|t| wanted_tags.contains(t))
        })
        .collect();

    let limit = query.limit.max(1);
    let page = query.page.max(1);
    let total_pages = matching.len().div_ceil(limit);
    let discussions = matching
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Ok(Json(DiscussionListResponse {
        discussions,
        total_pages,
        current_page: page,
    }))
}

/// Reading a discussion counts as a view.
async fn get_discussion(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<Discussion>, ApiError> {
    let mut discussion = find_discussion(&state, &id)?;
    discussion.views += 1;
    state.db.update_discussion(&discussion)?;
    Ok(Json(discussion))
}

async fn update_discussion(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDiscussionRequest>,
) -> Result<Json<Discussion>, ApiError> {
    let mut discussion = find_discussion(&state, &id)?;

    if let Some(title) = req.title {
        discussion.title = title;
    }
    if let Some(body) = req.body {
        discussion.body = body;
    }
    if let Some(tags) = req.tags {
        discussion.tags = tags;
    }
    if let Some(status) = req.status {
        discussion.status = status;
    }
    if let Some(pinned) = req.pinned {
        discussion.pinned = pinned;
    }
    discussion.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_discussion(&discussion)?;

    Ok(Json(discussion))
}

async fn delete_discussion(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.db.delete_discussion(&id)? {
        return Err(ApiError::NotFound("Discussion not found".to_string()));
    }
    Ok(Json(
        serde_json::json!({"message": "Discussion deleted successfully"}),
    ))
}

async fn add_comment(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
    Json(req): Json<AddCommentRequest>,
) -> Result<Json<Discussion>, ApiError> {
    if req.comment_body.trim().is_empty() {
        return Err(ApiError::Validation("Comment body is required".to_string()));
    }

    let mut discussion = find_discussion(&state, &id)?;
    discussion.comments.push(Comment {
        id: uuid::Uuid::new_v4().to_string(),
        body: req.comment_body,
        user_id: req.comment_user,
        upvotes: 0,
        downvotes: 0,
        created_at: chrono::Utc::now().to_rfc3339(),
    });
    discussion.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_discussion(&discussion)?;

    Ok(Json(discussion))
}

async fn delete_comment(
    State(state): State<Arc<CommunityState>>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut discussion = find_discussion(&state, &id)?;

    let before = discussion.comments.len();
    discussion.comments.retain(|c| c.id != comment_id);
    if discussion.comments.len() == before {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }
    discussion.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_discussion(&discussion)?;

    Ok(Json(
        serde_json::json!({"message": "Comment deleted successfully"}),
    ))
}

async fn upvote_discussion(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut discussion = find_discussion(&state, &id)?;
    discussion.upvotes += 1;
    state.db.update_discussion(&discussion)?;
    Ok(Json(serde_json::json!({
        "message": "Upvoted successfully",
        "upvotes": discussion.upvotes,
    })))
}

async fn downvote_discussion(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut discussion = find_discussion(&state, &id)?;
    discussion.downvotes += 1;
    state.db.update_discussion(&discussion)?;
    Ok(Json(serde_json::json!({
        "message": "Downvoted successfully",
        "downvotes": discussion.downvotes,
    })))
}

async fn set_pinned(
    state: &CommunityState,
    id: &str,
    pinned: bool,
) -> Result<Discussion, ApiError> {
    let mut discussion = find_discussion(state, id)?;
    discussion.pinned = pinned;
    discussion.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_discussion(&discussion)?;
    Ok(discussion)
}

async fn pin_discussion(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    set_pinned(&state, &id, true).await?;
    Ok(Json(
        serde_json::json!({"message": "Discussion pinned successfully"}),
    ))
}

async fn unpin_discussion(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    set_pinned(&state, &id, false).await?;
    Ok(Json(
        serde_json::json!({"message": "Discussion unpinned successfully"}),
    ))
}

async fn set_flagged(
    state: &CommunityState,
    id: &str,
    flagged: bool,
) -> Result<Discussion, ApiError> {
    let mut discussion = find_discussion(state, id)?;
    discussion.flagged = flagged;
    discussion.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_discussion(&discussion)?;
    Ok(discussion)
}

async fn flag_discussion(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    set_flagged(&state, &id, true).await?;
    Ok(Json(
        serde_json::json!({"message": "Discussion flagged for review"}),
    ))
}

async fn unflag_discussion(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    set_flagged(&state, &id, false).await?;
    Ok(Json(
        serde_json::json!({"message": "Flag removed from discussion"}),
    ))
}
