//! Event REST API routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;

use super::models::{Event, EventStatus, TicketInfo};
use super::CommunityState;

pub fn events_router(state: Arc<CommunityState>) -> Router {
    Router::new()
        .route("/", post(create_event).get(list_events))
        .route(
            "/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/{id}/rsvp", post(rsvp_event))
        .route("/{id}/cancel-rsvp", post(cancel_rsvp_event))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub is_virtual: bool,
    pub virtual_link: Option<String>,
    pub date: String,
    pub end_date: Option<String>,
    pub organizer: String,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub tickets: TicketInfo,
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub rsvp_required: bool,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_virtual: Option<bool>,
    pub virtual_link: Option<String>,
    pub date: Option<String>,
    pub end_date: Option<String>,
    pub capacity: Option<i64>,
    pub tickets: Option<TicketInfo>,
    pub category: Option<String>,
    pub rsvp_required: Option<bool>,
    pub is_public: Option<bool>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
}

fn find_event(state: &CommunityState, id: &str) -> Result<Event, ApiError> {
    state
        .db
        .find_event(id)?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// A virtual event must carry a usable meeting link.
fn validate_virtual_link(is_virtual: bool, link: Option<&str>) -> Result<(), ApiError> {
    if !is_virtual {
        return Ok(());
    }
    match link {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
        _ => Err(ApiError::Validation(
            "Virtual events require a valid virtual link".to_string(),
        )),
    }
}

async fn create_event(
    State(state): State<Arc<CommunityState>>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty()
        || req.description.trim().is_empty()
        || req.location.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Title, description and location are required".to_string(),
        ));
    }
    if req.organizer.trim().is_empty() {
        return Err(ApiError::Validation("Organizer is required".to_string()));
    }
    validate_virtual_link(req.is_virtual, req.virtual_link.as_deref())?;

    let now = chrono::Utc::now().to_rfc3339();
    let event = Event {
        id: uuid::Uuid::new_v4().to_string(),
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        location: req.location.trim().to_string(),
        is_virtual: req.is_virtual,
        virtual_link: req.virtual_link,
        date: req.date,
        end_date: req.end_date,
        organizer_id: req.organizer,
        attendees: vec![],
        capacity: req.capacity,
        tickets: req.tickets,
        category: req.category,
        rsvp_required: req.rsvp_required,
        is_public: req.is_public,
        status: EventStatus::Upcoming,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.create_event(&event)?;

    Ok((StatusCode::CREATED, Json(event)))
}

async fn list_events(
    State(state): State<Arc<CommunityState>>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut events: Vec<Event> = state
        .db
        .list_events()?
        .into_iter()
        .filter(|e| {
            query
                .search
                .as_deref()
                .is_none_or(|s| e.title.to_lowercase().contains(&s.to_lowercase()))
        })
        .filter(|e| {
            query
                .status
                .as_deref()
                .is_none_or(|s| e.status.as_str() == s)
        })
        .collect();

    if let Some(sort_by) = query.sort_by.as_deref() {
        match sort_by {
            "title" => events.sort_by(|a, b| a.title.cmp(&b.title)),
            "date" => events.sort_by(|a, b| a.date.cmp(&b.date)),
            "createdAt" => events.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            "capacity" => events.sort_by(|a, b| a.capacity.cmp(&b.capacity)),
            _ => {}
        }
    }

    Ok(Json(serde_json::json!({"events": events})))
}

async fn get_event(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(find_event(&state, &id)?))
}

async fn update_event(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let mut event = find_event(&state, &id)?;

    if let Some(title) = req.title {
        event.title = title;
    }
    if let Some(description) = req.description {
        event.description = description;
    }
    if let Some(location) = req.location {
        event.location = location;
    }
    if let Some(is_virtual) = req.is_virtual {
        event.is_virtual = is_virtual;
    }
    if let Some(link) = req.virtual_link {
        event.virtual_link = Some(link);
    }
    if let Some(date) = req.date {
        event.date = date;
    }
    if let Some(end_date) = req.end_date {
        event.end_date = Some(end_date);
    }
    if let Some(capacity) = req.capacity {
        event.capacity = capacity;
    }
    if let Some(tickets) = req.tickets {
        event.tickets = tickets;
    }
    if let Some(category) = req.category {
        event.category = Some(category);
    }
    if let Some(rsvp_required) = req.rsvp_required {
        event.rsvp_required = rsvp_required;
    }
    if let Some(is_public) = req.is_public {
        event.is_public = is_public;
    }
    if let Some(status) = req.status {
        event.status = status;
    }
    validate_virtual_link(event.is_virtual, event.virtual_link.as_deref())?;

    event.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_event(&event)?;

    Ok(Json(event))
}

async fn delete_event(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.db.delete_event(&id)? {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }
    Ok(Json(
        serde_json::json!({"message": "Event deleted successfully"}),
    ))
}

/// Add the caller to the attendee list. Repeating an RSVP is a no-op.
async fn rsvp_event(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
    Json(req): Json<RsvpRequest>,
) -> Result<Json<Event>, ApiError> {
    let mut event = find_event(&state, &id)?;

    if !event.attendees.iter().any(|a| a == &req.user_id) {
        if event.capacity > 0 && event.attendees.len() as i64 >= event.capacity {
            return Err(ApiError::Conflict("Event is at capacity".to_string()));
        }
        event.attendees.push(req.user_id);
        event.updated_at = chrono::Utc::now().to_rfc3339();
        state.db.update_event(&event)?;
    }

    Ok(Json(event))
}

async fn cancel_rsvp_event(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
    Json(req): Json<RsvpRequest>,
) -> Result<Json<Event>, ApiError> {
    let mut event = find_event(&state, &id)?;

    event.attendees.retain(|a| a != &req.user_id);
    event.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_event(&event)?;

    Ok(Json(event))
}
