//! Profile REST API routes: CRUD, follow graph, social links, programs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;

use super::models::{Profile, Program, SocialLink};
use super::CommunityState;

pub fn profiles_router(state: Arc<CommunityState>) -> Router {
    Router::new()
        .route("/", post(create_profile).get(list_profiles))
        .route(
            "/{user_id}",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/{user_id}/follow", post(follow_user))
        .route("/{user_id}/unfollow", post(unfollow_user))
        .route("/{user_id}/social-links", post(add_social_link))
        .route(
            "/{user_id}/social-links/{link_id}",
            delete(remove_social_link),
        )
        .route("/{user_id}/programs", post(add_program))
        .route("/{user_id}/programs/{program_id}", delete(remove_program))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    pub year: Option<i64>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    pub year: Option<i64>,
    pub interests: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub follower_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddSocialLinkRequest {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProgramRequest {
    pub program_name: String,
    pub program_type: Option<String>,
    pub major: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileListQuery {
    pub search: Option<String>,
    pub sort_by: Option<String>,
}

fn find_profile(state: &CommunityState, user_id: &str) -> Result<Profile, ApiError> {
    state
        .db
        .find_profile(user_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
}

async fn create_profile(
    State(state): State<Arc<CommunityState>>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.user_id.trim().is_empty() || req.username.trim().is_empty() {
        return Err(ApiError::Validation(
            "User id and username are required".to_string(),
        ));
    }
    if state.db.find_profile(&req.user_id)?.is_some() {
        return Err(ApiError::Conflict(
            "Profile already exists for this user".to_string(),
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let profile = Profile {
        user_id: req.user_id,
        username: req.username,
        email: req.email,
        phone: req.phone,
        profile_picture: req.profile_picture,
        bio: req.bio,
        date_of_birth: req.date_of_birth,
        year: req.year,
        interests: req.interests,
        skills: req.skills,
        social_links: vec![],
        programs: vec![],
        followers: vec![],
        following: vec![],
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.create_profile(&profile)?;

    Ok((StatusCode::CREATED, Json(profile)))
}

async fn list_profiles(
    State(state): State<Arc<CommunityState>>,
    Query(query): Query<ProfileListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut profiles: Vec<Profile> = state
        .db
        .list_profiles()?
        .into_iter()
        .filter(|p| {
            query
                .search
                .as_deref()
                .is_none_or(|s| p.username.to_lowercase().contains(&s.to_lowercase()))
        })
        .collect();

    if let Some(sort_by) = query.sort_by.as_deref() {
        match sort_by {
            "username" => profiles.sort_by(|a, b| a.username.cmp(&b.username)),
            "createdAt" => profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            _ => {}
        }
    }

    Ok(Json(serde_json::json!({"profiles": profiles})))
}

async fn get_profile(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(find_profile(&state, &id)?))
}

async fn update_profile(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let mut profile = find_profile(&state, &id)?;

    if let Some(username) = req.username {
        profile.username = username;
    }
    if let Some(email) = req.email {
        profile.email = email;
    }
    if let Some(phone) = req.phone {
        profile.phone = Some(phone);
    }
    if let Some(picture) = req.profile_picture {
        profile.profile_picture = Some(picture);
    }
    if let Some(bio) = req.bio {
        profile.bio = Some(bio);
    }
    if let Some(dob) = req.date_of_birth {
        profile.date_of_birth = Some(dob);
    }
    if let Some(year) = req.year {
        profile.year = Some(year);
    }
    if let Some(interests) = req.interests {
        profile.interests = interests;
    }
    if let Some(skills) = req.skills {
        profile.skills = skills;
    }
    profile.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_profile(&profile)?;

    Ok(Json(profile))
}

async fn delete_profile(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.db.delete_profile(&id)? {
        return Err(ApiError::NotFound("Profile not found".to_string()));
    }
    Ok(Json(
        serde_json::json!({"message": "Profile deleted successfully"}),
    ))
}

/// Record the follow on both sides: the target gains a follower, the
/// follower gains a following entry. Both writes are membership-checked,
/// so repeating the call changes nothing.
async fn follow_user(
    State(state): State<Arc<CommunityState>>,
    Path(user_id): Path<String>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<Profile>, ApiError> {
    if user_id == req.follower_id {
        return Err(ApiError::Validation(
            "You cannot follow yourself".to_string(),
        ));
    }

    let mut target = find_profile(&state, &user_id)?;
    let mut follower = find_profile(&state, &req.follower_id)?;

    let now = chrono::Utc::now().to_rfc3339();
    if !target.followers.contains(&req.follower_id) {
        target.followers.push(req.follower_id.clone());
        target.updated_at = now.clone();
        state.db.update_profile(&target)?;
    }
    if !follower.following.contains(&user_id) {
        follower.following.push(user_id);
        follower.updated_at = now;
        state.db.update_profile(&follower)?;
    }

    Ok(Json(target))
}

async fn unfollow_user(
    State(state): State<Arc<CommunityState>>,
    Path(user_id): Path<String>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<Profile>, ApiError> {
    let mut target = find_profile(&state, &user_id)?;
    let mut follower = find_profile(&state, &req.follower_id)?;

    let now = chrono::Utc::now().to_rfc3339();
    target.followers.retain(|f| f != &req.follower_id);
    target.updated_at = now.clone();
    state.db.update_profile(&target)?;

    follower.following.retain(|f| f != &user_id);
    follower.updated_at = now;
    state.db.update_profile(&follower)?;

    Ok(Json(target))
}

async fn add_social_link(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
    Json(req): Json<AddSocialLinkRequest>,
) -> Result<Json<Profile>, ApiError> {
    if req.platform.trim().is_empty() || req.url.trim().is_empty() {
        return Err(ApiError::Validation(
            "Platform and url are required".to_string(),
        ));
    }

    let mut profile = find_profile(&state, &id)?;
    profile.social_links.push(SocialLink {
        id: uuid::Uuid::new_v4().to_string(),
        platform: req.platform,
        url: req.url,
    });
    profile.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_profile(&profile)?;

    Ok(Json(profile))
}

async fn remove_social_link(
    State(state): State<Arc<CommunityState>>,
    Path((id, link_id)): Path<(String, String)>,
) -> Result<Json<Profile>, ApiError> {
    let mut profile = find_profile(&state, &id)?;

    let before = profile.social_links.len();
    profile.social_links.retain(|l| l.id != link_id);
    if profile.social_links.len() == before {
        return Err(ApiError::NotFound("Social link not found".to_string()));
    }
    profile.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_profile(&profile)?;

    Ok(Json(profile))
}

async fn add_program(
    State(state): State<Arc<CommunityState>>,
    Path(id): Path<String>,
    Json(req): Json<AddProgramRequest>,
) -> Result<Json<Profile>, ApiError> {
    if req.program_name.trim().is_empty() {
        return Err(ApiError::Validation("Program name is required".to_string()));
    }

    let mut profile = find_profile(&state, &id)?;
    profile.programs.push(Program {
        id: uuid::Uuid::new_v4().to_string(),
        program_name: req.program_name,
        program_type: req.program_type,
        major: req.major,
    });
    profile.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_profile(&profile)?;

    Ok(Json(profile))
}

async fn remove_program(
    State(state): State<Arc<CommunityState>>,
    Path((id, program_id)): Path<(String, String)>,
) -> Result<Json<Profile>, ApiError> {
    let mut profile = find_profile(&state, &id)?;

    let before = profile.programs.len();
    profile.programs.retain(|p| p.id != program_id);
    if profile.programs.len() == before {
        return Err(ApiError::NotFound("Program not found".to_string()));
    }
    profile.updated_at = chrono::Utc::now().to_rfc3339();
    state.db.update_profile(&profile)?;

    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::CommunityDatabase;
    use axum::body::Body;
    use http::{header, Method, Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = Arc::new(CommunityState {
            db: CommunityDatabase::in_memory().unwrap(),
        });
        Router::new().nest("/api/profile", profiles_router(state))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn create(app: &Router, user_id: &str, username: &str) {
        let (status, _) = send(
            app,
            Method::POST,
            "/api/profile/",
            Some(json!({
                "userId": user_id,
                "username": username,
                "email": format!("{}@example.com", username)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_conflicts_on_duplicate_user() {
        let app = app();
        create(&app, "user_1", "jdoe").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/profile/",
            Some(json!({"userId": "user_1", "username": "other", "email": "o@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_follow_updates_both_sides() {
        let app = app();
        create(&app, "user_1", "alice").await;
        create(&app, "user_2", "bob").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/profile/user_1/follow",
            Some(json!({"followerId": "user_2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["followers"], json!(["user_2"]));

        // Repeating the follow changes nothing.
        let (_, body) = send(
            &app,
            Method::POST,
            "/api/profile/user_1/follow",
            Some(json!({"followerId": "user_2"})),
        )
        .await;
        assert_eq!(body["followers"].as_array().unwrap().len(), 1);

        let (_, bob) = send(&app, Method::GET, "/api/profile/user_2", None).await;
        assert_eq!(bob["following"], json!(["user_1"]));
    }

    #[tokio::test]
    async fn test_unfollow_removes_both_sides() {
        let app = app();
        create(&app, "user_1", "alice").await;
        create(&app, "user_2", "bob").await;
        send(
            &app,
            Method::POST,
            "/api/profile/user_1/follow",
            Some(json!({"followerId": "user_2"})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/profile/user_1/unfollow",
            Some(json!({"followerId": "user_2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["followers"].as_array().unwrap().is_empty());

        let (_, bob) = send(&app, Method::GET, "/api/profile/user_2", None).await;
        assert!(bob["following"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_rejects_self_and_missing_profiles() {
        let app = app();
        create(&app, "user_1", "alice").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/profile/user_1/follow",
            Some(json!({"followerId": "user_1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/profile/user_1/follow",
            Some(json!({"followerId": "ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_social_link_lifecycle() {
        let app = app();
        create(&app, "user_1", "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/profile/user_1/social-links",
            Some(json!({"platform": "github", "url": "https://github.com/alice"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let link_id = body["socialLinks"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/profile/user_1/social-links/{}", link_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["socialLinks"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_program_lifecycle() {
        let app = app();
        create(&app, "user_1", "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/profile/user_1/programs",
            Some(json!({"programName": "CS", "programType": "major", "major": "Computer Science"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let program_id = body["programs"][0]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/profile/user_1/programs/{}", program_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/profile/user_1/programs/{}", program_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_search_by_username() {
        let app = app();
        create(&app, "user_1", "alice").await;
        create(&app, "user_2", "bob").await;

        let (_, body) = send(&app, Method::GET, "/api/profile/?search=ali", None).await;
        assert_eq!(body["profiles"].as_array().unwrap().len(), 1);
        assert_eq!(body["profiles"][0]["username"], "alice");
    }
}
