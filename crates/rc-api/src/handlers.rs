//! # rc-api Handlers
//!
//! Each handler resolves the caller's session from the bearer token, hands
//! it to the matching core service and serialises the result as JSON.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use rc_core::services::{
    AccountService, AnnouncementService, CommentService, ProfileService, ReactionService,
    ShareService,
};
use rc_core::traits::{
    AccountRepo, AnnouncementRepo, AuthProvider, CommentRepo, MediaStore, ProfileRepo,
    ReactionRepo, ShareRepo,
};
use rc_core::{
    AnnouncementPatch, AppError, ModerationPatch, NewAnnouncement, ProfileUpdate, ReactionKind,
    Registration, Session,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub accounts: AccountService,
    pub announcements: AnnouncementService,
    pub comments: CommentService,
    pub profiles: ProfileService,
    pub reactions: ReactionService,
    pub shares: ShareService,
}

impl AppState {
    /// Wires every service to one storage adapter implementing all repositories.
    pub fn new<S>(store: Arc<S>, media: Arc<dyn MediaStore>, auth: Arc<dyn AuthProvider>) -> Self
    where
        S: AccountRepo + ProfileRepo + AnnouncementRepo + ReactionRepo + CommentRepo + ShareRepo + 'static,
    {
        Self {
            accounts: AccountService::new(store.clone(), store.clone(), auth),
            announcements: AnnouncementService::new(store.clone(), media.clone()),
            comments: CommentService::new(store.clone()),
            profiles: ProfileService::new(store.clone(), media),
            reactions: ReactionService::new(store.clone()),
            shares: ShareService::new(store),
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Missing or unknown tokens give an anonymous session; the gate decides.
async fn session(data: &AppState, req: &HttpRequest) -> ApiResult<Session> {
    match bearer_token(req) {
        Some(token) => Ok(data.accounts.session_for_token(token).await?),
        None => Ok(Session::anonymous()),
    }
}

fn content_type(req: &HttpRequest) -> String {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ---- accounts ----

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub async fn register(
    data: web::Data<AppState>,
    body: web::Json<Registration>,
) -> ApiResult<HttpResponse> {
    let profile = data.accounts.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> ApiResult<HttpResponse> {
    let (token, session) = data.accounts.sign_in(&body.email, &body.password).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "token": token,
        "profile": session.acting_profile(),
    })))
}

pub async fn logout(data: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Some(token) = bearer_token(&req) {
        data.accounts.sign_out(token);
    }
    HttpResponse::NoContent().finish()
}

// ---- profiles ----

pub async fn me(data: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let profile = session
        .acting_profile()
        .ok_or_else(|| AppError::Unauthenticated("sign in required".into()))?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_me(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ProfileUpdate>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let profile = data.profiles.update_own(&session, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn upload_avatar(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let image = data
        .profiles
        .set_avatar(&session, body.to_vec(), &content_type(&req))
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "avatar_url": image.url,
        "thumbnail_url": image.thumbnail_url,
    })))
}

pub async fn get_profile(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let profile = data.profiles.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

// ---- announcements ----

pub async fn list_announcements(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.announcements.list().await?))
}

pub async fn get_announcement(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.announcements.get(path.into_inner()).await?))
}

pub async fn create_announcement(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<NewAnnouncement>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let view = data.announcements.create(&session, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

pub async fn update_announcement(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<AnnouncementPatch>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let view = data
        .announcements
        .update(&session, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn delete_announcement(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    data.announcements.delete(&session, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn upload_announcement_image(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let image = data
        .announcements
        .upload_image(&session, body.to_vec(), &content_type(&req))
        .await?;
    Ok(HttpResponse::Created().json(image))
}

// ---- reactions & shares ----

/// `{}` reacts with the default kind; an unknown kind is rejected.
#[derive(Deserialize)]
pub struct ReactionRequest {
    #[serde(default, alias = "reaction_type")]
    pub kind: ReactionKind,
}

pub async fn toggle_reaction(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<ReactionRequest>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let reaction = data
        .reactions
        .toggle(&session, path.into_inner(), body.into_inner().kind)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "reaction": reaction })))
}

pub async fn my_reaction(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let reaction = data.reactions.current(&session, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "reaction": reaction })))
}

pub async fn toggle_share(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let share = data.shares.toggle(&session, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "share": share })))
}

// ---- comments ----

#[derive(Deserialize)]
pub struct NewComment {
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct CommentEdit {
    pub content: String,
}

pub async fn list_comments(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.comments.list(path.into_inner()).await?))
}

pub async fn add_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<NewComment>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let NewComment { content, parent_id } = body.into_inner();
    let comment = data
        .comments
        .add(&session, path.into_inner(), &content, parent_id)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn update_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CommentEdit>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let comment = data
        .comments
        .update(&session, path.into_inner(), &body.content)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn delete_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    data.comments.delete(&session, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---- admin ----

#[derive(Deserialize)]
pub struct ProfileQuery {
    pub q: Option<String>,
}

pub async fn admin_list_profiles(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ProfileQuery>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let profiles = data
        .profiles
        .list_for_admin(&session, query.q.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(profiles))
}

pub async fn admin_moderate(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<ModerationPatch>,
) -> ApiResult<HttpResponse> {
    let session = session(&data, &req).await?;
    let profile = data
        .profiles
        .moderate(&session, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}
