use std::collections::HashMap;
use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt as _;
use serde::{Deserialize, Serialize};

use crate::actions::{registry, ActionInfo};
use crate::error::ApiError;
use crate::models::*;
use crate::notify::{Notice, MEDIA_UPLOADED, PHOTOS_UPLOADED, STORY_SUBMITTED};
use crate::rate_limit::{Limited, RateLimiterFacade};
use crate::repo::Repo;
use crate::storage::{sniff_mime, BlobStore, BlobStoreError};
use crate::sync::{Collections, CommentInput, MediaInput, PhotoInput, StoryInput, SyncService, Upload};
use crate::view::{Lightbox, Step};

pub const PHOTO_SIZE_LIMIT: usize = 10 * 1024 * 1024; // 10 MB
pub const MEDIA_SIZE_LIMIT: usize = 50 * 1024 * 1024; // 50 MB
const FIELD_SIZE_LIMIT: usize = 64 * 1024;

const PHOTO_MIME: &[&str] = &["image/"];
const MEDIA_MIME: &[&str] = &["audio/", "video/"];

/// Malformed or mistyped JSON bodies get the same `{"error": ..}` shape as
/// every other rejection.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("rejected JSON body: {err}");
        ApiError::BadRequest("The request could not be read.".into()).into()
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(json_config())
            .service(web::resource("/collections").route(web::get().to(list_collections)))
            .service(
                web::resource("/stories")
                    .route(web::get().to(list_stories))
                    .route(web::post().to(create_story)),
            )
            .service(web::resource("/photos/lightbox").route(web::get().to(lightbox)))
            .service(
                web::resource("/photos")
                    .route(web::get().to(list_photos))
                    .route(web::post().to(upload_photo)),
            )
            .service(
                web::resource("/media")
                    .route(web::get().to(list_media))
                    .route(web::post().to(upload_media)),
            )
            .service(web::resource("/{kind}/{id}/like").route(web::post().to(like)))
            .service(
                web::resource("/{kind}/{id}/comments")
                    .route(web::get().to(list_comments))
                    .route(web::post().to(add_comment)),
            )
            .service(web::resource("/actions").route(web::get().to(list_actions))),
    );
    // public fetch route (no /api/v1 prefix so <img src="/files/..."> works)
    cfg.route("/files/{path:.*}", web::get().to(get_file));
    cfg.route("/healthz", web::get().to(healthz));
    cfg.route("/metrics", web::get().to(crate::telemetry::metrics_endpoint));
}

#[derive(Clone)]
pub struct AppState {
    pub sync: SyncService,
    pub rate_limiter: Option<RateLimiterFacade>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repo>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { sync: SyncService::new(repo, blobs), rate_limiter: None }
    }

    pub fn with_rate_limiter(mut self, rl: RateLimiterFacade) -> Self {
        self.rate_limiter = Some(rl);
        self
    }

    fn throttle(&self, req: &HttpRequest, action: Limited) -> Result<(), ApiError> {
        let Some(rl) = &self.rate_limiter else { return Ok(()) };
        let info = req.connection_info();
        let client = if rl.cfg.trust_proxy { info.realip_remote_addr() } else { info.peer_addr() };
        let ip = client.unwrap_or("unknown");
        if rl.allow(action, ip) {
            Ok(())
        } else {
            tracing::warn!(?action, %ip, "rate limited");
            Err(ApiError::TooManyRequests)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LikeResponse {
    pub likes: i64,
}

/// Reloaded collections plus the toast to show for a submission.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Submitted {
    #[serde(flatten)]
    pub collections: Collections,
    pub notice: Notice,
}

impl Submitted {
    fn created(collections: Collections, message: &str) -> HttpResponse {
        HttpResponse::Created().json(Submitted { collections, notice: Notice::success(message) })
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LightboxQuery {
    pub index: Option<usize>,
    pub step: Option<Step>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LightboxView {
    pub index: usize,
    pub total: usize,
    pub photo: Photo,
}

fn content_kind(segment: &str) -> Result<ContentKind, ApiError> {
    ContentKind::from_collection(segment).ok_or(ApiError::NotFound)
}

fn parent_kind(segment: &str) -> Result<ParentKind, ApiError> {
    ParentKind::from_collection(segment).ok_or(ApiError::NotFound)
}

#[utoipa::path(
    get,
    path = "/api/v1/collections",
    responses(
        (status = 200, description = "Stories, photos and media, newest first", body = Collections),
        (status = 500, description = "Load failed", body = crate::error::ApiErrorBody)
    )
)]
pub async fn list_collections(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.sync.load_all().await?))
}

#[utoipa::path(get, path = "/api/v1/stories", responses((status = 200, description = "List stories", body = [Story])))]
pub async fn list_stories(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.sync.stories().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/stories",
    request_body = StoryInput,
    responses(
        (status = 201, description = "Story saved; reloaded collections and a success notice", body = Submitted),
        (status = 400, description = "Missing fields or unreadable body", body = crate::error::ApiErrorBody),
        (status = 429, description = "Rate limited", body = crate::error::ApiErrorBody)
    )
)]
pub async fn create_story(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<StoryInput>,
) -> Result<HttpResponse, ApiError> {
    data.throttle(&req, Limited::Story)?;
    let all = data.sync.submit_story(payload.into_inner()).await?;
    Ok(Submitted::created(all, STORY_SUBMITTED))
}

#[utoipa::path(get, path = "/api/v1/photos", responses((status = 200, description = "List photos", body = [Photo])))]
pub async fn list_photos(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.sync.photos().await?))
}

#[utoipa::path(get, path = "/api/v1/media", responses((status = 200, description = "List media", body = [Media])))]
pub async fn list_media(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.sync.media().await?))
}

/// Text fields plus the optional `file` part of an upload form.
struct UploadForm {
    fields: HashMap<String, String>,
    file: Option<Upload>,
}

impl UploadForm {
    fn text(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

async fn read_upload_form(mut payload: Multipart, size_limit: usize, allowed: &[&str]) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm { fields: HashMap::new(), file: None };
    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        log::error!("multipart error: {e}");
        ApiError::BadRequest("The upload could not be read.".into())
    })? {
        let Some(name) = field.content_disposition().get_name().map(str::to_string) else { continue };
        let declared = field.content_type().map(|m| m.essence_str().to_string());
        let limit = if name == "file" { size_limit } else { FIELD_SIZE_LIMIT };
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| {
            log::error!("stream read error: {e}");
            ApiError::BadRequest("The upload could not be read.".into())
        })? {
            if bytes.len() + chunk.len() > limit {
                return Err(ApiError::PayloadTooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }
        if name != "file" {
            form.fields.insert(name, String::from_utf8_lossy(&bytes).into_owned());
            continue;
        }
        // browsers send an empty part when no file was chosen
        if bytes.is_empty() {
            continue;
        }
        let mut mime = sniff_mime(&bytes);
        if mime == "application/octet-stream" {
            if let Some(d) = declared {
                mime = d;
            }
        }
        if !allowed.iter().any(|prefix| mime.starts_with(prefix)) {
            return Err(ApiError::UnsupportedMediaType);
        }
        form.file = Some(Upload { bytes, mime });
    }
    Ok(form)
}

#[utoipa::path(
    post,
    path = "/api/v1/photos",
    request_body(content = PhotoInput, content_type = "multipart/form-data", description = "Form fields plus an optional `file` part"),
    responses(
        (status = 201, description = "Photo saved; reloaded collections and a success notice", body = Submitted),
        (status = 400, description = "Missing fields or image", body = crate::error::ApiErrorBody),
        (status = 413, description = "File too large", body = crate::error::ApiErrorBody),
        (status = 415, description = "Not an image", body = crate::error::ApiErrorBody)
    )
)]
pub async fn upload_photo(req: HttpRequest, data: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    data.throttle(&req, Limited::Upload)?;
    let mut form = read_upload_form(payload, PHOTO_SIZE_LIMIT, PHOTO_MIME).await?;
    let input = PhotoInput {
        author_name: form.text("author_name").unwrap_or_default(),
        author_avatar: form.text("author_avatar"),
        title: form.text("title").unwrap_or_default(),
        description: form.text("description"),
        category: form.text("category"),
        image_url: form.text("image_url"),
    };
    let all = data.sync.upload_photo(input, form.file).await?;
    Ok(Submitted::created(all, PHOTOS_UPLOADED))
}

#[utoipa::path(
    post,
    path = "/api/v1/media",
    request_body(content = MediaInput, content_type = "multipart/form-data", description = "Form fields plus an optional `file` part"),
    responses(
        (status = 201, description = "Media saved; reloaded collections and a success notice", body = Submitted),
        (status = 400, description = "Missing fields, file or link", body = crate::error::ApiErrorBody),
        (status = 413, description = "File too large", body = crate::error::ApiErrorBody),
        (status = 415, description = "Not audio or video", body = crate::error::ApiErrorBody)
    )
)]
pub async fn upload_media(req: HttpRequest, data: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    data.throttle(&req, Limited::Upload)?;
    let mut form = read_upload_form(payload, MEDIA_SIZE_LIMIT, MEDIA_MIME).await?;
    let input = MediaInput {
        author_name: form.text("author_name").unwrap_or_default(),
        author_avatar: form.text("author_avatar"),
        title: form.text("title").unwrap_or_default(),
        description: form.text("description"),
        media_type: form.text("media_type"),
        media_url: form.text("media_url"),
    };
    let all = data.sync.upload_media(input, form.file).await?;
    Ok(Submitted::created(all, MEDIA_UPLOADED))
}

#[utoipa::path(
    post,
    path = "/api/v1/{kind}/{id}/like",
    params(
        ("kind" = String, Path, description = "stories, photos or media"),
        ("id" = i64, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "New like count", body = LikeResponse),
        (status = 404, description = "Unknown record", body = crate::error::ApiErrorBody)
    )
)]
pub async fn like(req: HttpRequest, data: web::Data<AppState>, path: web::Path<(String, Id)>) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let kind = content_kind(&kind)?;
    data.throttle(&req, Limited::Like)?;
    let likes = data.sync.like(kind, id).await?;
    Ok(HttpResponse::Ok().json(LikeResponse { likes }))
}

#[utoipa::path(
    get,
    path = "/api/v1/{kind}/{id}/comments",
    params(
        ("kind" = String, Path, description = "stories or photos"),
        ("id" = i64, Path, description = "Record id")
    ),
    responses((status = 200, description = "Comments, oldest first", body = [Comment]))
)]
pub async fn list_comments(data: web::Data<AppState>, path: web::Path<(String, Id)>) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let comments = data.sync.comments(parent_kind(&kind)?, id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

#[utoipa::path(
    post,
    path = "/api/v1/{kind}/{id}/comments",
    request_body = CommentInput,
    params(
        ("kind" = String, Path, description = "stories or photos"),
        ("id" = i64, Path, description = "Record id")
    ),
    responses(
        (status = 201, description = "Comment saved; reloaded thread", body = [Comment]),
        (status = 400, description = "Empty comment", body = crate::error::ApiErrorBody),
        (status = 404, description = "Unknown record", body = crate::error::ApiErrorBody)
    )
)]
pub async fn add_comment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<(String, Id)>,
    payload: web::Json<CommentInput>,
) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let parent = parent_kind(&kind)?;
    data.throttle(&req, Limited::Comment)?;
    let comments = data.sync.add_comment(parent, id, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(comments))
}

#[utoipa::path(
    get,
    path = "/api/v1/photos/lightbox",
    params(LightboxQuery),
    responses(
        (status = 200, description = "Photo at the requested position", body = LightboxView),
        (status = 404, description = "Gallery is empty", body = crate::error::ApiErrorBody)
    )
)]
pub async fn lightbox(data: web::Data<AppState>, query: web::Query<LightboxQuery>) -> Result<HttpResponse, ApiError> {
    let mut photos = data.sync.photos().await?;
    let mut lb = Lightbox::new(photos.len());
    lb.open(query.index.unwrap_or(0)).ok_or(ApiError::NotFound)?;
    lb.step(query.step.unwrap_or(Step::Stay));
    let index = lb.index();
    let total = photos.len();
    let photo = photos.swap_remove(index);
    Ok(HttpResponse::Ok().json(LightboxView { index, total, photo }))
}

#[utoipa::path(get, path = "/api/v1/actions", responses((status = 200, description = "Action registry", body = [ActionInfo])))]
pub async fn list_actions() -> HttpResponse {
    HttpResponse::Ok().json(registry())
}

// serve stored photo / recording by content path
pub async fn get_file(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let path = path.into_inner();
    match data.sync.blobs().fetch(&path).await {
        Ok((bytes, mime)) => Ok(HttpResponse::Ok()
            .insert_header(("Content-Type", mime))
            .insert_header(("Cache-Control", "public, max-age=31536000, immutable"))
            .body(bytes)),
        Err(BlobStoreError::NotFound) | Err(BlobStoreError::InvalidPath(_)) => Err(ApiError::NotFound),
        Err(e) => {
            log::error!("blob fetch error: {e}");
            Err(ApiError::Internal("Error loading file. Please try again.".into()))
        }
    }
}

pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
