//! Server-rendered pages and the fragments the client swaps in after a
//! write or a filter change.

use std::time::Instant;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::error::ApiError;
use crate::models::{Id, ParentKind};
use crate::notify::{Notice, NotificationQueue};
use crate::render;
use crate::routes::AppState;
use crate::sync::Collections;
use crate::view::{Filter, Lightbox, ModalId, Modals, Playback, Recorder, Step, UploadTab, VIDEO_PLAY_NOTICE};

pub fn config(cfg: &mut web::ServiceConfig) {
    crate::assets::config(cfg);
    cfg.route("/", web::get().to(index))
        .route("/stories", web::get().to(stories))
        .route("/gallery", web::get().to(gallery))
        .route("/media", web::get().to(media));
    cfg.service(
        web::scope("/fragments")
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                warn!(error = %err, "rejected fragment query");
                ApiError::BadRequest("The request could not be read.".into()).into()
            }))
            .route("/stories", web::get().to(stories_fragment))
            .route("/gallery", web::get().to(gallery_fragment))
            .route("/media", web::get().to(media_fragment))
            .route("/lightbox", web::get().to(lightbox_fragment))
            .route("/stats", web::get().to(stats_fragment))
            .route("/upload-modal", web::get().to(upload_modal_fragment))
            .route("/notice", web::get().to(notice_fragment))
            .route("/{kind}/{id}/comments", web::get().to(comments_fragment)),
    );
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub filter: Option<String>,
    /// Modal to render open, e.g. `?open=story` from a "Share a Story" link.
    pub open: Option<String>,
    /// Index of the audio player currently playing, if any.
    pub playing: Option<usize>,
}

impl PageQuery {
    /// An empty `?filter=` is treated as no filter.
    fn filter(&self) -> Filter {
        self.filter.as_deref().filter(|f| !f.is_empty()).map(Filter::parse).unwrap_or_default()
    }

    fn modals(&self) -> Modals {
        let mut modals = Modals::default();
        if let Some(id) = self.open.as_deref().and_then(ModalId::parse) {
            modals.open(id);
        }
        modals
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LightboxFragmentQuery {
    pub index: Option<usize>,
    pub step: Option<Step>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadModalQuery {
    pub tab: Option<String>,
    #[serde(default)]
    pub recording: bool,
}

/// Client-side events that raise a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeEvent {
    FilesSelected,
    ToggleRecording,
    PlayVideo,
}

#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub event: NoticeEvent,
    #[serde(default)]
    pub count: usize,
    /// Recorder state before the toggle.
    #[serde(default)]
    pub recording: bool,
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
}

/// Renders a full page. A failed load still renders the shell, with empty
/// collections and an error toast.
async fn page(data: &AppState, render_page: impl FnOnce(&Collections) -> String) -> HttpResponse {
    match data.sync.load_all().await {
        Ok(all) => html(render_page(&all)),
        Err(e) => {
            warn!(error = %e, "page rendered without data");
            crate::telemetry::record_failure("loading memories");
            let body = render_page(&Collections::default());
            let now = Instant::now();
            let mut queue = NotificationQueue::new();
            queue.push(Notice::error(e.user_message()), now);
            html(render::with_notices(&body, &queue.visible(now)))
        }
    }
}

pub async fn index(data: web::Data<AppState>, q: web::Query<PageQuery>) -> HttpResponse {
    let modals = q.modals();
    page(&data, |all| render::index_page(all, &modals, Utc::now())).await
}

pub async fn stories(data: web::Data<AppState>, q: web::Query<PageQuery>) -> HttpResponse {
    let (filter, modals) = (q.filter(), q.modals());
    page(&data, |all| render::stories_page(all, &filter, &modals, Utc::now())).await
}

pub async fn gallery(data: web::Data<AppState>, q: web::Query<PageQuery>) -> HttpResponse {
    let (filter, modals) = (q.filter(), q.modals());
    page(&data, |all| render::gallery_page(all, &filter, &modals, Utc::now())).await
}

pub async fn media(data: web::Data<AppState>, q: web::Query<PageQuery>) -> HttpResponse {
    let (filter, modals) = (q.filter(), q.modals());
    page(&data, |all| render::media_page(all, &filter, &modals, Utc::now())).await
}

pub async fn stories_fragment(data: web::Data<AppState>, q: web::Query<PageQuery>) -> Result<HttpResponse, ApiError> {
    let stories = data.sync.stories().await?;
    Ok(html(render::stories_grid(&stories, &q.filter(), Utc::now())))
}

pub async fn gallery_fragment(data: web::Data<AppState>, q: web::Query<PageQuery>) -> Result<HttpResponse, ApiError> {
    let photos = data.sync.photos().await?;
    Ok(html(render::photo_gallery(&photos, &q.filter(), Utc::now())))
}

pub async fn media_fragment(data: web::Data<AppState>, q: web::Query<PageQuery>) -> Result<HttpResponse, ApiError> {
    let media = data.sync.media().await?;
    let mut playback = Playback::default();
    if let Some(p) = q.playing.filter(|p| *p < media.len()) {
        playback.toggle(p);
    }
    Ok(html(render::media_grid(&media, &q.filter(), &playback, Utc::now())))
}

pub async fn lightbox_fragment(data: web::Data<AppState>, q: web::Query<LightboxFragmentQuery>) -> Result<HttpResponse, ApiError> {
    let photos = data.sync.photos().await?;
    let mut lb = Lightbox::new(photos.len());
    if let Some(i) = q.index {
        lb.open(i);
        lb.step(q.step.unwrap_or(Step::Stay));
    }
    Ok(html(render::lightbox(&photos, &lb, Utc::now())))
}

pub async fn stats_fragment(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let all = data.sync.load_all().await?;
    Ok(html(render::stats(&all)))
}

/// The upload modal, rendered open on the requested tab.
pub async fn upload_modal_fragment(q: web::Query<UploadModalQuery>) -> HttpResponse {
    let tab = q.tab.as_deref().and_then(UploadTab::parse).unwrap_or_default();
    let mut modals = Modals::default();
    modals.open(ModalId::Upload);
    html(render::upload_modal(tab, &modals, &Recorder::with_state(q.recording)))
}

pub async fn notice_fragment(q: web::Query<NoticeQuery>) -> HttpResponse {
    let notice = match q.event {
        NoticeEvent::FilesSelected => Notice::files_selected(q.count),
        NoticeEvent::ToggleRecording => Notice::info(Recorder::with_state(q.recording).toggle()),
        NoticeEvent::PlayVideo => Notice::info(VIDEO_PLAY_NOTICE),
    };
    html(render::toast(&notice))
}

pub async fn comments_fragment(data: web::Data<AppState>, path: web::Path<(String, Id)>) -> Result<HttpResponse, ApiError> {
    let (kind, id) = path.into_inner();
    let parent = ParentKind::from_collection(&kind).ok_or(ApiError::NotFound)?;
    let comments = data.sync.comments(parent, id).await?;
    Ok(html(render::comments_section(parent, id, Some(&comments), true, Utc::now())))
}
