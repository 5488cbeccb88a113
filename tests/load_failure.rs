#![cfg(feature = "inmem-store")]

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use memories::models::*;
use memories::repo::inmem::InMemRepo;
use memories::repo::{CommentRepo, LikeRepo, MediaRepo, PhotoRepo, RepoError, RepoResult, StoryRepo};
use memories::storage::FsBlobStore;
use memories::{config, pages, AppState};
use std::sync::Arc;

/// In-memory store whose photo listing always fails.
struct BrokenPhotos(InMemRepo);

#[async_trait]
impl StoryRepo for BrokenPhotos {
    async fn list_stories(&self) -> RepoResult<Vec<Story>> { self.0.list_stories().await }
    async fn create_story(&self, new: NewStory) -> RepoResult<Story> { self.0.create_story(new).await }
    async fn get_story(&self, id: Id) -> RepoResult<Story> { self.0.get_story(id).await }
}

#[async_trait]
impl PhotoRepo for BrokenPhotos {
    async fn list_photos(&self) -> RepoResult<Vec<Photo>> {
        Err(RepoError::Internal("connection reset".into()))
    }
    async fn create_photo(&self, new: NewPhoto) -> RepoResult<Photo> { self.0.create_photo(new).await }
    async fn get_photo(&self, id: Id) -> RepoResult<Photo> { self.0.get_photo(id).await }
}

#[async_trait]
impl MediaRepo for BrokenPhotos {
    async fn list_media(&self) -> RepoResult<Vec<Media>> { self.0.list_media().await }
    async fn create_media(&self, new: NewMedia) -> RepoResult<Media> { self.0.create_media(new).await }
    async fn get_media(&self, id: Id) -> RepoResult<Media> { self.0.get_media(id).await }
}

#[async_trait]
impl LikeRepo for BrokenPhotos {
    async fn increment_likes(&self, kind: ContentKind, id: Id) -> RepoResult<i64> { self.0.increment_likes(kind, id).await }
}

#[async_trait]
impl CommentRepo for BrokenPhotos {
    async fn list_comments(&self, parent: ParentKind, parent_id: Id) -> RepoResult<Vec<Comment>> {
        self.0.list_comments(parent, parent_id).await
    }
    async fn create_comment(&self, new: NewComment) -> RepoResult<Comment> { self.0.create_comment(new).await }
}

async fn broken() -> (BrokenPhotos, tempfile::TempDir) {
    let repo = InMemRepo::ephemeral();
    repo.create_story(NewStory {
        author_name: "Sarah M.".into(),
        author_avatar: None,
        title: "Lake days".into(),
        category: "Childhood".into(),
        content: "Summers.".into(),
    })
    .await
    .unwrap();
    (BrokenPhotos(repo), tempfile::tempdir().unwrap())
}

macro_rules! app {
    ($repo:expr, $dir:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(
                    Arc::new($repo),
                    Arc::new(FsBlobStore::new($dir.path(), "/files")),
                )))
                .configure(config)
                .configure(pages::config),
        )
        .await
    };
}

#[actix_web::test]
async fn one_failed_read_fails_the_whole_load() {
    let (repo, dir) = broken().await;
    let app = app!(repo, dir);

    let req = test::TestRequest::get().uri("/api/v1/collections").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Error loading memories. Please try again.");

    let req = test::TestRequest::get().uri("/api/v1/photos").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Error loading photos. Please try again.");

    // reads that do not touch photos are unaffected
    let req = test::TestRequest::get().uri("/api/v1/stories").to_request();
    let stories: Vec<Story> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stories.len(), 1);
}

#[actix_web::test]
async fn page_shell_renders_with_error_toast() {
    let (repo, dir) = broken().await;
    let app = app!(repo, dir);

    let req = test::TestRequest::get().uri("/stories").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("notification-error"));
    assert!(html.contains("Error loading memories. Please try again."));
    assert!(html.contains(r#"id="stories-grid""#));
    // the failed load renders empty collections, not a partial one
    assert!(!html.contains("Lake days"));
}
