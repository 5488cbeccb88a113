#![cfg(feature = "inmem-store")]

use actix_web::{test, web, App};
use memories::repo::inmem::InMemRepo;
use memories::repo::{PhotoRepo, StoryRepo};
use memories::models::{NewPhoto, NewStory};
use memories::storage::FsBlobStore;
use memories::{config, pages, AppState};
use std::sync::Arc;

async fn seeded() -> (InMemRepo, tempfile::TempDir) {
    let repo = InMemRepo::ephemeral();
    for (title, category) in [("Lake days", "Childhood"), ("Sunday dinners", "Family")] {
        repo.create_story(NewStory {
            author_name: "Sarah M.".into(),
            author_avatar: None,
            title: title.into(),
            category: category.into(),
            content: "First.\n\nSecond.".into(),
        })
        .await
        .unwrap();
    }
    repo.create_photo(NewPhoto {
        author_name: "Michael R.".into(),
        author_avatar: None,
        title: "Lavender".into(),
        description: "Her garden".into(),
        category: "Nature".into(),
        image_url: "/files/photos/aa/aa11".into(),
    })
    .await
    .unwrap();
    (repo, tempfile::tempdir().unwrap())
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

macro_rules! get_html {
    ($app:expr, $uri:expr) => {{
        let resp = test::call_service(&$app, test::TestRequest::get().uri($uri).to_request()).await;
        assert!(resp.status().is_success(), "{}", $uri);
        let ct = resp.headers().get("content-type").unwrap().to_str().unwrap().to_string();
        assert!(ct.starts_with("text/html"));
        String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
    }};
}

#[actix_web::test]
async fn stories_page_filters_by_category() {
    let (repo, dir) = seeded().await;
    let app = app!(repo, dir);
    let html = get_html!(app, "/stories?filter=Family");
    assert!(html.contains(r#"id="stories-grid""#));
    assert!(html.contains(r#"<article class="story-card" data-category="Family""#));
    assert!(html.contains(r#"<article class="story-card hidden" data-category="Childhood""#));
    assert!(html.contains(r#"class="filter-button active" data-action="filter" data-filter="Family""#));
    assert!(html.contains(r#"id="story-modal""#));
}

#[actix_web::test]
async fn gallery_page_has_lightbox_contract() {
    let (repo, dir) = seeded().await;
    let app = app!(repo, dir);
    let html = get_html!(app, "/gallery");
    for id in [
        "photo-gallery",
        "lightbox",
        "lightbox-image",
        "lightbox-title",
        "lightbox-description",
        "lightbox-author-name",
        "lightbox-author-avatar",
        "lightbox-upload-date",
        "lightbox-likes",
        "lightbox-category",
        "upload-modal",
        "photo-upload",
    ] {
        assert!(html.contains(&format!(r#"id="{id}""#)), "missing #{id}");
    }
    assert!(html.contains(r#"data-category="Nature" data-index="0""#));
}

#[actix_web::test]
async fn index_and_media_pages_render() {
    let (repo, dir) = seeded().await;
    let app = app!(repo, dir);
    let index = get_html!(app, "/");
    assert!(index.contains(r#"data-counter="2""#));
    assert!(index.contains(r#"data-counter="1""#));
    let media = get_html!(app, "/media?filter=audio");
    assert!(media.contains(r#"id="media-grid""#));
}

#[actix_web::test]
async fn fragments_render_current_state() {
    let (repo, dir) = seeded().await;
    let app = app!(repo, dir);

    let lightbox = get_html!(app, "/fragments/lightbox?index=0&step=next");
    assert!(lightbox.contains(r#"<h3 id="lightbox-title">Lavender</h3>"#));

    let modal = get_html!(app, "/fragments/upload-modal?tab=audio");
    assert!(modal.contains(r#"<section id="audio-upload" class="upload-section">"#));

    let comments = get_html!(app, "/fragments/stories/1/comments");
    assert!(comments.contains(r#"id="comment-input-1""#));
    assert!(comments.contains("No comments yet."));
}

#[actix_web::test]
async fn linked_assets_are_served() {
    let (repo, dir) = seeded().await;
    let app = app!(repo, dir);
    let index = get_html!(app, "/");
    for (href, ct) in [("/static/style.css", "text/css"), ("/static/main.js", "application/javascript")] {
        assert!(index.contains(href), "page does not link {href}");
        let resp = test::call_service(&app, test::TestRequest::get().uri(href).to_request()).await;
        assert_eq!(resp.status(), 200, "{href}");
        let got = resp.headers().get("content-type").unwrap().to_str().unwrap().to_string();
        assert!(got.starts_with(ct), "{href} served as {got}");
        assert!(!test::read_body(resp).await.is_empty());
    }
    let missing = test::call_service(&app, test::TestRequest::get().uri("/static/nope.js").to_request()).await;
    assert_eq!(missing.status(), 404);
}

#[actix_web::test]
async fn open_query_renders_modal_visible() {
    let (repo, dir) = seeded().await;
    let app = app!(repo, dir);
    let html = get_html!(app, "/stories?open=story");
    assert!(html.contains(r#"<div id="story-modal" class="modal-backdrop">"#));
    let closed = get_html!(app, "/stories");
    assert!(closed.contains(r#"<div id="story-modal" class="modal-backdrop hidden">"#));
}

#[actix_web::test]
async fn client_events_render_toasts() {
    let (repo, dir) = seeded().await;
    let app = app!(repo, dir);

    let picked = get_html!(app, "/fragments/notice?event=files-selected&count=3");
    assert!(picked.contains("3 file(s) selected"));
    assert!(picked.contains("data-dismiss-after="));

    let started = get_html!(app, "/fragments/notice?event=toggle-recording&recording=false");
    assert!(started.contains("notification-info"));

    let recording = get_html!(app, "/fragments/upload-modal?tab=audio&recording=true");
    assert!(recording.contains("Stop Recording"));
    assert!(recording.contains(r#"data-recording="true""#));

    let bogus = test::call_service(&app, test::TestRequest::get().uri("/fragments/notice?event=bogus").to_request()).await;
    assert_eq!(bogus.status(), 400);
    let body: serde_json::Value = test::read_body_json(bogus).await;
    assert_eq!(body["error"], "The request could not be read.");
}
