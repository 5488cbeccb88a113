//! HTML rendering.
//!
//! Every function here is a pure transform of collection data and view
//! state into markup. Element ids and classes are the contract the client
//! binder relies on (`#stories-grid`, `#photo-gallery`, `#lightbox-*`,
//! `#comment-input-{id}` ...) and must not drift.

use chrono::{DateTime, Utc};

use crate::actions::{Action, Binding};
use crate::models::{Comment, ContentKind, Media, MediaType, ParentKind, Photo, Story};
use crate::notify::{Notice, DISMISS_AFTER};
use crate::sync::Collections;
use crate::view::{
    apply_filter, tags, CardState, CounterAnimation, Filter, FilterBar, Lightbox, ModalId, Modals, Playback, Recorder,
    UploadTab, Visibility,
};

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// "Just now", "5 minutes ago", "1 hour ago", "3 days ago", then a date.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 60 {
        return "Just now".to_string();
    }
    let ago = |n: i64, unit: &str| format!("{n} {unit}{} ago", if n == 1 { "" } else { "s" });
    let minutes = secs / 60;
    if minutes < 60 {
        return ago(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return ago(hours, "hour");
    }
    let days = hours / 24;
    if days < 7 {
        return ago(days, "day");
    }
    then.format("%b %-d, %Y").to_string()
}

fn video_id(raw: &str) -> Option<&str> {
    let id = raw.split(['?', '&', '#', '/']).next()?;
    let ok = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    ok.then_some(id)
}

/// Rewrites YouTube and Vimeo page links to their embeddable player URL.
/// Anything else is returned unchanged.
pub fn embed_url(url: &str) -> String {
    let url = url.trim();
    let bare = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_start_matches("m.");

    if let Some(query) = bare.strip_prefix("youtube.com/watch?") {
        let id = query.split('&').find_map(|kv| kv.strip_prefix("v=")).and_then(video_id);
        if let Some(id) = id {
            return format!("https://www.youtube.com/embed/{id}");
        }
    }
    for prefix in ["youtu.be/", "youtube.com/shorts/"] {
        if let Some(id) = bare.strip_prefix(prefix).and_then(video_id) {
            return format!("https://www.youtube.com/embed/{id}");
        }
    }
    if let Some(id) = bare.strip_prefix("vimeo.com/").and_then(video_id) {
        if id.chars().all(|c| c.is_ascii_digit()) {
            return format!("https://player.vimeo.com/video/{id}");
        }
    }
    url.to_string()
}

/// Hosts of the players `embed_url` produces.
pub const EMBED_ORIGINS: [&str; 2] = ["https://www.youtube.com", "https://player.vimeo.com"];

pub fn is_embed(url: &str) -> bool {
    url.starts_with("https://www.youtube.com/embed/") || url.starts_with("https://player.vimeo.com/video/")
}

pub fn paragraphs(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

fn hidden_class(v: Visibility) -> &'static str {
    if v.is_shown() { "" } else { " hidden" }
}

fn avatar(url: Option<&str>, name: &str, class: &str) -> String {
    match url {
        Some(u) => format!(r#"<img class="{class}" src="{}" alt="{}">"#, html_escape(u), html_escape(name)),
        None => {
            let initial: String = name.chars().next().map(|c| c.to_uppercase().collect::<String>()).unwrap_or_default();
            format!(r#"<span class="{class} avatar-initial">{}</span>"#, html_escape(&initial))
        }
    }
}

fn like_button(kind: ContentKind, id: i64, likes: i64, liked: bool) -> String {
    format!(
        r#"<button class="like-button{}" {}><span id="likes-{}-{id}">{likes}</span></button>"#,
        if liked { " liked" } else { "" },
        Binding::like(kind, id).attrs(),
        kind.as_str(),
    )
}

// ---------------- Filters ----------------

pub fn filter_bar(bar: &FilterBar) -> String {
    let mut out = String::from(r#"<div class="filter-bar">"#);
    for (filter, active) in bar.options() {
        let label = match filter {
            Filter::All => "All".to_string(),
            Filter::Only(f) => f.clone(),
        };
        out.push_str(&format!(
            r#"<button class="filter-button{}" {}>{}</button>"#,
            if active { " active" } else { "" },
            Action::Filter.bind().arg("filter", filter.as_str()).attrs(),
            html_escape(&label),
        ));
    }
    out.push_str("</div>");
    out
}

fn bar_for<T: crate::view::Tagged>(items: &[T], filter: &Filter) -> FilterBar {
    let mut bar = FilterBar::new(tags(items));
    bar.select(filter.clone());
    bar
}

// ---------------- Stories ----------------

pub fn comment_list(comments: &[Comment], now: DateTime<Utc>) -> String {
    if comments.is_empty() {
        return r#"<p class="no-comments">No comments yet.</p>"#.to_string();
    }
    let mut out = String::new();
    for c in comments {
        out.push_str(&format!(
            r#"<div class="comment" data-comment-id="{}"><span class="comment-author">{}</span><span class="comment-time">{}</span><p class="comment-text">{}</p></div>"#,
            c.id,
            html_escape(&c.author_name),
            time_ago(c.created_at, now),
            html_escape(&c.text),
        ));
    }
    out
}

/// Comments panel for a story or photo. `comments` is `None` until loaded.
pub fn comments_section(parent: ParentKind, id: i64, comments: Option<&[Comment]>, open: bool, now: DateTime<Utc>) -> String {
    let list = comments.map(|c| comment_list(c, now)).unwrap_or_default();
    format!(
        r#"<div class="comments-section{hidden}" id="comments-{id}">
    <div class="comments-list" id="comments-list-{id}">{list}</div>
    <form class="comment-form" {bind}>
        <input type="text" id="comment-author-{id}" name="author_name" placeholder="Your name (optional)">
        <input type="text" id="comment-input-{id}" name="text" placeholder="Share a kind word..." required>
        <button type="submit">Post</button>
    </form>
</div>"#,
        hidden = if open { "" } else { " hidden" },
        bind = Binding::comment(parent, id).attrs(),
    )
}

pub fn story_card(story: &Story, visibility: Visibility, card: CardState, comments: Option<&[Comment]>, now: DateTime<Utc>) -> String {
    let body: String = paragraphs(&story.content)
        .into_iter()
        .map(|p| format!("<p>{}</p>", html_escape(p)))
        .collect();
    format!(
        r#"<article class="story-card{hidden}" data-category="{category}" data-story-id="{id}">
    <header class="story-header">
        {avatar}
        <div>
            <span class="story-author">{author}</span>
            <span class="story-time">{when}</span>
        </div>
        <span class="story-category">{category}</span>
    </header>
    <h3 class="story-title">{title}</h3>
    <div class="story-content{expanded}">{body}</div>
    <button class="read-more" {toggle}>{label}</button>
    <footer class="story-actions">
        {like}
        <button class="comment-toggle" {comments_toggle}><span id="comment-count-{id}">{comment_count}</span></button>
    </footer>
    {comments}
</article>"#,
        hidden = hidden_class(visibility),
        category = html_escape(&story.category),
        id = story.id,
        avatar = avatar(story.author_avatar.as_deref(), &story.author_name, "story-avatar"),
        author = html_escape(&story.author_name),
        when = time_ago(story.created_at, now),
        title = html_escape(&story.title),
        expanded = if card.expanded { " expanded" } else { "" },
        toggle = Action::ToggleStory.bind().arg("id", story.id).attrs(),
        label = card.read_more_label(),
        like = like_button(ContentKind::Story, story.id, story.likes, card.liked),
        comments_toggle = Action::ToggleComments.bind().arg("id", story.id).attrs(),
        comment_count = story.comment_count,
        comments = comments_section(ParentKind::Story, story.id, comments, card.comments_open, now),
    )
}

pub fn stories_grid(stories: &[Story], filter: &Filter, now: DateTime<Utc>) -> String {
    if stories.is_empty() {
        return r#"<div id="stories-grid" data-items><p class="empty">No stories yet. Be the first to share one.</p></div>"#.to_string();
    }
    let cards: String = stories
        .iter()
        .zip(apply_filter(stories, filter))
        .map(|(s, v)| story_card(s, v, CardState::default(), None, now))
        .collect();
    format!(r#"<div id="stories-grid" data-items>{cards}</div>"#)
}

// ---------------- Gallery ----------------

pub fn photo_card(photo: &Photo, index: usize, visibility: Visibility, now: DateTime<Utc>) -> String {
    format!(
        r#"<div class="photo-card{hidden}" data-category="{category}" data-index="{index}" data-photo-id="{id}">
    <img src="{src}" alt="{title}" loading="lazy" {open}>
    <div class="photo-info">
        <h4 class="photo-title">{title}</h4>
        <div class="photo-meta">{avatar}<span class="photo-author">{author}</span><span class="photo-time">{when}</span></div>
        {like}
    </div>
</div>"#,
        hidden = hidden_class(visibility),
        category = html_escape(&photo.category),
        id = photo.id,
        src = html_escape(&photo.image_url),
        title = html_escape(&photo.title),
        open = Action::OpenLightbox.bind().arg("index", index).attrs(),
        avatar = avatar(photo.author_avatar.as_deref(), &photo.author_name, "photo-avatar"),
        author = html_escape(&photo.author_name),
        when = time_ago(photo.created_at, now),
        like = like_button(ContentKind::Photo, photo.id, photo.likes, false),
    )
}

pub fn photo_gallery(photos: &[Photo], filter: &Filter, now: DateTime<Utc>) -> String {
    if photos.is_empty() {
        return r#"<div id="photo-gallery" class="masonry" data-items><p class="empty">No photos yet.</p></div>"#.to_string();
    }
    let cards: String = photos
        .iter()
        .zip(apply_filter(photos, filter))
        .enumerate()
        .map(|(i, (p, v))| photo_card(p, i, v, now))
        .collect();
    format!(r#"<div id="photo-gallery" class="masonry" data-items>{cards}</div>"#)
}

/// Lightbox overlay showing the photo at the lightbox's current index.
pub fn lightbox(photos: &[Photo], lb: &Lightbox, now: DateTime<Utc>) -> String {
    let photo = photos.get(lb.index()).filter(|_| lb.is_open());
    let field = |f: fn(&Photo) -> String| photo.map(f).unwrap_or_default();
    let avatar_src = photo.and_then(|p| p.author_avatar.clone()).unwrap_or_default();
    format!(
        r#"<div id="lightbox" class="lightbox{hidden}" data-index="{index}" {close}>
    <div class="lightbox-content">
        <button class="lightbox-close" {close}>&times;</button>
        <button class="lightbox-prev" {prev}>&lsaquo;</button>
        <img id="lightbox-image" src="{src}" alt="{title}">
        <button class="lightbox-next" {next}>&rsaquo;</button>
        <div class="lightbox-details">
            <h3 id="lightbox-title">{title}</h3>
            <p id="lightbox-description">{description}</p>
            <div class="lightbox-author">
                <img id="lightbox-author-avatar" src="{avatar}" alt="">
                <span id="lightbox-author-name">{author}</span>
                <span id="lightbox-upload-date">{when}</span>
            </div>
            <span id="lightbox-likes">{likes}</span>
            <span id="lightbox-category">{category}</span>
        </div>
    </div>
</div>"#,
        hidden = if photo.is_some() { "" } else { " hidden" },
        index = lb.index(),
        close = Action::CloseLightbox.bind().attrs(),
        prev = Action::PreviousPhoto.bind().attrs(),
        next = Action::NextPhoto.bind().attrs(),
        src = field(|p| html_escape(&p.image_url)),
        title = field(|p| html_escape(&p.title)),
        description = field(|p| html_escape(&p.description)),
        avatar = html_escape(&avatar_src),
        author = field(|p| html_escape(&p.author_name)),
        when = photo.map(|p| time_ago(p.created_at, now)).unwrap_or_default(),
        likes = field(|p| p.likes.to_string()),
        category = field(|p| html_escape(&p.category)),
    )
}

// ---------------- Media ----------------

fn audio_player(media: &Media, index: usize, playback: &Playback) -> String {
    let playing = playback.is_playing(index);
    format!(
        r#"<div class="audio-player" data-player="{index}">
        <button class="play-button{playing}" {toggle}><svg viewBox="0 0 20 20"><path d="{icon}"></path></svg></button>
        <div class="waveform"></div>
        <audio preload="none" src="{src}"></audio>
    </div>"#,
        playing = if playing { " playing" } else { "" },
        toggle = Action::ToggleAudio.bind().arg("player", index).attrs(),
        icon = playback.icon_path(index),
        src = html_escape(&media.media_url),
    )
}

fn video_player(media: &Media) -> String {
    let src = html_escape(&media.media_url);
    if is_embed(&media.media_url) {
        format!(
            r#"<div class="video-player"><iframe src="{src}" title="{}" allow="autoplay; encrypted-media; picture-in-picture" allowfullscreen loading="lazy"></iframe></div>"#,
            html_escape(&media.title)
        )
    } else {
        format!(
            r#"<div class="video-player"><video controls preload="metadata" src="{src}"></video><button class="video-play" {}></button></div>"#,
            Action::PlayVideo.bind().arg("id", media.id).attrs()
        )
    }
}

pub fn media_card(media: &Media, index: usize, visibility: Visibility, playback: &Playback, now: DateTime<Utc>) -> String {
    let player = match media.media_type {
        MediaType::Audio => audio_player(media, index, playback),
        MediaType::Video => video_player(media),
    };
    format!(
        r#"<div class="media-card{hidden}" data-type="{kind}" data-media-id="{id}">
    {player}
    <div class="media-info">
        <h4 class="media-title">{title}</h4>
        <p class="media-description">{description}</p>
        <div class="media-meta">{avatar}<span class="media-author">{author}</span><span class="media-time">{when}</span></div>
        {like}
    </div>
</div>"#,
        hidden = hidden_class(visibility),
        kind = media.media_type.as_str(),
        id = media.id,
        title = html_escape(&media.title),
        description = html_escape(&media.description),
        avatar = avatar(media.author_avatar.as_deref(), &media.author_name, "media-avatar"),
        author = html_escape(&media.author_name),
        when = time_ago(media.created_at, now),
        like = like_button(ContentKind::Media, media.id, media.likes, false),
    )
}

pub fn media_grid(media: &[Media], filter: &Filter, playback: &Playback, now: DateTime<Utc>) -> String {
    if media.is_empty() {
        return r#"<div id="media-grid" data-items><p class="empty">No recordings or videos yet.</p></div>"#.to_string();
    }
    let cards: String = media
        .iter()
        .zip(apply_filter(media, filter))
        .enumerate()
        .map(|(i, (m, v))| media_card(m, i, v, playback, now))
        .collect();
    format!(r#"<div id="media-grid" data-items>{cards}</div>"#)
}

// ---------------- Shared pieces ----------------

pub fn stats(collections: &Collections) -> String {
    let counters = [
        ("Stories shared", collections.stories.len()),
        ("Photos", collections.photos.len()),
        ("Recordings & videos", collections.media.len()),
    ];
    let mut out = String::from(r#"<div class="stats">"#);
    for (label, n) in counters {
        let anim = CounterAnimation::new(n as u64);
        out.push_str(&format!(
            r#"<div class="stat"><span class="stat-value" data-counter="{}" data-duration="{}">0</span><span class="stat-label">{label}</span></div>"#,
            anim.target,
            anim.duration.as_millis(),
        ));
    }
    out.push_str("</div>");
    out
}

pub fn toast(notice: &Notice) -> String {
    format!(
        r#"<div class="notification notification-{}" role="status" data-dismiss-after="{}">{}</div>"#,
        notice.level.as_str(),
        DISMISS_AFTER.as_millis(),
        html_escape(&notice.message),
    )
}

fn modal_class(modals: &Modals, id: ModalId) -> &'static str {
    if modals.is_open(id) { "modal-backdrop" } else { "modal-backdrop hidden" }
}

pub fn story_modal(modals: &Modals) -> String {
    format!(
        r#"<div id="story-modal" class="{class}">
    <div class="bg-white modal-panel">
        <button class="modal-close" {close}>&times;</button>
        <h2>Share a Story</h2>
        <form id="story-form" {submit}>
            <input type="text" id="author-name" name="author_name" placeholder="Your name" required>
            <input type="text" id="story-title" name="title" placeholder="Title" required>
            <select id="story-category" name="category">
                <option>General</option><option>Childhood</option><option>Family</option><option>Friendship</option><option>Adventures</option>
            </select>
            <textarea id="story-content" name="content" rows="8" placeholder="Your memory..." required></textarea>
            <button type="submit">Share Story</button>
        </form>
    </div>
</div>"#,
        class = modal_class(modals, ModalId::Story),
        close = Action::CloseStoryModal.bind().attrs(),
        submit = Action::SubmitStory.bind().attrs(),
    )
}

pub fn upload_modal(active: UploadTab, modals: &Modals, recorder: &Recorder) -> String {
    let mut tabs = String::new();
    let mut sections = String::new();
    for tab in UploadTab::ALL {
        let on = tab == active;
        tabs.push_str(&format!(
            r#"<button class="tab-button{}" data-upload-tab="{}" {}>{}</button>"#,
            if on { " active" } else { "" },
            tab.as_str(),
            Action::UploadTab.bind().arg("tab", tab.as_str()).attrs(),
            tab.as_str(),
        ));
        let (bind, accept, extra) = match tab {
            UploadTab::Photo => (
                Action::UploadPhoto.bind(),
                "image/*",
                r#"<input type="text" name="category" placeholder="Category"><input type="url" name="image_url" placeholder="...or paste an image link">"#.to_string(),
            ),
            UploadTab::Audio => (
                Action::UploadMedia.bind().arg("type", "audio"),
                "audio/*",
                format!(
                    r#"<input type="hidden" name="media_type" value="audio"><button type="button" id="record-button" class="record-button{on}" data-recording="{state}" {bind}>{label}</button><span class="recording-indicator{hidden}"></span>"#,
                    on = if recorder.is_recording() { " recording" } else { "" },
                    state = recorder.is_recording(),
                    bind = Action::ToggleRecording.bind().attrs(),
                    label = recorder.button_label(),
                    hidden = if recorder.is_recording() { "" } else { " hidden" },
                ),
            ),
            UploadTab::Video => (
                Action::UploadMedia.bind().arg("type", "video"),
                "video/*",
                r#"<input type="hidden" name="media_type" value="video"><input type="url" name="media_url" placeholder="...or paste a YouTube or Vimeo link">"#.to_string(),
            ),
        };
        sections.push_str(&format!(
            r#"<section id="{id}" class="upload-section{hidden}">
        <form {bind} enctype="multipart/form-data">
            <input type="text" name="author_name" placeholder="Your name" required>
            <input type="text" name="title" placeholder="Title" required>
            <textarea name="description" placeholder="Description"></textarea>
            <div class="upload-area"><input type="file" name="file" accept="{accept}"></div>
            {extra}
            <button type="submit">Upload</button>
        </form>
    </section>"#,
            id = tab.section_id(),
            hidden = if on { "" } else { " hidden" },
            bind = bind.attrs(),
        ));
    }
    format!(
        r#"<div id="upload-modal" class="{class}">
    <div class="bg-white modal-panel">
        <button class="modal-close" {close}>&times;</button>
        <div class="upload-tabs">{tabs}</div>
        {sections}
    </div>
</div>"#,
        class = modal_class(modals, ModalId::Upload),
        close = Action::CloseUploadModal.bind().attrs(),
    )
}

// ---------------- Pages ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Index,
    Stories,
    Gallery,
    Media,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Index, Page::Stories, Page::Gallery, Page::Media];

    pub fn path(&self) -> &'static str {
        match self {
            Page::Index => "/",
            Page::Stories => "/stories",
            Page::Gallery => "/gallery",
            Page::Media => "/media",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Index => "Home",
            Page::Stories => "Stories",
            Page::Gallery => "Gallery",
            Page::Media => "Voices & Videos",
        }
    }
}

pub fn layout(page: Page, body: &str) -> String {
    let nav: String = Page::ALL
        .iter()
        .map(|p| {
            format!(
                r#"<a href="{}" class="nav-link{}">{}</a>"#,
                p.path(),
                if *p == page { " active" } else { "" },
                p.title()
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Memories of Friends</title>
    <link rel="stylesheet" href="{stylesheet}">
</head>
<body data-page="{page}">
    <nav class="site-nav"><a href="/" class="logo">Memories of Friends</a>{nav}</nav>
    <main>
{body}
    </main>
    <div id="notifications"></div>
    <script src="{script}" defer></script>
</body>
</html>"#,
        title = page.title(),
        page = page.title().to_ascii_lowercase(),
        stylesheet = crate::assets::STYLESHEET,
        script = crate::assets::SCRIPT,
    )
}

/// Places toasts in the page's notification area, oldest first.
pub fn with_notices(page: &str, notices: &[&Notice]) -> String {
    let toasts: String = notices.iter().map(|n| toast(n)).collect();
    page.replacen(
        r#"<div id="notifications"></div>"#,
        &format!(r#"<div id="notifications">{toasts}</div>"#),
        1,
    )
}

pub fn index_page(collections: &Collections, modals: &Modals, now: DateTime<Utc>) -> String {
    let recent: String = collections
        .stories
        .iter()
        .take(3)
        .map(|s| {
            format!(
                r#"<div class="memory-card recent-memory"><h4>{}</h4><span>{}</span><span>{}</span></div>"#,
                html_escape(&s.title),
                html_escape(&s.author_name),
                time_ago(s.created_at, now)
            )
        })
        .collect();
    let body = format!(
        r#"<section class="hero-bg" id="hero">
    <div id="particles"></div>
    <div class="content-layer">
        <h1 id="hero-text">Where love, laughter, and stories stay alive</h1>
        <div><button {story}>Share a Story</button><button {scroll}>Explore Memories</button></div>
    </div>
</section>
<section id="memories">
    {stats}
    <div id="memory-carousel">{recent}</div>
</section>
{modal}"#,
        story = Action::OpenStoryModal.bind().attrs(),
        scroll = Action::ScrollTo.bind().arg("target", "memories").attrs(),
        stats = stats(collections),
        modal = story_modal(modals),
    );
    layout(Page::Index, &body)
}

pub fn stories_page(collections: &Collections, filter: &Filter, modals: &Modals, now: DateTime<Utc>) -> String {
    let body = format!(
        r#"<section class="page-header"><h1>Stories</h1><button {open}>Share a Story</button>{bar}</section>
<section>{grid}</section>
{modal}"#,
        open = Action::OpenStoryModal.bind().attrs(),
        bar = filter_bar(&bar_for(&collections.stories, filter)),
        grid = stories_grid(&collections.stories, filter, now),
        modal = story_modal(modals),
    );
    layout(Page::Stories, &body)
}

pub fn gallery_page(collections: &Collections, filter: &Filter, modals: &Modals, now: DateTime<Utc>) -> String {
    let body = format!(
        r#"<section class="page-header"><h1>Gallery</h1><button {open}>Upload Photos</button>{bar}</section>
<section>{gallery}</section>
{lightbox}
{modal}"#,
        open = Action::OpenUploadModal.bind().arg("tab", "photo").attrs(),
        bar = filter_bar(&bar_for(&collections.photos, filter)),
        gallery = photo_gallery(&collections.photos, filter, now),
        lightbox = lightbox(&collections.photos, &Lightbox::new(collections.photos.len()), now),
        modal = upload_modal(UploadTab::Photo, modals, &Recorder::default()),
    );
    layout(Page::Gallery, &body)
}

pub fn media_page(collections: &Collections, filter: &Filter, modals: &Modals, now: DateTime<Utc>) -> String {
    let mut bar = FilterBar::new([MediaType::Audio, MediaType::Video].map(|t| t.as_str().to_string()));
    bar.select(filter.clone());
    let body = format!(
        r#"<section class="page-header"><h1>Voices &amp; Videos</h1><button {open}>Upload Media</button>{bar}</section>
<section>{grid}</section>
{modal}"#,
        open = Action::OpenUploadModal.bind().arg("tab", "audio").attrs(),
        bar = filter_bar(&bar),
        grid = media_grid(&collections.media, filter, &Playback::default(), now),
        modal = upload_modal(UploadTab::Audio, modals, &Recorder::default()),
    );
    layout(Page::Media, &body)
}
