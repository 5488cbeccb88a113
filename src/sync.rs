//! Data sync layer: loads the three collections, records likes and comments,
//! accepts submissions and uploads, and reloads after every write.

use std::sync::Arc;

use futures_util::try_join;
use tracing::{error, info};

use crate::models::*;
use crate::repo::{Repo, RepoError};
use crate::storage::{content_path, BlobStore, BlobStoreError};
use crate::telemetry;

/// Request-scoped copy of every collection, newest first.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct Collections {
    pub stories: Vec<Story>,
    pub photos: Vec<Photo>,
    pub media: Vec<Media>,
}

impl Collections {
    pub fn total(&self) -> usize {
        self.stories.len() + self.photos.len() + self.media.len()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// Shallow presence check failed; the message is shown to the visitor.
    #[error("{0}")]
    Invalid(&'static str),
    #[error("not found")]
    NotFound,
    #[error("store failure while {during}: {source}")]
    Store { during: &'static str, source: RepoError },
    #[error("blob failure while {during}: {source}")]
    Blob { during: &'static str, source: BlobStoreError },
}

impl SyncError {
    fn store(during: &'static str) -> impl FnOnce(RepoError) -> SyncError {
        move |source| match source {
            RepoError::NotFound => SyncError::NotFound,
            source => SyncError::Store { during, source },
        }
    }

    /// Toast text for the visitor.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Invalid(msg) => (*msg).to_string(),
            SyncError::NotFound => "That memory could not be found.".to_string(),
            SyncError::Store { during, .. } | SyncError::Blob { during, .. } => {
                format!("Error {during}. Please try again.")
            }
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct StoryInput {
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub category: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
pub struct PhotoInput {
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Used when no file is attached.
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
pub struct MediaInput {
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub media_type: Option<String>,
    /// Used when no file is attached.
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct CommentInput {
    pub author_name: Option<String>,
    pub text: String,
}

pub const MISSING_FIELDS: &str = "Please fill in all required fields.";
const MEDIA_TYPE_MISMATCH: &str = "The file does not match the chosen media type.";

fn required(v: &str) -> SyncResult<String> {
    let t = v.trim();
    if t.is_empty() { Err(SyncError::Invalid(MISSING_FIELDS)) } else { Ok(t.to_string()) }
}

fn optional(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[derive(Clone)]
pub struct SyncService {
    repo: Arc<dyn Repo>,
    blobs: Arc<dyn BlobStore>,
}

impl SyncService {
    pub fn new(repo: Arc<dyn Repo>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { repo, blobs }
    }

    /// Issues the three reads together. Any failure fails the whole load.
    pub async fn load_all(&self) -> SyncResult<Collections> {
        let during = "loading memories";
        let (stories, photos, media) = try_join!(
            self.repo.list_stories(),
            self.repo.list_photos(),
            self.repo.list_media(),
        )
        .map_err(|source| {
            error!(error = %source, "collection load failed");
            SyncError::Store { during, source }
        })?;
        Ok(Collections { stories, photos, media })
    }

    pub async fn stories(&self) -> SyncResult<Vec<Story>> {
        self.repo.list_stories().await.map_err(SyncError::store("loading stories"))
    }

    pub async fn photos(&self) -> SyncResult<Vec<Photo>> {
        self.repo.list_photos().await.map_err(SyncError::store("loading photos"))
    }

    pub async fn media(&self) -> SyncResult<Vec<Media>> {
        self.repo.list_media().await.map_err(SyncError::store("loading media"))
    }

    pub async fn like(&self, kind: ContentKind, id: Id) -> SyncResult<i64> {
        let likes = self
            .repo
            .increment_likes(kind, id)
            .await
            .map_err(SyncError::store("saving your like"))?;
        telemetry::record_like(kind);
        Ok(likes)
    }

    pub async fn comments(&self, parent: ParentKind, parent_id: Id) -> SyncResult<Vec<Comment>> {
        self.repo
            .list_comments(parent, parent_id)
            .await
            .map_err(SyncError::store("loading comments"))
    }

    /// Rejects blank text before touching the store, then returns the
    /// reloaded comment list for the parent.
    pub async fn add_comment(&self, parent: ParentKind, parent_id: Id, input: CommentInput) -> SyncResult<Vec<Comment>> {
        let text = input.text.trim();
        if text.is_empty() {
            return Err(SyncError::Invalid("Please write a comment before posting."));
        }
        let author_name = optional(input.author_name).unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());
        let during = "posting your comment";
        self.repo
            .create_comment(NewComment {
                content_id: parent_id,
                content_type: parent,
                author_name,
                text: text.to_string(),
            })
            .await
            .map_err(SyncError::store(during))?;
        telemetry::record_submission("comment");
        self.comments(parent, parent_id).await
    }

    pub async fn submit_story(&self, input: StoryInput) -> SyncResult<Collections> {
        let new = NewStory {
            author_name: required(&input.author_name)?,
            title: required(&input.title)?,
            content: required(&input.content)?,
            author_avatar: optional(input.author_avatar),
            category: optional(input.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        };
        let story = self.repo.create_story(new).await.map_err(SyncError::store("sharing your story"))?;
        info!(id = story.id, "story submitted");
        telemetry::record_submission("story");
        self.load_all().await
    }

    pub async fn upload_photo(&self, input: PhotoInput, file: Option<Upload>) -> SyncResult<Collections> {
        let author_name = required(&input.author_name)?;
        let title = required(&input.title)?;
        let during = "uploading your photo";
        let image_url = match (file, optional(input.image_url)) {
            (Some(file), _) => self.store_file("photos", &file, during).await?,
            (None, Some(url)) => url,
            (None, None) => return Err(SyncError::Invalid("Please choose a photo to upload.")),
        };
        let photo = self
            .repo
            .create_photo(NewPhoto {
                author_name,
                title,
                image_url,
                author_avatar: optional(input.author_avatar),
                description: optional(input.description).unwrap_or_default(),
                category: optional(input.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            })
            .await
            .map_err(SyncError::store(during))?;
        info!(id = photo.id, "photo uploaded");
        telemetry::record_submission("photo");
        self.load_all().await
    }

    pub async fn upload_media(&self, input: MediaInput, file: Option<Upload>) -> SyncResult<Collections> {
        let author_name = required(&input.author_name)?;
        let title = required(&input.title)?;
        let media_type = match input.media_type.as_deref().map(str::trim) {
            None | Some("") => file
                .as_ref()
                .and_then(|f| MediaType::from_mime(&f.mime))
                .ok_or(SyncError::Invalid(MISSING_FIELDS))?,
            Some(t) => MediaType::parse(t).ok_or(SyncError::Invalid("Media type must be audio or video."))?,
        };
        if let Some(f) = file.as_ref() {
            if !media_type.accepts_mime(&f.mime) {
                return Err(SyncError::Invalid(MEDIA_TYPE_MISMATCH));
            }
        }
        let during = "uploading your media";
        let media_url = match (file, optional(input.media_url)) {
            (Some(file), _) => self.store_file("media", &file, during).await?,
            (None, Some(url)) if media_type == MediaType::Video => crate::render::embed_url(&url),
            (None, Some(url)) => url,
            (None, None) => return Err(SyncError::Invalid("Please choose a file or paste a link.")),
        };
        let media = self
            .repo
            .create_media(NewMedia {
                author_name,
                title,
                media_type,
                media_url,
                author_avatar: optional(input.author_avatar),
                description: optional(input.description).unwrap_or_default(),
            })
            .await
            .map_err(SyncError::store(during))?;
        info!(id = media.id, kind = media.media_type.as_str(), "media uploaded");
        telemetry::record_submission("media");
        self.load_all().await
    }

    async fn store_file(&self, prefix: &str, file: &Upload, during: &'static str) -> SyncResult<String> {
        let path = content_path(prefix, &file.bytes);
        self.blobs
            .upload(&path, &file.mime, &file.bytes)
            .await
            .map_err(|source| {
                error!(%path, error = %source, "blob upload failed");
                SyncError::Blob { during, source }
            })
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }
}

#[cfg(all(test, feature = "inmem-store"))]
mod tests {
    use super::*;
    use crate::repo::inmem::InMemRepo;
    use crate::storage::FsBlobStore;

    fn service() -> (SyncService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(dir.path(), "/files");
        (SyncService::new(Arc::new(InMemRepo::ephemeral()), Arc::new(blobs)), dir)
    }

    fn story(title: &str) -> StoryInput {
        StoryInput {
            author_name: "Sarah M.".into(),
            title: title.into(),
            content: "First paragraph.\n\nSecond paragraph.".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn like_counts_up_from_the_stored_value() {
        let (svc, _dir) = service();
        let all = svc.submit_story(story("Lake days")).await.unwrap();
        let id = all.stories[0].id;
        for _ in 0..5 {
            svc.like(ContentKind::Story, id).await.unwrap();
        }
        assert_eq!(svc.like(ContentKind::Story, id).await.unwrap(), 6);
        assert_eq!(svc.like(ContentKind::Story, id).await.unwrap(), 7);
        let reloaded = svc.load_all().await.unwrap();
        assert_eq!(reloaded.stories[0].likes, 7);
    }

    #[tokio::test]
    async fn like_of_unknown_record_is_not_found() {
        let (svc, _dir) = service();
        assert!(matches!(svc.like(ContentKind::Photo, 42).await, Err(SyncError::NotFound)));
    }

    #[tokio::test]
    async fn blank_comment_is_rejected_without_insert() {
        let (svc, _dir) = service();
        let id = svc.submit_story(story("Porch")).await.unwrap().stories[0].id;
        let err = svc
            .add_comment(ParentKind::Story, id, CommentInput { author_name: None, text: "   ".into() })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Please write a comment before posting.");
        assert!(svc.comments(ParentKind::Story, id).await.unwrap().is_empty());
        assert_eq!(svc.load_all().await.unwrap().stories[0].comment_count, 0);
    }

    #[tokio::test]
    async fn comment_reloads_the_parent_thread() {
        let (svc, _dir) = service();
        svc.submit_story(story("One")).await.unwrap();
        let all = svc.submit_story(story("Two")).await.unwrap();
        let target = all.stories.iter().find(|s| s.title == "One").unwrap().id;
        let other = all.stories.iter().find(|s| s.title == "Two").unwrap().id;

        let list = svc
            .add_comment(ParentKind::Story, target, CommentInput { author_name: None, text: "Hello".into() })
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].text, "Hello");
        assert_eq!(list[0].content_id, target);
        assert_eq!(list[0].author_name, ANONYMOUS_AUTHOR);
        assert!(svc.comments(ParentKind::Story, other).await.unwrap().is_empty());

        let reloaded = svc.load_all().await.unwrap();
        let s = reloaded.stories.iter().find(|s| s.id == target).unwrap();
        assert_eq!(s.comment_count, 1);
    }

    #[tokio::test]
    async fn story_requires_fields_and_defaults_category() {
        let (svc, _dir) = service();
        let mut input = story("x");
        input.title = " ".into();
        assert!(matches!(svc.submit_story(input).await, Err(SyncError::Invalid(_))));
        let all = svc.submit_story(story("ok")).await.unwrap();
        assert_eq!(all.stories[0].category, DEFAULT_CATEGORY);
    }

    #[tokio::test]
    async fn photo_upload_stores_file_and_reloads() {
        let (svc, dir) = service();
        let file = Upload { bytes: vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], mime: "image/png".into() };
        let input = PhotoInput { author_name: "Michael R.".into(), title: "Lavender".into(), ..Default::default() };
        let all = svc.upload_photo(input, Some(file.clone())).await.unwrap();
        assert_eq!(all.photos.len(), 1);
        let url = &all.photos[0].image_url;
        assert!(url.starts_with("/files/photos/"));
        let stored = dir.path().join(content_path("photos", &file.bytes));
        assert!(stored.exists());
    }

    #[tokio::test]
    async fn photo_without_image_is_rejected() {
        let (svc, _dir) = service();
        let input = PhotoInput { author_name: "A".into(), title: "B".into(), ..Default::default() };
        let err = svc.upload_photo(input, None).await.unwrap_err();
        assert_eq!(err.user_message(), "Please choose a photo to upload.");
        assert!(svc.load_all().await.unwrap().photos.is_empty());
    }

    #[tokio::test]
    async fn media_link_is_rewritten_to_embed() {
        let (svc, _dir) = service();
        let input = MediaInput {
            author_name: "A".into(),
            title: "Tribute".into(),
            media_type: Some("video".into()),
            media_url: Some("https://www.youtube.com/watch?v=abc123".into()),
            ..Default::default()
        };
        let all = svc.upload_media(input, None).await.unwrap();
        assert_eq!(all.media[0].media_url, "https://www.youtube.com/embed/abc123");
        assert_eq!(all.media[0].media_type, MediaType::Video);
    }

    #[tokio::test]
    async fn media_type_falls_back_to_file_mime() {
        let (svc, _dir) = service();
        let input = MediaInput { author_name: "A".into(), title: "Voice".into(), ..Default::default() };
        let file = Upload { bytes: b"ID3fake".to_vec(), mime: "audio/mpeg".into() };
        let all = svc.upload_media(input, Some(file)).await.unwrap();
        assert_eq!(all.media[0].media_type, MediaType::Audio);
    }

    #[tokio::test]
    async fn media_type_must_agree_with_the_file() {
        let (svc, _dir) = service();
        let input = MediaInput {
            author_name: "A".into(),
            title: "Clip".into(),
            media_type: Some("audio".into()),
            ..Default::default()
        };
        let file = Upload { bytes: b"not really mp4".to_vec(), mime: "video/mp4".into() };
        let err = svc.upload_media(input.clone(), Some(file)).await.unwrap_err();
        assert_eq!(err.user_message(), "The file does not match the chosen media type.");
        assert!(svc.load_all().await.unwrap().media.is_empty());

        let recording = Upload { bytes: b"webm voice".to_vec(), mime: "video/webm".into() };
        let all = svc.upload_media(input, Some(recording)).await.unwrap();
        assert_eq!(all.media[0].media_type, MediaType::Audio);

        let wrong = MediaInput { media_type: Some("video".into()), ..MediaInput::default() };
        let video = MediaInput { author_name: "A".into(), title: "Song".into(), ..wrong };
        let file = Upload { bytes: b"ID3fake".to_vec(), mime: "audio/mpeg".into() };
        assert!(matches!(svc.upload_media(video, Some(file)).await, Err(SyncError::Invalid(_))));
    }
}
