use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("store error: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

use async_trait::async_trait;

/// Collections are always returned newest first.
#[async_trait]
pub trait StoryRepo: Send + Sync {
    async fn list_stories(&self) -> RepoResult<Vec<Story>>;
    async fn create_story(&self, new: NewStory) -> RepoResult<Story>;
    async fn get_story(&self, id: Id) -> RepoResult<Story>;
}

#[async_trait]
pub trait PhotoRepo: Send + Sync {
    async fn list_photos(&self) -> RepoResult<Vec<Photo>>;
    async fn create_photo(&self, new: NewPhoto) -> RepoResult<Photo>;
    async fn get_photo(&self, id: Id) -> RepoResult<Photo>;
}

#[async_trait]
pub trait MediaRepo: Send + Sync {
    async fn list_media(&self) -> RepoResult<Vec<Media>>;
    async fn create_media(&self, new: NewMedia) -> RepoResult<Media>;
    async fn get_media(&self, id: Id) -> RepoResult<Media>;
}

#[async_trait]
pub trait LikeRepo: Send + Sync {
    /// Atomically bumps the like counter and returns the stored value.
    async fn increment_likes(&self, kind: ContentKind, id: Id) -> RepoResult<i64>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    /// Oldest first.
    async fn list_comments(&self, parent: ParentKind, parent_id: Id) -> RepoResult<Vec<Comment>>;
    /// Inserts the comment and bumps the parent's comment counter together.
    async fn create_comment(&self, new: NewComment) -> RepoResult<Comment>;
}

pub trait Repo: StoryRepo + PhotoRepo + MediaRepo + LikeRepo + CommentRepo {}

impl<T> Repo for T where T: StoryRepo + PhotoRepo + MediaRepo + LikeRepo + CommentRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use serde::{Serialize, Deserialize};
    use std::path::{PathBuf, Path};
    use tracing::{info, warn};

    const SNAPSHOT_FILE: &str = "state.json";

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        stories:  HashMap<Id, Story>,
        photos:   HashMap<Id, Photo>,
        media:    HashMap<Id, Media>,
        comments: HashMap<Id, Comment>,
        next_id: Id,
    }

    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Option<Arc<PathBuf>>,
    }

    fn newest_first<T: Clone>(rows: &HashMap<Id, T>, key: impl Fn(&T) -> (chrono::DateTime<Utc>, Id)) -> Vec<T> {
        let mut v: Vec<T> = rows.values().cloned().collect();
        v.sort_by(|a, b| key(b).cmp(&key(a)));
        v
    }

    impl InMemRepo {
        fn data_dir() -> PathBuf {
            std::env::var("MEMORIES_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data"))
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        info!("loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        warn!("failed to parse snapshot '{}': {e}; starting empty", path.display());
                        State::default()
                    }
                },
                Err(e) => {
                    info!("no snapshot at '{}' ({e}); starting empty", path.display());
                    State::default()
                }
            }
        }

        fn persist(&self) {
            let Some(path) = self.snapshot_path.as_ref() else { return };
            let bytes = match self.state.read() {
                Ok(s) => serde_json::to_vec_pretty(&*s),
                Err(_) => return,
            };
            match bytes {
                Ok(bytes) => {
                    if let Some(dir) = path.parent() {
                        let _ = std::fs::create_dir_all(dir);
                    }
                    if let Err(e) = std::fs::write(path.as_path(), bytes) {
                        warn!("failed to write snapshot '{}': {e}", path.display());
                    }
                }
                Err(e) => warn!("failed to serialise snapshot: {e}"),
            }
        }

        /// Snapshot-backed store rooted at `MEMORIES_DATA_DIR` (default `data/`).
        pub fn new() -> Self {
            Self::in_dir(&Self::data_dir())
        }

        /// Snapshot kept as `state.json` inside `dir`.
        pub fn in_dir(dir: &std::path::Path) -> Self {
            Self::with_snapshot(dir.join(SNAPSHOT_FILE))
        }

        pub fn with_snapshot(path: PathBuf) -> Self {
            let state = Self::load_state_from(&path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Some(Arc::new(path)),
            }
        }

        /// Never touches the filesystem.
        pub fn ephemeral() -> Self {
            Self { state: Arc::new(RwLock::new(State::default())), snapshot_path: None }
        }

        fn read(&self) -> RepoResult<std::sync::RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<std::sync::RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn next_id(state: &mut State) -> Id {
            state.next_id += 1;
            state.next_id
        }
    }

    impl Default for InMemRepo {
        fn default() -> Self { Self::new() }
    }

    #[async_trait]
    impl StoryRepo for InMemRepo {
        async fn list_stories(&self) -> RepoResult<Vec<Story>> {
            let s = self.read()?;
            Ok(newest_first(&s.stories, |r| (r.created_at, r.id)))
        }
        async fn create_story(&self, new: NewStory) -> RepoResult<Story> {
            let mut s = self.write()?;
            let id = Self::next_id(&mut s);
            let story = Story {
                id,
                author_name: new.author_name,
                author_avatar: new.author_avatar,
                title: new.title,
                category: new.category,
                content: new.content,
                likes: 0,
                comment_count: 0,
                created_at: Utc::now(),
            };
            s.stories.insert(id, story.clone());
            drop(s);                       // release lock before persisting
            self.persist();
            Ok(story)
        }
        async fn get_story(&self, id: Id) -> RepoResult<Story> {
            self.read()?.stories.get(&id).cloned().ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl PhotoRepo for InMemRepo {
        async fn list_photos(&self) -> RepoResult<Vec<Photo>> {
            let s = self.read()?;
            Ok(newest_first(&s.photos, |r| (r.created_at, r.id)))
        }
        async fn create_photo(&self, new: NewPhoto) -> RepoResult<Photo> {
            let mut s = self.write()?;
            let id = Self::next_id(&mut s);
            let photo = Photo {
                id,
                author_name: new.author_name,
                author_avatar: new.author_avatar,
                title: new.title,
                description: new.description,
                category: new.category,
                image_url: new.image_url,
                likes: 0,
                created_at: Utc::now(),
            };
            s.photos.insert(id, photo.clone());
            drop(s);
            self.persist();
            Ok(photo)
        }
        async fn get_photo(&self, id: Id) -> RepoResult<Photo> {
            self.read()?.photos.get(&id).cloned().ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl MediaRepo for InMemRepo {
        async fn list_media(&self) -> RepoResult<Vec<Media>> {
            let s = self.read()?;
            Ok(newest_first(&s.media, |r| (r.created_at, r.id)))
        }
        async fn create_media(&self, new: NewMedia) -> RepoResult<Media> {
            let mut s = self.write()?;
            let id = Self::next_id(&mut s);
            let media = Media {
                id,
                author_name: new.author_name,
                author_avatar: new.author_avatar,
                title: new.title,
                description: new.description,
                media_type: new.media_type,
                media_url: new.media_url,
                likes: 0,
                created_at: Utc::now(),
            };
            s.media.insert(id, media.clone());
            drop(s);
            self.persist();
            Ok(media)
        }
        async fn get_media(&self, id: Id) -> RepoResult<Media> {
            self.read()?.media.get(&id).cloned().ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl LikeRepo for InMemRepo {
        async fn increment_likes(&self, kind: ContentKind, id: Id) -> RepoResult<i64> {
            let mut s = self.write()?;
            let likes = match kind {
                ContentKind::Story => s.stories.get_mut(&id).map(|r| &mut r.likes),
                ContentKind::Photo => s.photos.get_mut(&id).map(|r| &mut r.likes),
                ContentKind::Media => s.media.get_mut(&id).map(|r| &mut r.likes),
            }
            .ok_or(RepoError::NotFound)?;
            *likes += 1;
            let updated = *likes;
            drop(s);
            self.persist();
            Ok(updated)
        }
    }

    #[async_trait]
    impl CommentRepo for InMemRepo {
        async fn list_comments(&self, parent: ParentKind, parent_id: Id) -> RepoResult<Vec<Comment>> {
            let s = self.read()?;
            let mut v: Vec<_> = s.comments
                .values()
                .filter(|c| c.content_type == parent && c.content_id == parent_id)
                .cloned()
                .collect();
            v.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));    // ascending
            Ok(v)
        }
        async fn create_comment(&self, new: NewComment) -> RepoResult<Comment> {
            let mut s = self.write()?;
            match new.content_type {
                ParentKind::Story => {
                    let story = s.stories.get_mut(&new.content_id).ok_or(RepoError::NotFound)?;
                    story.comment_count += 1;
                }
                ParentKind::Photo => {
                    if !s.photos.contains_key(&new.content_id) { return Err(RepoError::NotFound); }
                }
            }
            let id = Self::next_id(&mut s);
            let comment = Comment {
                id,
                content_id: new.content_id,
                content_type: new.content_type,
                author_name: new.author_name,
                text: new.text,
                created_at: Utc::now(),
            };
            s.comments.insert(id, comment.clone());
            drop(s);
            self.persist();
            Ok(comment)
        }
    }
}

#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::{Pool, Postgres};

    const STORY_COLS: &str = "id, author_name, author_avatar, title, category, content, likes, comment_count, created_at";
    const PHOTO_COLS: &str = "id, author_name, author_avatar, title, description, category, image_url, likes, created_at";
    const MEDIA_COLS: &str = "id, author_name, author_avatar, title, description, media_type, media_url, likes, created_at";
    const COMMENT_COLS: &str = "id, content_id, content_type, author_name, text, created_at";

    fn map_err(e: sqlx::Error) -> RepoError {
        match e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            other => RepoError::Internal(other.to_string()),
        }
    }

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }

        pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
            sqlx::migrate!("./migrations").run(&self.pool).await
        }
    }

    #[async_trait]
    impl StoryRepo for PgRepo {
        async fn list_stories(&self) -> RepoResult<Vec<Story>> {
            sqlx::query_as::<_, Story>(&format!("SELECT {STORY_COLS} FROM stories ORDER BY created_at DESC, id DESC"))
                .fetch_all(&self.pool).await.map_err(map_err)
        }
        async fn create_story(&self, new: NewStory) -> RepoResult<Story> {
            sqlx::query_as::<_, Story>(&format!(
                "INSERT INTO stories (author_name, author_avatar, title, category, content) VALUES ($1,$2,$3,$4,$5) RETURNING {STORY_COLS}"
            ))
                .bind(&new.author_name).bind(&new.author_avatar).bind(&new.title).bind(&new.category).bind(&new.content)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
        async fn get_story(&self, id: Id) -> RepoResult<Story> {
            sqlx::query_as::<_, Story>(&format!("SELECT {STORY_COLS} FROM stories WHERE id=$1"))
                .bind(id)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
    }

    #[async_trait]
    impl PhotoRepo for PgRepo {
        async fn list_photos(&self) -> RepoResult<Vec<Photo>> {
            sqlx::query_as::<_, Photo>(&format!("SELECT {PHOTO_COLS} FROM photos ORDER BY created_at DESC, id DESC"))
                .fetch_all(&self.pool).await.map_err(map_err)
        }
        async fn create_photo(&self, new: NewPhoto) -> RepoResult<Photo> {
            sqlx::query_as::<_, Photo>(&format!(
                "INSERT INTO photos (author_name, author_avatar, title, description, category, image_url) VALUES ($1,$2,$3,$4,$5,$6) RETURNING {PHOTO_COLS}"
            ))
                .bind(&new.author_name).bind(&new.author_avatar).bind(&new.title)
                .bind(&new.description).bind(&new.category).bind(&new.image_url)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
        async fn get_photo(&self, id: Id) -> RepoResult<Photo> {
            sqlx::query_as::<_, Photo>(&format!("SELECT {PHOTO_COLS} FROM photos WHERE id=$1"))
                .bind(id)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
    }

    #[async_trait]
    impl MediaRepo for PgRepo {
        async fn list_media(&self) -> RepoResult<Vec<Media>> {
            sqlx::query_as::<_, Media>(&format!("SELECT {MEDIA_COLS} FROM media ORDER BY created_at DESC, id DESC"))
                .fetch_all(&self.pool).await.map_err(map_err)
        }
        async fn create_media(&self, new: NewMedia) -> RepoResult<Media> {
            sqlx::query_as::<_, Media>(&format!(
                "INSERT INTO media (author_name, author_avatar, title, description, media_type, media_url) VALUES ($1,$2,$3,$4,$5,$6) RETURNING {MEDIA_COLS}"
            ))
                .bind(&new.author_name).bind(&new.author_avatar).bind(&new.title)
                .bind(&new.description).bind(new.media_type).bind(&new.media_url)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
        async fn get_media(&self, id: Id) -> RepoResult<Media> {
            sqlx::query_as::<_, Media>(&format!("SELECT {MEDIA_COLS} FROM media WHERE id=$1"))
                .bind(id)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
    }

    #[async_trait]
    impl LikeRepo for PgRepo {
        async fn increment_likes(&self, kind: ContentKind, id: Id) -> RepoResult<i64> {
            let table = kind.collection();
            sqlx::query_scalar::<_, i64>(&format!("UPDATE {table} SET likes = likes + 1 WHERE id=$1 RETURNING likes"))
                .bind(id)
                .fetch_one(&self.pool).await.map_err(map_err)
        }
    }

    #[async_trait]
    impl CommentRepo for PgRepo {
        async fn list_comments(&self, parent: ParentKind, parent_id: Id) -> RepoResult<Vec<Comment>> {
            sqlx::query_as::<_, Comment>(&format!(
                "SELECT {COMMENT_COLS} FROM comments WHERE content_type=$1 AND content_id=$2 ORDER BY created_at ASC, id ASC"
            ))
                .bind(parent).bind(parent_id)
                .fetch_all(&self.pool).await.map_err(map_err)
        }
        async fn create_comment(&self, new: NewComment) -> RepoResult<Comment> {
            let mut tx = self.pool.begin().await.map_err(map_err)?;
            let bumped = match new.content_type {
                ParentKind::Story => sqlx::query("UPDATE stories SET comment_count = comment_count + 1 WHERE id=$1")
                    .bind(new.content_id)
                    .execute(&mut *tx).await.map_err(map_err)?
                    .rows_affected(),
                ParentKind::Photo => sqlx::query_scalar::<_, i64>("SELECT id FROM photos WHERE id=$1")
                    .bind(new.content_id)
                    .fetch_optional(&mut *tx).await.map_err(map_err)?
                    .map_or(0, |_| 1),
            };
            if bumped == 0 { return Err(RepoError::NotFound); }
            let comment = sqlx::query_as::<_, Comment>(&format!(
                "INSERT INTO comments (content_id, content_type, author_name, text) VALUES ($1,$2,$3,$4) RETURNING {COMMENT_COLS}"
            ))
                .bind(new.content_id).bind(new.content_type).bind(&new.author_name).bind(&new.text)
                .fetch_one(&mut *tx).await.map_err(map_err)?;
            tx.commit().await.map_err(map_err)?;
            Ok(comment)
        }
    }
}
