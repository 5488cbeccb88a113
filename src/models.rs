use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub type Id = i64;

pub const DEFAULT_CATEGORY: &str = "General";
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// The three record kinds that can be liked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Story,
    Photo,
    Media,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Story => "story",
            ContentKind::Photo => "photo",
            ContentKind::Media => "media",
        }
    }

    /// Path segment used by the JSON API (`/stories/{id}/like`).
    pub fn collection(&self) -> &'static str {
        match self {
            ContentKind::Story => "stories",
            ContentKind::Photo => "photos",
            ContentKind::Media => "media",
        }
    }

    pub fn from_collection(segment: &str) -> Option<Self> {
        match segment {
            "stories" => Some(ContentKind::Story),
            "photos" => Some(ContentKind::Photo),
            "media" => Some(ContentKind::Media),
            _ => None,
        }
    }
}

/// Records that accept comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ParentKind {
    Story,
    Photo,
}

impl ParentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentKind::Story => "story",
            ParentKind::Photo => "photo",
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            ParentKind::Story => "stories",
            ParentKind::Photo => "photos",
        }
    }

    pub fn from_collection(segment: &str) -> Option<Self> {
        match ContentKind::from_collection(segment)? {
            ContentKind::Story => Some(ParentKind::Story),
            ContentKind::Photo => Some(ParentKind::Photo),
            ContentKind::Media => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Some(MediaType::Audio),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }

    /// Type implied by a sniffed MIME, if any.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("audio/") {
            Some(MediaType::Audio)
        } else if mime.starts_with("video/") {
            Some(MediaType::Video)
        } else {
            None
        }
    }

    /// Whether a file with this MIME can be stored as this type. WebM
    /// sniffs as video but also carries browser audio recordings.
    pub fn accepts_mime(&self, mime: &str) -> bool {
        match self {
            MediaType::Audio => mime.starts_with("audio/") || mime == "video/webm",
            MediaType::Video => mime.starts_with("video/"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Story {
    pub id: Id,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub category: String,
    pub content: String,
    pub likes: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewStory {
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub category: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Photo {
    pub id: Id,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPhoto {
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Media {
    pub id: Id,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub description: String,
    pub media_type: MediaType,
    pub media_url: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewMedia {
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub title: String,
    pub description: String,
    pub media_type: MediaType,
    pub media_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Comment {
    pub id: Id,
    pub content_id: Id,
    pub content_type: ParentKind,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewComment {
    pub content_id: Id,
    pub content_type: ParentKind,
    pub author_name: String,
    pub text: String,
}
