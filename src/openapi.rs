use crate::actions::ActionInfo;
use crate::error::ApiErrorBody;
use crate::models::{Comment, ContentKind, Media, MediaType, ParentKind, Photo, Story};
use crate::notify::{Level, Notice};
use crate::routes::{LightboxView, LikeResponse, Submitted};
use crate::sync::{Collections, CommentInput, MediaInput, PhotoInput, StoryInput};
use crate::view::Step;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_collections,
        crate::routes::list_stories,
        crate::routes::create_story,
        crate::routes::list_photos,
        crate::routes::upload_photo,
        crate::routes::list_media,
        crate::routes::upload_media,
        crate::routes::like,
        crate::routes::list_comments,
        crate::routes::add_comment,
        crate::routes::lightbox,
        crate::routes::list_actions,
    ),
    components(schemas(
        Story, Photo, Media, Comment, ContentKind, ParentKind, MediaType,
        Collections, StoryInput, PhotoInput, MediaInput, CommentInput,
        LikeResponse, LightboxView, Step, ActionInfo, ApiErrorBody,
        Submitted, Notice, Level
    )),
    tags(
        (name = "memories", description = "Stories, photos and recordings"),
    )
)]
pub struct ApiDoc;
