//! Named interactions bound into rendered markup.
//!
//! Markup carries `data-action="<name>"` plus `data-*` arguments instead of
//! inline calls into global functions. The client binder looks names up in
//! the registry published at `GET /api/v1/actions`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::models::{ContentKind, Id, ParentKind};
use crate::render::html_escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Like,
    ToggleComments,
    ToggleStory,
    SubmitComment,
    OpenLightbox,
    CloseLightbox,
    NextPhoto,
    PreviousPhoto,
    ToggleAudio,
    PlayVideo,
    OpenStoryModal,
    CloseStoryModal,
    OpenUploadModal,
    CloseUploadModal,
    SubmitStory,
    UploadPhoto,
    UploadMedia,
    Filter,
    UploadTab,
    ToggleRecording,
    ScrollTo,
}

impl Action {
    pub const ALL: [Action; 21] = [
        Action::Like,
        Action::ToggleComments,
        Action::ToggleStory,
        Action::SubmitComment,
        Action::OpenLightbox,
        Action::CloseLightbox,
        Action::NextPhoto,
        Action::PreviousPhoto,
        Action::ToggleAudio,
        Action::PlayVideo,
        Action::OpenStoryModal,
        Action::CloseStoryModal,
        Action::OpenUploadModal,
        Action::CloseUploadModal,
        Action::SubmitStory,
        Action::UploadPhoto,
        Action::UploadMedia,
        Action::Filter,
        Action::UploadTab,
        Action::ToggleRecording,
        Action::ScrollTo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Action::Like => "like",
            Action::ToggleComments => "toggle-comments",
            Action::ToggleStory => "toggle-story",
            Action::SubmitComment => "submit-comment",
            Action::OpenLightbox => "open-lightbox",
            Action::CloseLightbox => "close-lightbox",
            Action::NextPhoto => "next-photo",
            Action::PreviousPhoto => "previous-photo",
            Action::ToggleAudio => "toggle-audio",
            Action::PlayVideo => "play-video",
            Action::OpenStoryModal => "open-story-modal",
            Action::CloseStoryModal => "close-story-modal",
            Action::OpenUploadModal => "open-upload-modal",
            Action::CloseUploadModal => "close-upload-modal",
            Action::SubmitStory => "submit-story",
            Action::UploadPhoto => "upload-photo",
            Action::UploadMedia => "upload-media",
            Action::Filter => "filter",
            Action::UploadTab => "upload-tab",
            Action::ToggleRecording => "toggle-recording",
            Action::ScrollTo => "scroll-to",
        }
    }

    /// DOM event the binder listens for.
    pub fn event(&self) -> &'static str {
        match self {
            Action::SubmitComment | Action::SubmitStory | Action::UploadPhoto | Action::UploadMedia => "submit",
            _ => "click",
        }
    }

    /// Whether the action writes to the store (and so is followed by a reload).
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Action::Like | Action::SubmitComment | Action::SubmitStory | Action::UploadPhoto | Action::UploadMedia
        )
    }

    pub fn bind(self) -> Binding {
        Binding { action: self, args: Vec::new() }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// An action plus its `data-*` arguments, rendered as HTML attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    action: Action,
    args: Vec<(&'static str, String)>,
}

impl Binding {
    pub fn arg(mut self, key: &'static str, value: impl ToString) -> Self {
        self.args.push((key, value.to_string()));
        self
    }

    pub fn like(kind: ContentKind, id: Id) -> Self {
        Action::Like.bind().arg("kind", kind.collection()).arg("id", id)
    }

    pub fn comment(parent: ParentKind, id: Id) -> Self {
        Action::SubmitComment.bind().arg("kind", parent.collection()).arg("id", id)
    }

    pub fn action(&self) -> Action { self.action }

    pub fn attrs(&self) -> String {
        let mut out = format!(r#"data-action="{}""#, self.action.name());
        for (k, v) in &self.args {
            out.push_str(&format!(r#" data-{}="{}""#, k, html_escape(v)));
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ActionInfo {
    pub name: &'static str,
    pub event: &'static str,
    pub remote: bool,
}

/// The registry served to the client binder.
pub fn registry() -> Vec<ActionInfo> {
    Action::ALL
        .iter()
        .map(|a| ActionInfo { name: a.name(), event: a.event(), remote: a.is_remote() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_parses_back() {
        for a in Action::ALL {
            assert_eq!(a.name().parse::<Action>().unwrap(), a);
        }
        assert_eq!("toggleLike".parse::<Action>(), Err(UnknownAction("toggleLike".into())));
    }

    #[test]
    fn binding_renders_escaped_attributes() {
        let b = Binding::like(ContentKind::Photo, 7);
        assert_eq!(b.attrs(), r#"data-action="like" data-kind="photos" data-id="7""#);
        let s = Action::ScrollTo.bind().arg("target", "a\"b");
        assert_eq!(s.attrs(), r#"data-action="scroll-to" data-target="a&quot;b""#);
    }

    #[test]
    fn registry_lists_every_action_once() {
        let reg = registry();
        assert_eq!(reg.len(), Action::ALL.len());
        assert!(reg.iter().any(|a| a.name == "submit-comment" && a.event == "submit" && a.remote));
    }
}
