//! Toast notifications.
//!
//! A toast slides in, stays until [`DISMISS_AFTER`] has passed since it was
//! shown, slides out, and is then removed. Each toast runs on its own clock;
//! queueing more of them never delays the removal of an earlier one.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub const DISMISS_AFTER: Duration = Duration::from_millis(3000);
pub const SLIDE_DURATION: Duration = Duration::from_millis(400);

pub const STORY_SUBMITTED: &str = "Story submitted successfully!";
pub const PHOTOS_UPLOADED: &str = "Photos uploaded successfully!";
pub const MEDIA_UPLOADED: &str = "Media uploaded successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Info,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Shown,
    Leaving,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: Level::Info, message: message.into() }
    }

    /// Shown when files are picked in an upload form.
    pub fn files_selected(count: usize) -> Self {
        Self::info(format!("{count} file(s) selected"))
    }
}

#[derive(Debug, Clone)]
struct Toast {
    id: u64,
    notice: Notice,
    shown_at: Instant,
}

impl Toast {
    fn phase(&self, now: Instant) -> Phase {
        let age = now.saturating_duration_since(self.shown_at);
        if age < SLIDE_DURATION {
            Phase::Entering
        } else if age < DISMISS_AFTER {
            Phase::Shown
        } else if age < DISMISS_AFTER + SLIDE_DURATION {
            Phase::Leaving
        } else {
            Phase::Removed
        }
    }
}

#[derive(Debug, Default)]
pub struct NotificationQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl NotificationQueue {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, notice: Notice, now: Instant) -> u64 {
        self.next_id += 1;
        self.toasts.push(Toast { id: self.next_id, notice, shown_at: now });
        self.next_id
    }

    /// `Removed` for ids that were swept or never existed.
    pub fn phase(&self, id: u64, now: Instant) -> Phase {
        self.toasts
            .iter()
            .find(|t| t.id == id)
            .map_or(Phase::Removed, |t| t.phase(now))
    }

    /// Drops every toast whose slide-out has finished; returns their ids.
    pub fn sweep(&mut self, now: Instant) -> Vec<u64> {
        let mut removed = Vec::new();
        self.toasts.retain(|t| {
            let keep = t.phase(now) != Phase::Removed;
            if !keep {
                removed.push(t.id);
            }
            keep
        });
        removed
    }

    /// Notices still in the document at `now`, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<&Notice> {
        self.toasts
            .iter()
            .filter(|t| t.phase(now) != Phase::Removed)
            .map(|t| &t.notice)
            .collect()
    }

    pub fn len(&self) -> usize { self.toasts.len() }
    pub fn is_empty(&self) -> bool { self.toasts.is_empty() }
}
