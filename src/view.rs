//! Interaction state for the pages: filtering, the lightbox, modals, audio
//! playback, story cards, recording and the stats counters.
//!
//! Everything here is plain data. Render functions read it to decide which
//! classes to emit; nothing in this module touches the store.

use std::collections::HashSet;
use std::time::Duration;

use crate::models::{Media, Photo, Story};

// ---------------- Filtering ----------------

/// Value of a filter button's `data-filter` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Only(String),
}

impl Filter {
    /// Only the exact value `all` shows everything; any other value,
    /// including `All`, is a category or media type.
    pub fn parse(raw: &str) -> Self {
        if raw == "all" {
            Filter::All
        } else {
            Filter::Only(raw.to_string())
        }
    }

    pub fn matches(&self, tag: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(f) => f == tag,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Filter::All => "all",
            Filter::Only(f) => f,
        }
    }
}

/// Items that carry a `data-category` / `data-type` tag.
pub trait Tagged {
    fn tag(&self) -> &str;
}

impl Tagged for Story {
    fn tag(&self) -> &str { &self.category }
}

impl Tagged for Photo {
    fn tag(&self) -> &str { &self.category }
}

impl Tagged for Media {
    fn tag(&self) -> &str { self.media_type.as_str() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Shown,
    Hidden,
}

impl Visibility {
    pub fn is_shown(self) -> bool { self == Visibility::Shown }
}

pub fn apply_filter<T: Tagged>(items: &[T], filter: &Filter) -> Vec<Visibility> {
    items
        .iter()
        .map(|item| if filter.matches(item.tag()) { Visibility::Shown } else { Visibility::Hidden })
        .collect()
}

/// Distinct tags in first-seen order, for building filter buttons.
pub fn tags<T: Tagged>(items: &[T]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|i| i.tag().to_string())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Filter buttons with exactly one active entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBar {
    options: Vec<Filter>,
    active: usize,
}

impl FilterBar {
    /// `all` always comes first.
    pub fn new(tags: impl IntoIterator<Item = String>) -> Self {
        let mut options = vec![Filter::All];
        for t in tags {
            let f = Filter::Only(t);
            if !options.contains(&f) {
                options.push(f);
            }
        }
        Self { options, active: 0 }
    }

    /// Activates `filter`; unknown filters are added so a shared link still
    /// highlights its button.
    pub fn select(&mut self, filter: Filter) {
        match self.options.iter().position(|f| *f == filter) {
            Some(i) => self.active = i,
            None => {
                self.options.push(filter);
                self.active = self.options.len() - 1;
            }
        }
    }

    pub fn active(&self) -> &Filter { &self.options[self.active] }

    pub fn options(&self) -> impl Iterator<Item = (&Filter, bool)> {
        self.options.iter().enumerate().map(move |(i, f)| (f, i == self.active))
    }
}

// ---------------- Lightbox ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lightbox {
    len: usize,
    index: usize,
    open: bool,
}

impl Lightbox {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0, open: false }
    }

    /// Out-of-range indexes fall back to the first photo. An empty gallery
    /// never opens.
    pub fn open(&mut self, index: usize) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = if index < self.len { index } else { 0 };
        self.open = true;
        Some(self.index)
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.open((self.index + 1) % self.len)
    }

    pub fn previous(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.open((self.index + self.len - 1) % self.len)
    }

    pub fn step(&mut self, step: Step) -> Option<usize> {
        match step {
            Step::Stay => (!self.is_empty()).then_some(self.index),
            Step::Next => self.next(),
            Step::Previous => self.previous(),
        }
    }

    pub fn index(&self) -> usize { self.index }
    pub fn is_open(&self) -> bool { self.open }
    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Stay,
    Next,
    Previous,
}

// ---------------- Modals ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalId {
    Story,
    Upload,
    Lightbox,
}

impl ModalId {
    pub fn element_id(&self) -> &'static str {
        match self {
            ModalId::Story => "story-modal",
            ModalId::Upload => "upload-modal",
            ModalId::Lightbox => "lightbox",
        }
    }

    /// Value of an `?open=` query parameter.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "story" => Some(ModalId::Story),
            "upload" => Some(ModalId::Upload),
            "lightbox" => Some(ModalId::Lightbox),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Modals {
    open: HashSet<ModalId>,
}

impl Modals {
    pub fn open(&mut self, id: ModalId) { self.open.insert(id); }
    pub fn close(&mut self, id: ModalId) { self.open.remove(&id); }
    pub fn is_open(&self, id: ModalId) -> bool { self.open.contains(&id) }

    /// Escape and backdrop clicks both close every open modal. Returns
    /// the modals that were closed.
    pub fn dismiss(&mut self) -> Vec<ModalId> {
        let mut closed: Vec<ModalId> = self.open.drain().collect();
        closed.sort_by_key(|m| m.element_id());
        closed
    }
}

// ---------------- Audio / video playback ----------------

pub const PLAY_ICON_PATH: &str = "M8 5v10l7-5z";
pub const PAUSE_ICON_PATH: &str = "M6 4h4v12H6V4zm8 0h4v12h-4V4z";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackChange {
    pub stopped: Option<usize>,
    pub started: Option<usize>,
}

/// At most one audio player is "playing" at a time.
#[derive(Debug, Clone, Default)]
pub struct Playback {
    current: Option<usize>,
}

impl Playback {
    pub fn toggle(&mut self, player: usize) -> PlaybackChange {
        match self.current {
            Some(p) if p == player => {
                self.current = None;
                PlaybackChange { stopped: Some(p), started: None }
            }
            previous => {
                self.current = Some(player);
                PlaybackChange { stopped: previous, started: Some(player) }
            }
        }
    }

    pub fn stop(&mut self, player: usize) -> bool {
        if self.current == Some(player) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn is_playing(&self, player: usize) -> bool { self.current == Some(player) }
    pub fn current(&self) -> Option<usize> { self.current }

    pub fn icon_path(&self, player: usize) -> &'static str {
        if self.is_playing(player) { PAUSE_ICON_PATH } else { PLAY_ICON_PATH }
    }
}

pub const VIDEO_PLAY_NOTICE: &str = "Video playback would start here";

// ---------------- Story cards ----------------

/// Per-card toggles. Likes are one-way: a liked card stays liked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardState {
    pub expanded: bool,
    pub comments_open: bool,
    pub liked: bool,
}

impl CardState {
    pub fn toggle_expanded(&mut self) -> &'static str {
        self.expanded = !self.expanded;
        self.read_more_label()
    }

    pub fn read_more_label(&self) -> &'static str {
        if self.expanded { "Read Less" } else { "Read More" }
    }

    pub fn toggle_comments(&mut self) -> bool {
        self.comments_open = !self.comments_open;
        self.comments_open
    }

    /// Returns true only on the first like.
    pub fn like(&mut self) -> bool {
        !std::mem::replace(&mut self.liked, true)
    }
}

// ---------------- Recording ----------------

pub const RECORDING_STARTED: &str = "Recording started...";
pub const RECORDING_STOPPED: &str = "Recording stopped. Audio saved.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recorder {
    recording: bool,
}

impl Recorder {
    pub fn with_state(recording: bool) -> Self {
        Self { recording }
    }

    /// Flips the state and returns the notice to show.
    pub fn toggle(&mut self) -> &'static str {
        self.recording = !self.recording;
        if self.recording { RECORDING_STARTED } else { RECORDING_STOPPED }
    }

    pub fn is_recording(&self) -> bool { self.recording }

    pub fn button_label(&self) -> &'static str {
        if self.recording { "Stop Recording" } else { "Start Recording" }
    }
}

// ---------------- Upload tabs ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadTab {
    #[default]
    Photo,
    Audio,
    Video,
}

impl UploadTab {
    pub const ALL: [UploadTab; 3] = [UploadTab::Photo, UploadTab::Audio, UploadTab::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadTab::Photo => "photo",
            UploadTab::Audio => "audio",
            UploadTab::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Element id of the section shown for this tab.
    pub fn section_id(&self) -> String {
        format!("{}-upload", self.as_str())
    }
}

// ---------------- Counter animation ----------------

pub const COUNTER_DURATION: Duration = Duration::from_millis(2000);
pub const COUNTER_TICK: Duration = Duration::from_millis(16);

/// Linear count-up from 0 to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAnimation {
    pub target: u64,
    pub duration: Duration,
    pub tick: Duration,
}

impl CounterAnimation {
    pub fn new(target: u64) -> Self {
        Self { target, duration: COUNTER_DURATION, tick: COUNTER_TICK }
    }

    pub fn value_at(&self, elapsed: Duration) -> u64 {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.target;
        }
        let fraction = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        ((self.target as f64) * fraction).floor() as u64
    }

    /// Values shown on each tick, ending exactly at `target`.
    pub fn frames(&self) -> Vec<u64> {
        if self.tick.is_zero() {
            return vec![self.target];
        }
        let ticks = (self.duration.as_millis() / self.tick.as_millis()).max(1) as u32;
        let mut out: Vec<u64> = (1..=ticks).map(|i| self.value_at(self.tick * i)).collect();
        if out.last() != Some(&self.target) {
            out.push(self.target);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;
    use chrono::Utc;

    fn photo(category: &str) -> Photo {
        Photo {
            id: 1,
            author_name: "A".into(),
            author_avatar: None,
            title: "T".into(),
            description: String::new(),
            category: category.into(),
            image_url: "/x".into(),
            likes: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filter_shows_exact_matches_only() {
        let items = vec![photo("A"), photo("B"), photo("C"), photo("B")];
        let vis = apply_filter(&items, &Filter::parse("B"));
        assert_eq!(vis, vec![Visibility::Hidden, Visibility::Shown, Visibility::Hidden, Visibility::Shown]);
        assert!(apply_filter(&items, &Filter::parse("all")).iter().all(|v| v.is_shown()));
        assert!(apply_filter(&items, &Filter::parse("Z")).iter().all(|v| !v.is_shown()));
    }

    #[test]
    fn filter_named_all_is_a_category() {
        let items = vec![photo("All"), photo("B")];
        assert_eq!(Filter::parse("All"), Filter::Only("All".into()));
        assert_eq!(apply_filter(&items, &Filter::parse("All")), vec![Visibility::Shown, Visibility::Hidden]);
        assert_eq!(Filter::parse("ALL"), Filter::Only("ALL".into()));
        let bar = FilterBar::new(["All".to_string()]);
        assert_eq!(bar.options().count(), 2);
    }

    #[test]
    fn media_filters_on_type() {
        let m = Media {
            id: 1,
            author_name: "A".into(),
            author_avatar: None,
            title: "T".into(),
            description: String::new(),
            media_type: MediaType::Audio,
            media_url: "/a".into(),
            likes: 0,
            created_at: Utc::now(),
        };
        assert_eq!(apply_filter(&[m.clone()], &Filter::parse("audio")), vec![Visibility::Shown]);
        assert_eq!(apply_filter(&[m], &Filter::parse("video")), vec![Visibility::Hidden]);
    }

    #[test]
    fn filter_bar_keeps_one_active() {
        let mut bar = FilterBar::new(tags(&[photo("Nature"), photo("Memorial"), photo("Nature")]));
        assert_eq!(bar.options().count(), 3);
        assert_eq!(bar.active(), &Filter::All);
        bar.select(Filter::parse("Memorial"));
        assert_eq!(bar.options().filter(|(_, active)| *active).count(), 1);
        assert_eq!(bar.active().as_str(), "Memorial");
        bar.select(Filter::parse("Family"));
        assert_eq!(bar.active().as_str(), "Family");
    }

    #[test]
    fn lightbox_wraps_both_ways() {
        let mut lb = Lightbox::new(3);
        assert_eq!(lb.open(2), Some(2));
        assert_eq!(lb.next(), Some(0));
        assert_eq!(lb.previous(), Some(2));
        assert_eq!(lb.open(0), Some(0));
        assert_eq!(lb.previous(), Some(2));
        assert_eq!(lb.step(Step::Stay), Some(2));
        assert_eq!(lb.step(Step::Next), Some(0));
        for start in 0..3 {
            lb.open(start);
            lb.next();
            assert_eq!(lb.previous(), Some(start));
        }
    }

    #[test]
    fn lightbox_out_of_range_and_empty() {
        let mut lb = Lightbox::new(2);
        assert_eq!(lb.open(9), Some(0));
        let mut empty = Lightbox::new(0);
        assert_eq!(empty.open(0), None);
        assert_eq!(empty.next(), None);
        assert!(!empty.is_open());
    }

    #[test]
    fn escape_closes_every_modal() {
        let mut m = Modals::default();
        m.open(ModalId::Story);
        m.open(ModalId::Lightbox);
        let closed = m.dismiss();
        assert_eq!(closed, vec![ModalId::Lightbox, ModalId::Story]);
        assert!(!m.is_open(ModalId::Story));
        assert!(m.dismiss().is_empty());
        assert_eq!(ModalId::parse("upload"), Some(ModalId::Upload));
        assert_eq!(ModalId::parse("Story"), None);
    }

    #[test]
    fn only_one_player_at_a_time() {
        let mut p = Playback::default();
        assert_eq!(p.toggle(1), PlaybackChange { stopped: None, started: Some(1) });
        assert_eq!(p.toggle(2), PlaybackChange { stopped: Some(1), started: Some(2) });
        assert!(!p.is_playing(1));
        assert!(p.is_playing(2));
        assert_eq!(p.icon_path(2), PAUSE_ICON_PATH);
        assert_eq!(p.icon_path(1), PLAY_ICON_PATH);
        assert_eq!(p.toggle(2), PlaybackChange { stopped: Some(2), started: None });
        assert_eq!(p.current(), None);
    }

    #[test]
    fn card_toggles() {
        let mut c = CardState::default();
        assert_eq!(c.toggle_expanded(), "Read Less");
        assert_eq!(c.toggle_expanded(), "Read More");
        assert!(c.toggle_comments());
        assert!(!c.toggle_comments());
        assert!(c.like());
        assert!(!c.like());
        assert!(c.liked);
    }

    #[test]
    fn recorder_and_tabs() {
        let mut r = Recorder::default();
        assert_eq!(r.toggle(), RECORDING_STARTED);
        assert_eq!(r.button_label(), "Stop Recording");
        assert_eq!(r.toggle(), RECORDING_STOPPED);
        assert!(Recorder::with_state(true).is_recording());
        assert_eq!(UploadTab::parse("audio").map(|t| t.section_id()), Some("audio-upload".to_string()));
        assert_eq!(UploadTab::parse("text"), None);
    }

    #[test]
    fn counter_interpolates_linearly() {
        let c = CounterAnimation::new(1000);
        assert_eq!(c.value_at(Duration::ZERO), 0);
        assert_eq!(c.value_at(Duration::from_millis(1000)), 500);
        assert_eq!(c.value_at(Duration::from_millis(5000)), 1000);
        let frames = c.frames();
        assert_eq!(frames.len(), 125);
        assert_eq!(*frames.last().unwrap(), 1000);
        assert!(frames.windows(2).all(|w| w[0] <= w[1]));
    }
}
