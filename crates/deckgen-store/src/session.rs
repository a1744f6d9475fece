use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use deckgen_core::ids::{PresentationId, SlideId};

/// What kind of content a slide holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Table,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Table => write!(f, "table"),
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "table" => Ok(Self::Table),
            other => Err(format!("unknown content type: {other}")),
        }
    }
}

/// Context retained for one generated slide. Fed back into prompts for
/// later slides of the same presentation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlideContext {
    pub slide_id: SlideId,
    /// Caller-assigned ordering hint; gaps and duplicates are not validated.
    pub slide_number: i64,
    pub slide_title: Option<String>,
    /// Compact summary of the generated output.
    pub content_summary: String,
    /// Main themes covered, at most three.
    pub key_themes: Vec<String>,
    pub content_type: ContentType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlideContext {
    pub fn new(
        slide_id: SlideId,
        slide_number: i64,
        slide_title: Option<String>,
        content_summary: String,
        key_themes: Vec<String>,
        content_type: ContentType,
    ) -> Self {
        let now = Utc::now();
        Self {
            slide_id,
            slide_number,
            slide_title,
            content_summary,
            key_themes,
            content_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Continuity state for one presentation, owned by the session store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionContext {
    pub presentation_id: PresentationId,
    /// Set once at creation; later requests never overwrite these.
    pub presentation_theme: Option<String>,
    pub target_audience: Option<String>,
    /// Insertion order equals call order, not slide_number order.
    pub slide_history: Vec<SlideContext>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation; expiry slides with it.
    pub last_updated: DateTime<Utc>,
    pub ttl_seconds: u64,
    /// Lifetime append counter; not capped by history truncation.
    pub total_slides_generated: u64,
}

impl SessionContext {
    pub fn new(
        presentation_id: PresentationId,
        presentation_theme: Option<String>,
        target_audience: Option<String>,
        ttl_seconds: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            presentation_id,
            presentation_theme,
            target_audience,
            slide_history: Vec::new(),
            created_at: now,
            last_updated: now,
            ttl_seconds,
            total_slides_generated: 0,
        }
    }

    /// Append a slide, replacing any prior entry with the same slide_id.
    /// A replacement keeps the prior entry's position and created_at, and
    /// refreshes updated_at. History is truncated to the most recent
    /// `max_history` entries afterwards.
    pub fn upsert_slide(&mut self, mut slide: SlideContext, max_history: usize) {
        match self
            .slide_history
            .iter_mut()
            .find(|existing| existing.slide_id == slide.slide_id)
        {
            Some(existing) => {
                slide.created_at = existing.created_at;
                slide.updated_at = Utc::now();
                *existing = slide;
            }
            None => {
                self.slide_history.push(slide);
                if self.slide_history.len() > max_history {
                    let excess = self.slide_history.len() - max_history;
                    self.slide_history.drain(..excess);
                }
            }
        }
        self.total_slides_generated += 1;
        self.touch();
    }

    /// Refresh last_updated, keeping it monotonically non-decreasing even
    /// if the wall clock steps backwards.
    pub fn touch(&mut self) {
        self.last_updated = self.last_updated.max(Utc::now());
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.last_updated).num_seconds();
        elapsed > self.ttl_seconds as i64
    }

    /// Seconds until expiry, clamped at zero.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = now.signed_duration_since(self.last_updated).num_seconds();
        if elapsed <= 0 {
            return self.ttl_seconds;
        }
        self.ttl_seconds.saturating_sub(elapsed as u64)
    }

    /// Digest of the most recent `max_slides` entries, in chronological
    /// order, for injection into generation prompts.
    pub fn context_summary(&self, max_slides: usize) -> String {
        if self.slide_history.is_empty() || max_slides == 0 {
            return first_slide_sentinel();
        }

        let mut parts = Vec::new();

        if let Some(theme) = &self.presentation_theme {
            parts.push(format!("Presentation theme: {theme}"));
        }
        if let Some(audience) = &self.target_audience {
            parts.push(format!("Target audience: {audience}"));
        }

        parts.push("\nPrevious slides covered:".to_string());
        let start = self.slide_history.len().saturating_sub(max_slides);
        for slide in &self.slide_history[start..] {
            let title = slide.slide_title.as_deref().unwrap_or("untitled");
            let mut line = format!(
                "  - Slide {} ({}): {}",
                slide.slide_number, title, slide.content_summary
            );
            if !slide.key_themes.is_empty() {
                line.push_str(&format!(" [themes: {}]", slide.key_themes.join(", ")));
            }
            parts.push(line);
        }

        parts.join("\n")
    }
}

/// Returned instead of a digest when there is no history to summarize.
pub fn first_slide_sentinel() -> String {
    "This is the first slide in the presentation.".to_string()
}
