use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{NEW_SLIDE_CONTENT, NEW_SLIDE_TITLE};
use crate::error::DeckError;

/// HTML-bearing text produced by the rich-text editor.
pub type RichText = String;

// Deck identity = backend presentation id, or a fresh UUID for local drafts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DeckId(String);

impl DeckId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn parse(s: &str) -> Result<Self, DeckError> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(DeckError::InvalidDeckId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl Default for DeckId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// Name of a slide layout.
///
/// Kept as an open string set so that new layouts only need a registry entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LayoutId(Cow<'static, str>);

impl LayoutId {
    pub const TITLE_ONLY: LayoutId = LayoutId(Cow::Borrowed("title-only"));
    pub const TITLE_CONTENT: LayoutId = LayoutId(Cow::Borrowed("title-content"));
    pub const TWO_CONTENT: LayoutId = LayoutId(Cow::Borrowed("two-content"));

    /// Parse a layout id. Ids are lowercase ASCII words joined by `-`.
    pub fn parse(s: &str) -> Result<Self, DeckError> {
        let valid = !s.is_empty()
            && !s.starts_with('-')
            && !s.ends_with('-')
            && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(DeckError::InvalidLayout(s.to_string()));
        }
        Ok(Self(Cow::Owned(s.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LayoutId {
    fn default() -> Self {
        Self::TITLE_CONTENT
    }
}

impl std::fmt::Display for LayoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    None,
    #[default]
    Slide,
    Fade,
    Convex,
    Concave,
    Zoom,
}

impl TransitionKind {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "slide" => Some(Self::Slide),
            "fade" => Some(Self::Fade),
            "convex" => Some(Self::Convex),
            "concave" => Some(Self::Concave),
            "zoom" => Some(Self::Zoom),
            _ => None,
        }
    }
}

/// A single slide: text regions, layout and optional style overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlideRecord {
    pub title: RichText,
    pub content: RichText,
    /// Second column body, only shown by `two-content`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secondary_content: RichText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default)]
    pub layout: LayoutId,
}

impl SlideRecord {
    pub fn new(title: impl Into<RichText>, content: impl Into<RichText>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            secondary_content: RichText::new(),
            background: None,
            transition: None,
            font_family: None,
            layout: LayoutId::TITLE_CONTENT,
        }
    }

    pub fn with_layout(mut self, layout: LayoutId) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for SlideRecord {
    fn default() -> Self {
        Self::new(NEW_SLIDE_TITLE, NEW_SLIDE_CONTENT)
    }
}

/// Theme-wide presentation settings shared by all slides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignSettings {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub font_family: String,
    /// Pixels.
    pub title_font_size: u32,
    /// Pixels.
    pub content_font_size: u32,
    /// Gap between blocks, pixels.
    pub spacing: u32,
    /// Seconds per transition.
    pub animation_speed: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    pub transition: TransitionKind,
    pub border_radius: u32,
    /// 0..=100
    pub shadow_intensity: u32,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            primary_color: "#1e293b".into(),
            secondary_color: "#64748b".into(),
            accent_color: "#3b82f6".into(),
            font_family: "Inter".into(),
            title_font_size: 40,
            content_font_size: 20,
            spacing: 16,
            animation_speed: 0.8,
            background_image: None,
            transition: TransitionKind::Slide,
            border_radius: 8,
            shadow_intensity: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_id_parse() {
        assert_eq!(LayoutId::parse("two-content").unwrap(), LayoutId::TWO_CONTENT);
        assert!(LayoutId::parse("").is_err());
        assert!(LayoutId::parse("Two Content").is_err());
        assert!(LayoutId::parse("-x").is_err());
    }

    #[test]
    fn slide_record_json_shape() {
        let slide = SlideRecord::new("<h1>Hi</h1>", "<p>Body</p>").with_layout(LayoutId::TITLE_ONLY);
        let json = serde_json::to_value(&slide).unwrap();
        assert_eq!(json["layout"], "title-only");
        assert!(json.get("secondaryContent").is_none());
        assert!(json.get("fontFamily").is_none());

        // Older blobs carry no layout at all.
        let legacy: SlideRecord =
            serde_json::from_str(r#"{"title":"a","content":"b"}"#).unwrap();
        assert_eq!(legacy.layout, LayoutId::TITLE_CONTENT);
    }

    #[test]
    fn deck_id_rejects_blank() {
        assert!(DeckId::parse("   ").is_err());
        assert!(DeckId::parse("a b").is_err());
        assert_eq!(DeckId::parse(" pitch-42 ").unwrap().as_str(), "pitch-42");
        assert_eq!(DeckId::parse("abc").unwrap().short(), "abc");
    }
}
