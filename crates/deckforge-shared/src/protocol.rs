use serde::{Deserialize, Serialize};

use crate::error::DeckError;
use crate::types::{LayoutId, SlideRecord};

/// Structured pitch description sent to the slide-generation service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PitchDescription {
    pub title: String,
    pub summary: String,
    pub industry: String,
    pub stage: String,
    pub target_market: String,
}

impl PitchDescription {
    pub fn to_json(&self) -> Result<String, DeckError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One slide as returned by the generation service.
///
/// Only `title` and `content` are required; everything else is optional so
/// that partial responses still deserialize and get validated downstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSlide {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub secondary_content: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
}

impl GeneratedSlide {
    /// Convert into a slide record. Unknown or malformed layout names fall
    /// back to `title-content`.
    pub fn into_record(self) -> SlideRecord {
        let layout = self
            .layout
            .as_deref()
            .and_then(|l| LayoutId::parse(l).ok())
            .unwrap_or_default();
        let mut record = SlideRecord::new(self.title, self.content).with_layout(layout);
        record.secondary_content = self.secondary_content.unwrap_or_default();
        record
    }
}
