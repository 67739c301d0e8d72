//! Theme settings shared by every slide, plus per-slide override resolution.

use deckforge_shared::constants::{
    ANIMATION_SPEED_RANGE, BORDER_RADIUS_RANGE, FONT_SIZE_RANGE, SHADOW_INTENSITY_RANGE,
    SPACING_RANGE,
};
use deckforge_shared::{DesignSettings, SlideRecord, TransitionKind};

/// Style a slide actually renders with once its overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveStyle {
    pub background: Option<String>,
    pub transition: TransitionKind,
    pub font_family: String,
    pub title_font_size: u32,
    pub content_font_size: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DesignSettingsStore {
    settings: DesignSettings,
}

impl DesignSettingsStore {
    pub fn new(settings: DesignSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DesignSettings {
        &self.settings
    }

    pub fn replace(&mut self, settings: DesignSettings) {
        self.settings = settings;
    }

    pub fn reset(&mut self) {
        self.settings = DesignSettings::default();
    }

    pub fn set_primary_color(&mut self, color: impl Into<String>) {
        self.settings.primary_color = color.into();
    }

    pub fn set_secondary_color(&mut self, color: impl Into<String>) {
        self.settings.secondary_color = color.into();
    }

    pub fn set_accent_color(&mut self, color: impl Into<String>) {
        self.settings.accent_color = color.into();
    }

    pub fn set_font_family(&mut self, font: impl Into<String>) {
        self.settings.font_family = font.into();
    }

    pub fn set_title_font_size(&mut self, px: u32) {
        self.settings.title_font_size = clamp_u32(px, FONT_SIZE_RANGE);
    }

    pub fn set_content_font_size(&mut self, px: u32) {
        self.settings.content_font_size = clamp_u32(px, FONT_SIZE_RANGE);
    }

    pub fn set_spacing(&mut self, px: u32) {
        self.settings.spacing = clamp_u32(px, SPACING_RANGE);
    }

    pub fn set_animation_speed(&mut self, secs: f32) {
        let (lo, hi) = ANIMATION_SPEED_RANGE;
        // NaN from a broken slider keeps the old value
        if secs.is_finite() {
            self.settings.animation_speed = secs.clamp(lo, hi);
        }
    }

    pub fn set_background_image(&mut self, image: Option<String>) {
        self.settings.background_image = image.filter(|s| !s.trim().is_empty());
    }

    pub fn set_transition(&mut self, transition: TransitionKind) {
        self.settings.transition = transition;
    }

    pub fn set_border_radius(&mut self, px: u32) {
        self.settings.border_radius = clamp_u32(px, BORDER_RADIUS_RANGE);
    }

    pub fn set_shadow_intensity(&mut self, value: u32) {
        self.settings.shadow_intensity = clamp_u32(value, SHADOW_INTENSITY_RANGE);
    }

    pub fn resolve(&self, slide: &SlideRecord) -> EffectiveStyle {
        resolve_style(&self.settings, slide)
    }
}

/// Per-slide `background`, `transition` and `fontFamily` win; anything unset
/// falls back to the theme.
pub fn resolve_style(settings: &DesignSettings, slide: &SlideRecord) -> EffectiveStyle {
    EffectiveStyle {
        background: slide
            .background
            .clone()
            .or_else(|| settings.background_image.clone()),
        transition: slide.transition.unwrap_or(settings.transition),
        font_family: slide
            .font_family
            .clone()
            .unwrap_or_else(|| settings.font_family.clone()),
        title_font_size: settings.title_font_size,
        content_font_size: settings.content_font_size,
    }
}

fn clamp_u32(value: u32, (lo, hi): (u32, u32)) -> u32 {
    value.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_take_precedence() {
        let mut store = DesignSettingsStore::default();
        store.set_font_family("Roboto");
        store.set_background_image(Some("hero.png".into()));

        let plain = SlideRecord::default();
        let style = store.resolve(&plain);
        assert_eq!(style.font_family, "Roboto");
        assert_eq!(style.background.as_deref(), Some("hero.png"));
        assert_eq!(style.transition, TransitionKind::Slide);

        let mut custom = SlideRecord::default();
        custom.font_family = Some("Georgia".into());
        custom.background = Some("#000".into());
        custom.transition = Some(TransitionKind::Fade);
        let style = store.resolve(&custom);
        assert_eq!(style.font_family, "Georgia");
        assert_eq!(style.background.as_deref(), Some("#000"));
        assert_eq!(style.transition, TransitionKind::Fade);
    }

    #[test]
    fn numeric_setters_clamp_to_slider_range() {
        let mut store = DesignSettingsStore::default();
        store.set_title_font_size(500);
        store.set_content_font_size(1);
        store.set_shadow_intensity(1000);
        store.set_animation_speed(f32::NAN);

        let s = store.settings();
        assert_eq!(s.title_font_size, FONT_SIZE_RANGE.1);
        assert_eq!(s.content_font_size, FONT_SIZE_RANGE.0);
        assert_eq!(s.shadow_intensity, 100);
        assert_eq!(s.animation_speed, DesignSettings::default().animation_speed);
    }

    #[test]
    fn blank_background_image_clears() {
        let mut store = DesignSettingsStore::default();
        store.set_background_image(Some("  ".into()));
        assert!(store.settings().background_image.is_none());
    }
}
