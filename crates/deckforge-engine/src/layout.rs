//! Slide layouts and how each one turns a slide into visual regions.
//!
//! Every layout has one title region and zero, one or two content regions.
//! The rest of the engine only talks to [`LayoutRegistry`], so adding a layout
//! is a single [`LayoutRegistry::register`] call.

use std::collections::HashMap;

use deckforge_shared::{DesignSettings, LayoutId, SlideRecord};

use crate::design::{resolve_style, EffectiveStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Authoring: regions are bound back to slide fields.
    Editable,
    /// Presentation / export: stored HTML verbatim.
    ReadOnly,
}

/// Text fields of a slide that a region can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideField {
    Title,
    Content,
    SecondaryContent,
}

/// Where edited HTML for a region has to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBinding {
    pub slide_index: usize,
    pub field: SlideField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRole {
    Title,
    Body,
    LeftColumn,
    RightColumn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub role: RegionRole,
    pub html: String,
    pub font_family: String,
    pub font_size: u32,
    /// Set in [`RenderMode::Editable`] only.
    pub binding: Option<FieldBinding>,
}

/// The rendered form of one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub layout: LayoutId,
    pub style: EffectiveStyle,
    pub regions: Vec<Region>,
}

impl Composition {
    pub fn title(&self) -> Option<&Region> {
        self.regions.iter().find(|r| r.role == RegionRole::Title)
    }

    pub fn content_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.role != RegionRole::Title)
    }
}

/// Inputs a renderer needs besides the slide itself.
pub struct RenderContext<'a> {
    pub slide_index: usize,
    pub mode: RenderMode,
    pub style: &'a EffectiveStyle,
}

impl RenderContext<'_> {
    pub fn title_region(&self, slide: &SlideRecord) -> Region {
        self.region(RegionRole::Title, SlideField::Title, &slide.title, self.style.title_font_size)
    }

    pub fn content_region(&self, role: RegionRole, field: SlideField, html: &str) -> Region {
        self.region(role, field, html, self.style.content_font_size)
    }

    fn region(&self, role: RegionRole, field: SlideField, html: &str, font_size: u32) -> Region {
        let binding = match self.mode {
            RenderMode::Editable => Some(FieldBinding {
                slide_index: self.slide_index,
                field,
            }),
            RenderMode::ReadOnly => None,
        };
        Region {
            role,
            html: html.to_string(),
            font_family: self.style.font_family.clone(),
            font_size,
            binding,
        }
    }
}

pub trait LayoutRenderer: Send + Sync {
    /// Human-readable name for layout pickers.
    fn label(&self) -> &str;

    fn compose(&self, slide: &SlideRecord, ctx: &RenderContext<'_>) -> Vec<Region>;
}

struct TitleOnly;

impl LayoutRenderer for TitleOnly {
    fn label(&self) -> &str {
        "Title only"
    }

    fn compose(&self, slide: &SlideRecord, ctx: &RenderContext<'_>) -> Vec<Region> {
        vec![ctx.title_region(slide)]
    }
}

struct TitleContent;

impl LayoutRenderer for TitleContent {
    fn label(&self) -> &str {
        "Title and content"
    }

    fn compose(&self, slide: &SlideRecord, ctx: &RenderContext<'_>) -> Vec<Region> {
        vec![
            ctx.title_region(slide),
            ctx.content_region(RegionRole::Body, SlideField::Content, &slide.content),
        ]
    }
}

struct TwoContent;

impl LayoutRenderer for TwoContent {
    fn label(&self) -> &str {
        "Two columns"
    }

    fn compose(&self, slide: &SlideRecord, ctx: &RenderContext<'_>) -> Vec<Region> {
        vec![
            ctx.title_region(slide),
            ctx.content_region(RegionRole::LeftColumn, SlideField::Content, &slide.content),
            ctx.content_region(
                RegionRole::RightColumn,
                SlideField::SecondaryContent,
                &slide.secondary_content,
            ),
        ]
    }
}

pub struct LayoutRegistry {
    renderers: HashMap<LayoutId, Box<dyn LayoutRenderer>>,
}

impl LayoutRegistry {
    /// An empty registry. Use [`LayoutRegistry::builtin`] for the stock layouts.
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(LayoutId::TITLE_ONLY, TitleOnly);
        registry.register(LayoutId::TITLE_CONTENT, TitleContent);
        registry.register(LayoutId::TWO_CONTENT, TwoContent);
        registry
    }

    /// Add a layout, replacing any renderer already registered under `id`.
    pub fn register(&mut self, id: LayoutId, renderer: impl LayoutRenderer + 'static) {
        self.renderers.insert(id, Box::new(renderer));
    }

    pub fn contains(&self, id: &LayoutId) -> bool {
        self.renderers.contains_key(id)
    }

    /// Registered layouts with their labels, sorted by id.
    pub fn layouts(&self) -> Vec<(LayoutId, String)> {
        let mut layouts: Vec<_> = self
            .renderers
            .iter()
            .map(|(id, r)| (id.clone(), r.label().to_string()))
            .collect();
        layouts.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        layouts
    }

    fn renderer_for(&self, id: &LayoutId) -> Option<&dyn LayoutRenderer> {
        if let Some(renderer) = self.renderers.get(id) {
            return Some(&**renderer);
        }
        tracing::warn!(layout = %id, "unknown layout, rendering as title-content");
        self.renderers
            .get(&LayoutId::TITLE_CONTENT)
            .map(|r| &**r)
    }

    pub fn render(
        &self,
        slide: &SlideRecord,
        slide_index: usize,
        settings: &DesignSettings,
        mode: RenderMode,
    ) -> Composition {
        let style = resolve_style(settings, slide);
        let regions = match self.renderer_for(&slide.layout) {
            Some(renderer) => {
                let ctx = RenderContext {
                    slide_index,
                    mode,
                    style: &style,
                };
                renderer.compose(slide, &ctx)
            }
            None => Vec::new(),
        };
        Composition {
            layout: slide.layout.clone(),
            style,
            regions,
        }
    }

    pub fn render_deck(
        &self,
        slides: &[SlideRecord],
        settings: &DesignSettings,
        mode: RenderMode,
    ) -> Vec<Composition> {
        slides
            .iter()
            .enumerate()
            .map(|(i, s)| self.render(s, i, settings, mode))
            .collect()
    }

    /// Fields a layout lets the user edit, in region order.
    pub fn editable_fields(&self, layout: &LayoutId) -> Vec<SlideField> {
        let probe = SlideRecord::default().with_layout(layout.clone());
        self.render(&probe, 0, &DesignSettings::default(), RenderMode::Editable)
            .regions
            .into_iter()
            .filter_map(|r| r.binding.map(|b| b.field))
            .collect()
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
