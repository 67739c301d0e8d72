//! Present mode for a terminal: prints every slide read-only, one after another.

use futures::future::BoxFuture;
use tracing::debug;

use deckforge_engine::layout::{LayoutRegistry, RenderMode};
use deckforge_engine::presentation::{
    EngineFactory, EngineInitError, PresentationEngine, PresentationHandoff,
};

pub struct TerminalPresenter {
    layouts: LayoutRegistry,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self {
            layouts: LayoutRegistry::builtin(),
        }
    }

    /// Render the handed-over deck into printable text.
    pub fn render(&self, handoff: &PresentationHandoff) -> String {
        let rule = "-".repeat(handoff.dimensions.width.clamp(20, 1280) as usize / 16);
        let compositions =
            self.layouts
                .render_deck(&handoff.slides, &handoff.design_settings, RenderMode::ReadOnly);

        let mut out = String::new();
        for (i, composition) in compositions.iter().enumerate() {
            out.push_str(&format!("{rule} {}/{}\n", i + 1, compositions.len()));
            for region in &composition.regions {
                let text = plain_text(&region.html);
                if !text.is_empty() {
                    out.push_str(&text);
                    out.push('\n');
                }
            }
        }
        out.push_str(&rule);
        out.push('\n');
        out
    }
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for TerminalPresenter {
    fn create(&self, handoff: PresentationHandoff) -> Box<dyn PresentationEngine> {
        Box::new(TerminalShow {
            text: self.render(&handoff),
            handoff,
            live: false,
        })
    }
}

struct TerminalShow {
    handoff: PresentationHandoff,
    text: String,
    live: bool,
}

impl PresentationEngine for TerminalShow {
    fn initialize(&mut self) -> BoxFuture<'_, Result<(), EngineInitError>> {
        Box::pin(async move {
            let dims = self.handoff.dimensions;
            if dims.width == 0 || dims.height == 0 {
                return Err(format!("presentation area is {}x{}", dims.width, dims.height).into());
            }
            println!("{}", self.text);
            self.live = true;
            Ok(())
        })
    }

    fn destroy(&mut self) {
        if self.live {
            debug!(slides = self.handoff.slides.len(), "terminal presentation closed");
            self.live = false;
        }
    }
}

/// Strip markup from stored slide HTML for terminal output.
pub fn plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                if !out.ends_with(' ') && !out.is_empty() {
                    out.push(' ');
                }
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
