//! Prompt commands: parsing one input line and running it against the engine.
//!
//! Slide numbers typed at the prompt are 1-based.

use std::fmt::Write as _;

use deckforge_engine::design::DesignSettingsStore;
use deckforge_engine::layout::{RenderMode, SlideField};
use deckforge_engine::{DeckEngine, PresentOutcome, SlideEdit};
use deckforge_shared::protocol::PitchDescription;
use deckforge_shared::{DeckId, LayoutId, TransitionKind};

use crate::error::CommandError;
use crate::terminal::plain_text;

pub const HELP: &str = "\
commands:
  list | show                        slides overview / current slide
  add | delete N | dup N | goto N    slide management
  title N <html> | content N <html> | right N <html>
  layout N <id> | layouts            change / list layouts
  transition N <name|default>        per-slide transition override
  background N <css|default>         per-slide background override
  theme <setting> <value> | theme reset
  note N <text>                      speaker note (empty clears)
  undo | redo
  generate title | summary | industry | stage | market
  present | exit
  save | open <deck-id> | decks
  notices | dismiss ID | retry ID
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ThemeChange {
    PrimaryColor(String),
    SecondaryColor(String),
    AccentColor(String),
    FontFamily(String),
    TitleFontSize(u32),
    ContentFontSize(u32),
    Spacing(u32),
    AnimationSpeed(f32),
    BackgroundImage(Option<String>),
    Transition(TransitionKind),
    BorderRadius(u32),
    ShadowIntensity(u32),
    Reset,
}

impl ThemeChange {
    fn apply(self, design: &mut DesignSettingsStore) {
        match self {
            ThemeChange::PrimaryColor(v) => design.set_primary_color(v),
            ThemeChange::SecondaryColor(v) => design.set_secondary_color(v),
            ThemeChange::AccentColor(v) => design.set_accent_color(v),
            ThemeChange::FontFamily(v) => design.set_font_family(v),
            ThemeChange::TitleFontSize(v) => design.set_title_font_size(v),
            ThemeChange::ContentFontSize(v) => design.set_content_font_size(v),
            ThemeChange::Spacing(v) => design.set_spacing(v),
            ThemeChange::AnimationSpeed(v) => design.set_animation_speed(v),
            ThemeChange::BackgroundImage(v) => design.set_background_image(v),
            ThemeChange::Transition(v) => design.set_transition(v),
            ThemeChange::BorderRadius(v) => design.set_border_radius(v),
            ThemeChange::ShadowIntensity(v) => design.set_shadow_intensity(v),
            ThemeChange::Reset => design.reset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Show,
    Add,
    Delete(usize),
    Duplicate(usize),
    Goto(usize),
    Text {
        index: usize,
        field: SlideField,
        html: String,
    },
    Layout {
        index: usize,
        layout: LayoutId,
    },
    Transition {
        index: usize,
        transition: Option<TransitionKind>,
    },
    Background {
        index: usize,
        background: Option<String>,
    },
    Layouts,
    Theme(ThemeChange),
    Note {
        index: usize,
        text: String,
    },
    Undo,
    Redo,
    Generate(PitchDescription),
    Present,
    Exit,
    Save,
    Open(DeckId),
    Decks,
    Notices,
    Dismiss(u64),
    Retry(u64),
    Help,
    Quit,
}

impl Command {
    /// Parse one prompt line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = split_word(line);

        let command = match verb {
            "list" | "ls" => Command::List,
            "show" => Command::Show,
            "add" => Command::Add,
            "delete" | "rm" => Command::Delete(slide_arg(rest, "delete N")?),
            "dup" => Command::Duplicate(slide_arg(rest, "dup N")?),
            "goto" => Command::Goto(slide_arg(rest, "goto N")?),
            "title" | "content" | "right" => {
                let field = match verb {
                    "title" => SlideField::Title,
                    "content" => SlideField::Content,
                    _ => SlideField::SecondaryContent,
                };
                let (index, html) = slide_and_text(rest, "title|content|right N <html>")?;
                Command::Text { index, field, html }
            }
            "layout" => {
                let (index, id) = slide_and_text(rest, "layout N <id>")?;
                Command::Layout {
                    index,
                    layout: LayoutId::parse(&id)?,
                }
            }
            "transition" => {
                let (index, name) = slide_and_text(rest, "transition N <name|default>")?;
                let transition = match name.as_str() {
                    "default" => None,
                    other => Some(
                        TransitionKind::from_name(other)
                            .ok_or_else(|| CommandError::UnknownTransition(other.to_string()))?,
                    ),
                };
                Command::Transition { index, transition }
            }
            "background" => {
                let (index, css) = slide_and_text(rest, "background N <css|default>")?;
                let background = (css != "default").then_some(css);
                Command::Background { index, background }
            }
            "layouts" => Command::Layouts,
            "theme" => Command::Theme(theme_change(rest)?),
            "note" => {
                let (index, text) = split_word(rest);
                Command::Note {
                    index: parse_slide(index, "note N <text>")?,
                    text: text.to_string(),
                }
            }
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "generate" => Command::Generate(pitch(rest)?),
            "present" => Command::Present,
            "exit" => Command::Exit,
            "save" => Command::Save,
            "open" => Command::Open(DeckId::parse(rest)?),
            "decks" => Command::Decks,
            "notices" => Command::Notices,
            "dismiss" => Command::Dismiss(number(rest, "dismiss ID")?),
            "retry" => Command::Retry(number(rest, "retry ID")?),
            "help" | "?" => Command::Help,
            "quit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn parse_slide(s: &str, usage: &'static str) -> Result<usize, CommandError> {
    if s.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::BadSlide(s.to_string())),
    }
}

fn slide_arg(rest: &str, usage: &'static str) -> Result<usize, CommandError> {
    parse_slide(rest, usage)
}

fn slide_and_text(rest: &str, usage: &'static str) -> Result<(usize, String), CommandError> {
    let (index, text) = split_word(rest);
    let index = parse_slide(index, usage)?;
    if text.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok((index, text.to_string()))
}

fn number<T: std::str::FromStr>(s: &str, usage: &'static str) -> Result<T, CommandError> {
    if s.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    s.parse().map_err(|_| CommandError::BadNumber(s.to_string()))
}

fn theme_change(rest: &str) -> Result<ThemeChange, CommandError> {
    const USAGE: &str = "theme <setting> <value> | theme reset";
    let (setting, value) = split_word(rest);
    if setting == "reset" {
        return Ok(ThemeChange::Reset);
    }
    if setting.is_empty() || value.is_empty() {
        return Err(CommandError::Usage(USAGE));
    }
    let value_string = value.to_string();

    let change = match setting {
        "primary" => ThemeChange::PrimaryColor(value_string),
        "secondary" => ThemeChange::SecondaryColor(value_string),
        "accent" => ThemeChange::AccentColor(value_string),
        "font" => ThemeChange::FontFamily(value_string),
        "title-size" => ThemeChange::TitleFontSize(number(value, USAGE)?),
        "content-size" => ThemeChange::ContentFontSize(number(value, USAGE)?),
        "spacing" => ThemeChange::Spacing(number(value, USAGE)?),
        "speed" => ThemeChange::AnimationSpeed(number(value, USAGE)?),
        "background" => ThemeChange::BackgroundImage((value != "none").then_some(value_string)),
        "transition" => ThemeChange::Transition(
            TransitionKind::from_name(value)
                .ok_or_else(|| CommandError::UnknownTransition(value_string))?,
        ),
        "radius" => ThemeChange::BorderRadius(number(value, USAGE)?),
        "shadow" => ThemeChange::ShadowIntensity(number(value, USAGE)?),
        other => return Err(CommandError::UnknownSetting(other.to_string())),
    };
    Ok(change)
}

fn pitch(rest: &str) -> Result<PitchDescription, CommandError> {
    let mut parts = rest.split('|').map(str::trim);
    let mut next = || parts.next().unwrap_or_default().to_string();
    let pitch = PitchDescription {
        title: next(),
        summary: next(),
        industry: next(),
        stage: next(),
        target_market: next(),
    };
    if pitch.title.is_empty() {
        return Err(CommandError::Usage(
            "generate title | summary | industry | stage | market",
        ));
    }
    Ok(pitch)
}

/// Run a parsed command and return the text to print.
///
/// Failures that the engine already turned into a notice are reported
/// inline; only store errors bubble up.
pub async fn execute(engine: &DeckEngine, command: Command) -> anyhow::Result<String> {
    let mut out = String::new();
    match command {
        Command::List => list_slides(engine, &mut out),
        Command::Show => show_current(engine, &mut out),
        Command::Add => {
            let index = engine.edit(|s| s.add_slide());
            let _ = writeln!(out, "added slide {}", index + 1);
        }
        Command::Delete(index) => match engine.edit(|s| s.delete_slide(index)) {
            Ok(()) => list_slides(engine, &mut out),
            Err(e) => {
                let _ = writeln!(out, "{e}");
            }
        },
        Command::Duplicate(index) => match engine.edit(|s| s.duplicate_slide(index)) {
            Ok(copy) => {
                let _ = writeln!(out, "slide {} duplicated as {}", index + 1, copy + 1);
            }
            Err(e) => {
                let _ = writeln!(out, "{e}");
            }
        },
        Command::Goto(index) => {
            if engine.edit(|s| s.set_current_slide(index)) {
                show_current(engine, &mut out);
            } else {
                let _ = writeln!(out, "no slide {}", index + 1);
            }
        }
        Command::Text { index, field, html } => {
            update(engine, index, SlideEdit::text(field, html), &mut out)
        }
        Command::Layout { index, layout } => {
            if !engine.layouts().contains(&layout) {
                let _ = writeln!(out, "unknown layout {layout}, see `layouts`");
            } else {
                update(engine, index, SlideEdit::Layout(layout), &mut out);
            }
        }
        Command::Transition { index, transition } => {
            update(engine, index, SlideEdit::Transition(transition), &mut out)
        }
        Command::Background { index, background } => {
            update(engine, index, SlideEdit::Background(background), &mut out)
        }
        Command::Layouts => {
            for (id, label) in engine.layouts().layouts() {
                let _ = writeln!(out, "  {id:<14} {label}");
            }
        }
        Command::Theme(change) => {
            engine.edit(|s| s.edit_design(|d| change.apply(d)));
            let design = engine.read(|s| s.design().clone());
            let _ = writeln!(
                out,
                "theme: {} / {} / {}, {} {}px/{}px, {:?}",
                design.primary_color,
                design.secondary_color,
                design.accent_color,
                design.font_family,
                design.title_font_size,
                design.content_font_size,
                design.transition,
            );
        }
        Command::Note { index, text } => {
            if engine.edit(|s| s.set_note(index, text)) {
                let _ = writeln!(out, "note updated");
            } else {
                let _ = writeln!(out, "no slide {}", index + 1);
            }
        }
        Command::Undo => {
            if engine.edit(|s| s.undo()) {
                show_current(engine, &mut out);
            } else {
                let _ = writeln!(out, "nothing to undo");
            }
        }
        Command::Redo => {
            if engine.edit(|s| s.redo()) {
                show_current(engine, &mut out);
            } else {
                let _ = writeln!(out, "nothing to redo");
            }
        }
        Command::Generate(pitch) => match engine.generate(pitch).await {
            Ok(count) => {
                let _ = writeln!(out, "generated {count} slides");
            }
            Err(e) => {
                let _ = writeln!(out, "{e}");
            }
        },
        Command::Present => match engine.present().await {
            Ok(PresentOutcome::Started) => {
                let _ = writeln!(out, "presenting, `exit` to return to editing");
            }
            Ok(PresentOutcome::AlreadyActive) => {
                let _ = writeln!(out, "a presentation is already starting or running");
            }
            Ok(PresentOutcome::Abandoned) => {
                let _ = writeln!(out, "presentation cancelled");
            }
            Err(e) => {
                let _ = writeln!(out, "{e}");
            }
        },
        Command::Exit => {
            let msg = if engine.exit_present() {
                "back to editing"
            } else {
                "not presenting"
            };
            let _ = writeln!(out, "{msg}");
        }
        Command::Save => {
            let msg = if engine.save_now().await {
                "saved"
            } else {
                "nothing to save"
            };
            let _ = writeln!(out, "{msg}");
        }
        Command::Open(deck_id) => {
            engine.open(deck_id).await;
            list_slides(engine, &mut out);
        }
        Command::Decks => {
            let decks = engine.persistence().with_db(|db| db.list_decks())?;
            let current = engine.deck_id();
            for deck in decks {
                let marker = if deck.deck_id == current { '*' } else { ' ' };
                let _ = writeln!(
                    out,
                    "{marker} {} (saved {})",
                    deck.deck_id,
                    deck.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Notices => {
            let notices = engine.notices();
            if notices.is_empty() {
                let _ = writeln!(out, "no notices");
            }
            for notice in notices {
                let retry = if notice.retry.is_some() { " [retry]" } else { "" };
                let _ = writeln!(out, "#{} {:?}: {}{retry}", notice.id, notice.kind, notice.message);
            }
        }
        Command::Dismiss(id) => {
            let msg = if engine.dismiss(id) {
                "dismissed"
            } else {
                "no such notice"
            };
            let _ = writeln!(out, "{msg}");
        }
        Command::Retry(id) => match engine.retry(id).await {
            Ok(()) => {
                let _ = writeln!(out, "retried #{id}");
            }
            Err(e) => {
                let _ = writeln!(out, "{e}");
            }
        },
        Command::Help => {
            let _ = writeln!(out, "{HELP}");
        }
        Command::Quit => {}
    }
    Ok(out)
}

fn update(engine: &DeckEngine, index: usize, edit: SlideEdit, out: &mut String) {
    if engine.edit(|s| s.update_field(index, edit)) {
        let _ = writeln!(out, "slide {} updated", index + 1);
    } else {
        let _ = writeln!(out, "no slide {}", index + 1);
    }
}

fn list_slides(engine: &DeckEngine, out: &mut String) {
    engine.read(|s| {
        let _ = writeln!(out, "deck {} ({} slides)", s.deck_id().short(), s.slides().len());
        for (i, slide) in s.slides().iter().enumerate() {
            let marker = if i == s.current_index() { '>' } else { ' ' };
            let _ = writeln!(
                out,
                "{marker} {:>2}. [{}] {}",
                i + 1,
                slide.layout,
                plain_text(&slide.title)
            );
        }
    });
}

fn show_current(engine: &DeckEngine, out: &mut String) {
    engine.read(|s| {
        let Some(composition) = s.render_current(RenderMode::Editable) else {
            return;
        };
        let _ = writeln!(
            out,
            "slide {}/{} [{}]",
            s.current_index() + 1,
            s.slides().len(),
            composition.layout
        );
        for region in &composition.regions {
            let _ = writeln!(out, "  {:?}: {}", region.role, plain_text(&region.html));
        }
        if let Some(note) = s.note(s.current_index()) {
            let _ = writeln!(out, "  note: {note}");
        }
    });
}
