/// Application name
pub const APP_NAME: &str = "Deckforge";

/// Version tag written into every persisted deck blob
pub const BLOB_VERSION: &str = "1.0";

/// Store key holding the id of the deck that was last written
pub const ACTIVE_DECK_KEY: &str = "active_deck_id";

/// Prefix of the store key holding a deck blob (`deck:{id}`)
pub const DECK_KEY_PREFIX: &str = "deck:";

/// Quiet period before an autosave fires, in milliseconds
pub const DEFAULT_AUTOSAVE_MS: u64 = 5_000;

/// Maximum number of history snapshots kept per session
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default presentation container size in pixels
pub const DEFAULT_PRESENT_WIDTH: u32 = 1280;
pub const DEFAULT_PRESENT_HEIGHT: u32 = 720;

/// Timeout for one slide-generation request, in seconds
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;

/// Placeholder text for slides created with "add slide"
pub const NEW_SLIDE_TITLE: &str = "<h2>New Slide</h2>";
pub const NEW_SLIDE_CONTENT: &str = "<p>Click to add content</p>";

/// Slider ranges for the numeric design settings
pub const FONT_SIZE_RANGE: (u32, u32) = (8, 96);
pub const SPACING_RANGE: (u32, u32) = (0, 64);
pub const ANIMATION_SPEED_RANGE: (f32, f32) = (0.1, 5.0);
pub const BORDER_RADIUS_RANGE: (u32, u32) = (0, 48);
pub const SHADOW_INTENSITY_RANGE: (u32, u32) = (0, 100);
