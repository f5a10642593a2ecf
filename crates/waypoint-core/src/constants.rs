//! Shared constants for the waypoint engine.

/// Coordinate tolerance used by `Waypoint::approx_eq`.
pub const WAYPOINT_EPSILON: f64 = 1e-4;

/// Squared distance above which a same-world teleport is treated like a
/// world change. The client drops linked markers on long teleports.
pub const TELEPORT_WORLD_CHANGE_DISTANCE_SQ: f64 = 4096.0;

/// Vertical nudge added to the marker seat offset.
pub const MARKER_SEAT_Y_OFFSET: f64 = 0.295;

/// Width/height of both visual proxies so they never intercept interaction.
pub const PROXY_BOUNDING_BOX: f32 = 0.01;

/// Scale of the labelled marker entity.
pub const MARKER_SCALE: f32 = 0.01;

/// Placeholder substituted with the waypoint title in a display format.
pub const FORMAT_TITLE: &str = "{TITLE}";

/// Placeholder substituted with the rounded-up distance in a display format.
pub const FORMAT_DISTANCE: &str = "{DISTANCE}";

/// Maximum length of a waypoint name, in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// Maximum length of a title or display format, in characters, after
/// formatting-code expansion.
pub const MAX_TEXT_LEN: usize = 255;

/// Formatting-code prefix accepted in user input.
pub const USER_FORMAT_PREFIX: char = '&';

/// Formatting-code prefix understood by clients.
pub const FORMAT_PREFIX: char = '§';

/// Display format used when an actor has never configured preferences.
pub const DEFAULT_DISPLAY_FORMAT: &str = "§b{TITLE}§d [§5{DISTANCE}m§d]";

/// Marker distance used when an actor has never configured preferences.
pub const DEFAULT_MARKER_DISTANCE: f64 = 5.0;

/// Bounds and step of the marker distance the preference prompt offers.
pub const MARKER_DISTANCE_MIN: f64 = 0.0;
pub const MARKER_DISTANCE_MAX: f64 = 16.0;
pub const MARKER_DISTANCE_STEP: f64 = 1.25;

/// Coordinate clamp applied to command input.
pub const MIN_COORD: f64 = -30_000_000.0;
pub const MAX_COORD: f64 = 30_000_000.0;
