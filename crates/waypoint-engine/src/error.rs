use thiserror::Error;
use waypoint_core::{ExternalError, ValidationError};

/// Why a command did not complete. Every variant except `External` leaves
/// persisted and rendered state untouched.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("You are not allowed to configure more than {limit} waypoint{}.", plural(.limit))]
    LimitExceeded { limit: u32 },

    #[error("You do not have a waypoint named '{name}' set!")]
    NotFound { name: String },

    /// Another command for the same actor is still running.
    #[error("You are executing this command too fast!")]
    Busy,

    #[error("Cannot proceed without setting waypoint preferences.")]
    PreferencesRequired,

    #[error("You currently do not have a waypoint selected. Specify a waypoint to toggle.")]
    NoSelection,

    #[error("This can only be done while online.")]
    ActorOffline,

    #[error(transparent)]
    External(#[from] ExternalError),
}

fn plural(n: &u32) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}
