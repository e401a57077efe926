//! Line-based prompts for CLI entry points

pub mod ask;
pub mod destination;

pub use ask::ask;
pub use destination::{
    destination_arg, ensure_absent, exit_on_error, resolve_destination, resolve_destination_with,
    DestinationError, DEFAULT_PROMPT_NAME,
};
