mod events;
mod player_tracker;
pub(crate) mod registry;
mod triggers;

pub use events::*;
pub use player_tracker::*;
pub use registry::*;
pub use triggers::*;
