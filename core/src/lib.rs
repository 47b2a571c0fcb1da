//! # Talkbook Core
//!
//! Document-agnostic building blocks shared by the talkbook crates:
//!
//! - [`registry`]: UID-keyed ownership registry used by the asset pools
//! - [`abstract_editor`]: reversible commands, composites and undo/redo history
//! - [`events`]: synchronous change-notification bus

pub mod abstract_editor;
pub mod events;
pub mod registry;

pub use abstract_editor::{
    AsAny, Command, CommandError, CommandResult, CompositeCommand, Editable, UndoRedoManager,
};
pub use events::{BusEvent, EventBus, ListenerId};
pub use registry::{MAX_UID, Registry, RegistryError, Uid};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
