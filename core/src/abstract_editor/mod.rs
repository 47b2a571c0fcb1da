//! Abstract editor framework for reversible editing operations.
//!
//! This module provides the foundational traits and types for building
//! an undo/redo-capable document model. It is decoupled from any concrete
//! document so that higher-level crates can implement their own commands.
//!
//! - [`Editable`]: marker trait for types that can be edited
//! - [`Command`]: a reversible edit operation (Command pattern)
//! - [`CompositeCommand`]: several commands applied as one atomic step
//! - [`UndoRedoManager`]: undo/redo stacks with nested transactions
//!
//! # Asset roots
//!
//! Commands kept in a history may refer to pool-managed assets that are no
//! longer reachable from the document itself (e.g. audio removed by a
//! command that can still be undone). [`UndoRedoManager::used_assets`]
//! collects those references so a cleanup pass can treat them as live.

mod command;
mod composite;
mod history;

pub use command::{AsAny, Command, CommandError, CommandResult, Editable};
pub use composite::CompositeCommand;
pub use history::UndoRedoManager;
