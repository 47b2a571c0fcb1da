//! Undo/redo command history with transactions.
//!
//! [`UndoRedoManager`] keeps a linear history as two stacks: the undo side
//! holds done commands (most recent last) and the redo side holds undone
//! commands (next-to-redo last). The cursor is the boundary between them.
//! Executing a new command after undoing discards the redo side.
//!
//! While a transaction is open, executed commands are buffered into an
//! implicit [`CompositeCommand`] and reach the history as a single entry
//! when the transaction ends.

use std::collections::VecDeque;
use std::fmt;

use super::command::{Command, CommandError, CommandResult, Editable};
use super::composite::CompositeCommand;

/// Manages an undo/redo history of commands.
///
/// The undo stack is optionally bounded: when it exceeds `max_undo`, the
/// oldest command is dropped from the front (and stops being a cleanup root).
///
/// # Example
///
/// ```ignore
/// let mut history = UndoRedoManager::new();
/// let mut target = MyDocument::new();
///
/// history.execute(Box::new(my_command), &mut target)?;
/// history.undo(&mut target)?;
/// history.redo(&mut target)?;
///
/// history.start_transaction("Import chapter");
/// history.execute(Box::new(insert_a), &mut target)?;
/// history.execute(Box::new(insert_b), &mut target)?;
/// history.end_transaction()?; // one undo entry
/// ```
pub struct UndoRedoManager<T: Editable> {
    undo_stack: VecDeque<Box<dyn Command<T>>>,
    redo_stack: Vec<Box<dyn Command<T>>>,
    /// Open transactions, innermost last.
    transactions: Vec<CompositeCommand<T>>,
    max_undo: Option<usize>,
    /// Tracks distance from the saved state.
    ///
    /// - `Some(0)`: the current state matches the last save.
    /// - `Some(n)`, `n > 0`: `n` undos needed to reach the saved state.
    /// - `Some(n)`, `n < 0`: `|n|` redos needed to reach the saved state.
    /// - `None`: the save point is unreachable (dropped by capacity, or it
    ///   was on a discarded redo branch).
    save_distance: Option<i64>,
}

impl<T: Editable> UndoRedoManager<T> {
    /// Creates an empty, unbounded history.
    pub fn new() -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            transactions: Vec::new(),
            max_undo: None,
            save_distance: Some(0),
        }
    }

    /// Creates an empty history keeping at most `max_undo` undo entries.
    pub fn with_capacity_limit(max_undo: usize) -> Self {
        Self {
            max_undo: Some(max_undo),
            ..Self::new()
        }
    }

    /// Applies `command` to `target` and records it.
    ///
    /// Fails with [`CommandError::CannotExecute`] if the command refuses to
    /// run. If the command itself fails, its error is returned and the
    /// history is unchanged. Inside a transaction the command is added to
    /// the innermost buffer; otherwise it is pushed as a new undo entry and
    /// the redo side is discarded.
    pub fn execute(&mut self, mut command: Box<dyn Command<T>>, target: &mut T) -> CommandResult {
        if !command.can_execute(target) {
            return Err(CommandError::CannotExecute(command.description().to_owned()));
        }
        command.execute(target)?;
        log::debug!("executed '{}'", command.description());

        if let Some(transaction) = self.transactions.last_mut() {
            transaction.push(command);
            return Ok(());
        }
        self.record(command);
        Ok(())
    }

    /// Pushes an already-applied command as a new undo entry.
    fn record(&mut self, command: Box<dyn Command<T>>) {
        if !self.redo_stack.is_empty() {
            log::debug!("discarding {} redo entries", self.redo_stack.len());
            self.redo_stack.clear();
        }
        // A save point on the redo side is gone with it.
        if let Some(d) = self.save_distance
            && d < 0
        {
            self.save_distance = None;
        }
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.undo_stack.push_back(command);
        self.enforce_capacity();
    }

    fn enforce_capacity(&mut self) {
        let Some(max_undo) = self.max_undo else {
            return;
        };
        while self.undo_stack.len() > max_undo {
            self.undo_stack.pop_front();
            if let Some(d) = self.save_distance
                && d > self.undo_stack.len() as i64
            {
                self.save_distance = None;
            }
        }
    }

    /// Un-executes the most recent command and moves it to the redo side.
    ///
    /// On failure the command stays on the undo side.
    pub fn undo(&mut self, target: &mut T) -> CommandResult {
        if self.is_transaction_active() {
            return Err(CommandError::TransactionActive);
        }
        let Some(command) = self.undo_stack.back_mut() else {
            return Err(CommandError::NothingToUndo);
        };
        if !command.can_un_execute(target) {
            return Err(CommandError::CannotUnExecute(command.description().to_owned()));
        }
        command.un_execute(target)?;
        log::debug!("undid '{}'", command.description());

        if let Some(command) = self.undo_stack.pop_back() {
            self.redo_stack.push(command);
        }
        if let Some(d) = &mut self.save_distance {
            *d -= 1;
        }
        Ok(())
    }

    /// Re-executes the most recently undone command.
    ///
    /// On failure the command stays on the redo side.
    pub fn redo(&mut self, target: &mut T) -> CommandResult {
        if self.is_transaction_active() {
            return Err(CommandError::TransactionActive);
        }
        let Some(command) = self.redo_stack.last_mut() else {
            return Err(CommandError::NothingToRedo);
        };
        if !command.can_execute(target) {
            return Err(CommandError::CannotExecute(command.description().to_owned()));
        }
        command.execute(target)?;
        log::debug!("redid '{}'", command.description());

        if let Some(command) = self.redo_stack.pop() {
            self.undo_stack.push_back(command);
        }
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.enforce_capacity();
        Ok(())
    }

    /// Opens a transaction. Transactions nest.
    pub fn start_transaction(&mut self, description: impl Into<String>) {
        let description = description.into();
        log::debug!(
            "transaction '{description}' started (depth {})",
            self.transactions.len() + 1
        );
        self.transactions.push(CompositeCommand::new(description));
    }

    /// Commits the innermost transaction.
    ///
    /// An empty transaction is dropped without creating a history entry and
    /// `Ok(false)` is returned. A nested transaction commits into its parent.
    pub fn end_transaction(&mut self) -> CommandResult<bool> {
        let composite = self
            .transactions
            .pop()
            .ok_or(CommandError::NoActiveTransaction)?;
        if composite.is_empty() {
            log::debug!("transaction '{}' ended empty", composite.description());
            return Ok(false);
        }
        log::debug!(
            "transaction '{}' committed with {} commands",
            composite.description(),
            composite.len()
        );
        let command: Box<dyn Command<T>> = Box::new(composite);
        match self.transactions.last_mut() {
            Some(parent) => parent.push(command),
            None => self.record(command),
        }
        Ok(true)
    }

    /// Un-executes the innermost transaction's commands in reverse order and
    /// discards them. The history is not touched.
    pub fn cancel_transaction(&mut self, target: &mut T) -> CommandResult {
        let mut composite = self
            .transactions
            .pop()
            .ok_or(CommandError::NoActiveTransaction)?;
        log::debug!(
            "transaction '{}' cancelled, reverting {} commands",
            composite.description(),
            composite.len()
        );
        composite.un_execute(target)
    }

    /// Returns `true` while at least one transaction is open.
    pub fn is_transaction_active(&self) -> bool {
        !self.transactions.is_empty()
    }

    /// Number of open (nested) transactions.
    pub fn transaction_depth(&self) -> usize {
        self.transactions.len()
    }

    /// Returns `true` if there are commands that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.is_transaction_active() && !self.undo_stack.is_empty()
    }

    /// Returns `true` if there are commands that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.is_transaction_active() && !self.redo_stack.is_empty()
    }

    /// Undo descriptions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|c| c.description())
    }

    /// Redo descriptions, next-to-redo first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|c| c.description())
    }

    /// Number of undoable entries.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable entries.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// The undo capacity, `None` if unbounded.
    pub fn max_undo(&self) -> Option<usize> {
        self.max_undo
    }

    /// Every asset referenced by a command on the undo side, the redo side,
    /// or inside an open transaction.
    pub fn used_assets(&self, target: &T) -> Vec<T::AssetRef> {
        let mut assets = Vec::new();
        for command in self.undo_stack.iter().chain(self.redo_stack.iter()) {
            assets.extend(command.used_assets(target));
        }
        for transaction in &self.transactions {
            assets.extend(transaction.used_assets(target));
        }
        assets
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Returns `true` if the current state differs from the last saved one.
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    /// Drops both sides of the history. Open transactions are kept.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }
}

impl<T: Editable> Default for UndoRedoManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Editable> fmt::Debug for UndoRedoManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoRedoManager")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("transaction_depth", &self.transactions.len())
            .field("max_undo", &self.max_undo)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}
