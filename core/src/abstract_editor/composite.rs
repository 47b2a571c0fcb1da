//! Atomic groups of commands.

use std::fmt;

use super::command::{Command, CommandResult, Editable};

/// An ordered list of sub-commands applied as one step.
///
/// Sub-commands execute in insertion order and un-execute in strict reverse
/// order. If a sub-command fails part-way, the ones already applied in this
/// pass are unwound before the error is returned, so a composite is either
/// fully applied or not applied at all.
pub struct CompositeCommand<T: Editable> {
    description: String,
    commands: Vec<Box<dyn Command<T>>>,
}

impl<T: Editable> CompositeCommand<T> {
    /// Creates an empty composite.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            commands: Vec::new(),
        }
    }

    /// Appends a sub-command. It is not executed here.
    pub fn push(&mut self, command: Box<dyn Command<T>>) {
        self.commands.push(command);
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, command: Box<dyn Command<T>>) -> Self {
        self.push(command);
        self
    }

    /// Number of sub-commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if there are no sub-commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterates over sub-command descriptions in execution order.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.description())
    }

    /// Un-executes sub-commands `[0, applied)` in reverse.
    ///
    /// Rollback failures are logged; the original error is what the caller
    /// gets back.
    fn unwind(&mut self, applied: usize, target: &mut T) {
        for command in self.commands[..applied].iter_mut().rev() {
            if let Err(err) = command.un_execute(target) {
                log::error!(
                    "rollback of '{}' inside '{}' failed: {err}",
                    command.description(),
                    self.description
                );
            }
        }
    }

    /// Re-executes sub-commands `[from, len)` in order after a failed reverse pass.
    fn rewind(&mut self, from: usize, target: &mut T) {
        for command in self.commands[from..].iter_mut() {
            if let Err(err) = command.execute(target) {
                log::error!(
                    "re-apply of '{}' inside '{}' failed: {err}",
                    command.description(),
                    self.description
                );
            }
        }
    }
}

impl<T: Editable> Command<T> for CompositeCommand<T> {
    fn execute(&mut self, target: &mut T) -> CommandResult {
        for index in 0..self.commands.len() {
            if let Err(err) = self.commands[index].execute(target) {
                self.unwind(index, target);
                return Err(err);
            }
        }
        Ok(())
    }

    fn un_execute(&mut self, target: &mut T) -> CommandResult {
        for index in (0..self.commands.len()).rev() {
            if let Err(err) = self.commands[index].un_execute(target) {
                self.rewind(index + 1, target);
                return Err(err);
            }
        }
        Ok(())
    }

    fn can_execute(&self, target: &T) -> bool {
        self.commands.first().is_none_or(|c| c.can_execute(target))
    }

    fn can_un_execute(&self, target: &T) -> bool {
        self.commands.iter().all(|c| c.can_un_execute(target))
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn used_assets(&self, target: &T) -> Vec<T::AssetRef> {
        self.commands
            .iter()
            .flat_map(|c| c.used_assets(target))
            .collect()
    }
}

impl<T: Editable> fmt::Debug for CompositeCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeCommand")
            .field("description", &self.description)
            .field("commands", &self.commands)
            .finish()
    }
}
