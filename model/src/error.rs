//! Error type for the document model.

use talkbook_core::{CommandError, RegistryError};
use talkbook_vfs::VfsError;

use crate::channel::ChannelUid;
use crate::media::MediaKind;
use crate::media_data::PcmFormat;
use crate::tree::NodeId;

/// Every recoverable failure raised by the model.
///
/// Errors raised while a command runs inside the undo/redo manager come back
/// as the same variants (see the `From<CommandError>` impl), so callers can
/// match on e.g. [`Error::TypeMismatch`] regardless of how the edit was made.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("index {index} out of bounds (len {len})")]
    OutOfBounds { index: usize, len: usize },
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),
    #[error("{0} is already initialized")]
    AlreadyInitialized(&'static str),

    // --- Tree structure ---
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("node {0} already has a parent")]
    NodeHasParent(NodeId),
    #[error("node {0} has no parent")]
    NodeLacksParent(NodeId),
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("attaching {node} under {parent} would create a cycle")]
    WouldCreateCycle { parent: NodeId, node: NodeId },
    #[error("node {0} belongs to another presentation")]
    CrossPresentation(NodeId),
    #[error("tree validator refused {0}")]
    ValidatorRefused(&'static str),

    // --- Identity ---
    #[error("{kind} {uid} is already managed")]
    AlreadyManaged { kind: &'static str, uid: u64 },
    #[error("{kind} {uid} is not managed")]
    NotManaged { kind: &'static str, uid: u64 },
    #[error("channel {0} is not registered in this presentation")]
    UnknownChannel(ChannelUid),

    // --- Types ---
    #[error("channel '{channel}' does not accept {media:?} media")]
    TypeMismatch { channel: String, media: MediaKind },
    #[error("media data {uid} is not a {expected}")]
    WrongMediaData { uid: u64, expected: &'static str },
    #[error("PCM format mismatch: expected {expected}, got {actual}")]
    PcmFormatMismatch { expected: PcmFormat, actual: PcmFormat },

    // --- Collaborators ---
    #[error(transparent)]
    Command(CommandError),
    #[error("storage: {0}")]
    Storage(#[from] VfsError),
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    /// Maps a registry failure onto the identity variants for `kind`.
    pub(crate) fn registry(kind: &'static str, err: RegistryError) -> Self {
        match err {
            RegistryError::AlreadyManaged(uid) => Error::AlreadyManaged { kind, uid },
            RegistryError::NotManaged(uid) => Error::NotManaged { kind, uid },
            RegistryError::OutOfRange(uid) => {
                Error::InvalidArgument(format!("{kind} uid {uid} is beyond the assignable range"))
            }
        }
    }

    pub(crate) fn not_managed(kind: &'static str, uid: u64) -> Self {
        Error::NotManaged { kind, uid }
    }
}

/// Unwraps model errors that travelled through a command.
impl From<CommandError> for Error {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Target(boxed) => match boxed.downcast::<Error>() {
                Ok(model) => *model,
                Err(other) => Error::Command(CommandError::Target(other)),
            },
            other => Error::Command(other),
        }
    }
}

/// Lets commands use `?` on model operations.
impl From<Error> for CommandError {
    fn from(err: Error) -> Self {
        match err {
            Error::Command(inner) => inner,
            other => CommandError::target(other),
        }
    }
}

/// Result alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_survives_command_round_trip() {
        let original = Error::InvalidArgument("empty name".into());
        let through: CommandError = original.into();
        assert!(matches!(through, CommandError::Target(_)));

        let back: Error = through.into();
        assert!(matches!(back, Error::InvalidArgument(ref m) if m == "empty name"));
    }

    #[test]
    fn history_errors_stay_command_errors() {
        let err: Error = CommandError::NothingToUndo.into();
        assert!(matches!(err, Error::Command(CommandError::NothingToUndo)));

        let err: CommandError = Error::Command(CommandError::NothingToRedo).into();
        assert!(matches!(err, CommandError::NothingToRedo));
    }

    #[test]
    fn foreign_target_error_kept() {
        let err: Error = CommandError::target(std::io::Error::other("boom")).into();
        assert!(matches!(err, Error::Command(CommandError::Target(_))));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn registry_errors_name_the_kind() {
        let err = Error::registry("media data", RegistryError::NotManaged(4));
        assert_eq!(err.to_string(), "media data 4 is not managed");
    }
}
