//! Error types for nutribot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Profile store errors. Append failures are fatal for that operation
/// only; the caller still surfaces the computed result to the user.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file has an unexpected header: {0}")]
    BadHeader(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid event format: {0}")]
    InvalidEvent(String),
}

/// Text-generation service errors. All of these are recoverable from the
/// session's point of view: the user is asked to retry and the dialogue
/// state stays where it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Generation response could not be parsed: {reason}")]
    InvalidResponse { reason: String },
}

/// Plan pager errors.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Cannot load an empty plan")]
    EmptyPlan,

    #[error("No plan is loaded for this session")]
    NoPlanLoaded,
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
