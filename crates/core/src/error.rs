use std::io;

/// Errors that can occur during forgeline pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Plugin resolution error: {0}")]
    PluginResolution(String),

    #[error("Compile error: {0}")]
    Compile(String),

    #[error("Artifact write error: {0}")]
    ArtifactWrite(String),

    #[error("Engine state error: {0}")]
    EngineState(String),

    #[error("Phase '{phase}' failed: {source}")]
    Phase {
        phase: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a handler failure with the phase it occurred in.
    pub fn in_phase(self, phase: &str) -> Self {
        Error::Phase {
            phase: phase.to_string(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for forgeline operations
pub type Result<T> = std::result::Result<T, Error>;
