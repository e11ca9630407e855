use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrglangError {
    #[error("Not authenticated. Set GH_TOKEN or GITHUB_TOKEN, or add a token to the config file.")]
    NotAuthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("either --org or --enterprise flag is required")]
    MissingScope,

    #[error("{0} name is required")]
    EmptyIdentifier(&'static str),

    #[error("GitHub API error: {0}")]
    GitHub(String),

    #[error("GitHub API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Interrupted by Ctrl-C")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
}

impl From<octocrab::Error> for OrglangError {
    fn from(err: octocrab::Error) -> Self {
        OrglangError::GitHub(err.to_string())
    }
}

impl From<serde_json::Error> for OrglangError {
    fn from(err: serde_json::Error) -> Self {
        OrglangError::Parse(err.to_string())
    }
}

impl OrglangError {
    /// Errors that end the run even where other failures only skip an item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OrglangError::Interrupted)
    }
}

pub type Result<T> = std::result::Result<T, OrglangError>;
