#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to encode yaml for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to write file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("settings validation failed: {0}")]
    Settings(String),
    #[error("project `{project}` is not configured")]
    UnknownProject { project: String },
    #[error("scenario `{scenario}` is not configured for project `{project}`")]
    UnknownScenario { project: String, scenario: String },
    #[error("failed to resolve home directory for global config path")]
    HomeDirectoryUnavailable,
}
