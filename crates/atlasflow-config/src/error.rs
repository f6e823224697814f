use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Resource file not found. Looked in:\n\
        - current directory: atlas.local.yaml, .atlas.local.yaml, atlas.yaml, .atlas.yaml\n\
        - ./.atlasflow/ directory\n\
        - ~/.config/atlasflow/atlas.yaml\n\
        or point ATLASFLOW_CONFIG_PATH at the file directly"
    )]
    ResourceFileNotFound,

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid resource '{address}': {message}")]
    InvalidResource { address: String, message: String },

    #[error("Resource '{0}' is declared more than once")]
    DuplicateResource(String),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
