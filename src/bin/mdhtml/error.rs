use std::io;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("failed to read \"{path}\": {source}")]
    Read { path: String, source: io::Error },

    #[error("failed to write \"{path}\": {source}")]
    Write { path: String, source: io::Error },

    #[error("invalid config file \"{path}\": {source}")]
    Config {
        path: String,
        source: serde_json::Error,
    },

    #[error("failed to render the html page: {0}")]
    Template(#[from] tinytemplate::error::Error),
}
