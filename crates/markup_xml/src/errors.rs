//! Error results that can be returned from the markup parser
use thiserror::Error;

/// Errors of the fallible APIs around the parser. Malformed markup itself is never an error
/// here: it ends up as error nodes inside the syntax tree.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("json parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown dtd context: {0}")]
    UnknownContext(String),
}
