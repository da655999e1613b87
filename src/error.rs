use std::io;
use thiserror::Error;

/// Errors raised at the I/O edges of the site: page files, data files, links.
///
/// The repair engine itself never fails; everything it cannot do degrades
/// to a skipped cycle.
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL in `{field}` ({value}): {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Validation error: {0}")]
    Validation(String),
}
