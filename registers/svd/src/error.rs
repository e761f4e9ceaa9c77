// Licensed under the Apache-2.0 license

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading an SVD document.
#[derive(Error, Debug)]
pub enum SvdParseError {
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("expected root element <device>, found <{0}>")]
    UnexpectedRoot(String),

    #[error("<{element}> at line {line} is missing required element <{tag}>")]
    MissingElement {
        element: String,
        tag: String,
        line: u32,
    },
}
