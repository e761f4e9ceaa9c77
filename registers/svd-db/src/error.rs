// Licensed under the Apache-2.0 license

use crate::bits::BitSpecError;
use registers_svd::SvdParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while converting, querying or generating.
///
/// Every error is terminal for the operation that raised it; nothing in the
/// pipeline retries.
#[derive(Error, Debug)]
pub enum SvdDbError {
    /// The source document is not a readable SVD file.
    #[error(transparent)]
    SourceParse(#[from] SvdParseError),

    /// A field's bit position could not be converted to offset/width form.
    #[error("field {register}.{field}: {source}")]
    MalformedField {
        register: String,
        field: String,
        #[source]
        source: BitSpecError,
    },

    /// A `derivedFrom` target has not been inserted yet.
    #[error("peripheral {peripheral} derived from {target} not yet entered")]
    UnresolvedDerivation { peripheral: String, target: String },

    /// No store file could be located or opened.
    #[error("database file {} not found: {detail}", path.display())]
    StoreNotFound { path: PathBuf, detail: String },

    /// `convert` refuses to overwrite an existing store.
    #[error("database file {} already exists", .0.display())]
    StoreExists(PathBuf),

    /// A peripheral, register or MPU lookup matched nothing.
    #[error("no {entity} with name like: {key}")]
    EntityNotFound { entity: &'static str, key: String },

    /// The underlying store rejected or failed an operation.
    #[error("{entity} query failed for {key}: {reason}")]
    QueryFailure {
        entity: &'static str,
        key: String,
        reason: String,
    },

    /// A stored address offset is not a number.
    #[error("unable to parse address {value:?}")]
    InvalidAddress { value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] std::fmt::Error),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, SvdDbError>;
