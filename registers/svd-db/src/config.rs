// Licensed under the Apache-2.0 license

//! Options controlling where the store is found and what gets generated.

use crate::error::Result;
use crate::resolve::ResolvedRegister;
use crate::store::{find_upwards, Store, DEFAULT_STORE_NAME};
use std::path::PathBuf;

/// Case-insensitive substring filter on register names.
///
/// # Example
///
/// ```
/// use svd_db::config::RegisterFilter;
///
/// let filter = RegisterFilter::containing("cr");
/// assert!(filter.matches("CR1"));
/// assert!(filter.matches("SCR"));
/// assert!(!filter.matches("SR"));
/// assert!(RegisterFilter::new().matches("SR"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterFilter {
    pattern: Option<String>,
}

impl RegisterFilter {
    /// A filter that keeps every register.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep registers whose name contains `pattern`. An empty pattern keeps
    /// everything.
    pub fn containing(pattern: &str) -> Self {
        Self {
            pattern: (!pattern.is_empty()).then(|| pattern.to_lowercase()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.pattern {
            Some(pattern) => name.to_lowercase().contains(pattern.as_str()),
            None => true,
        }
    }

    /// The registers that pass the filter, in their original order.
    pub fn apply<'a>(&self, registers: &'a [ResolvedRegister]) -> Vec<&'a ResolvedRegister> {
        registers.iter().filter(|r| self.matches(&r.name)).collect()
    }
}

/// Options shared by the generation dialects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub filter: RegisterFilter,
    /// Emit the Forth support-word preamble before the constants.
    pub support_words: bool,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_filter(mut self, pattern: &str) -> Self {
        self.filter = RegisterFilter::containing(pattern);
        self
    }

    pub fn support_words(mut self, enabled: bool) -> Self {
        self.support_words = enabled;
        self
    }
}

/// Where to find the store for read commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    /// Use exactly this file.
    Path(PathBuf),
    /// Search this directory and its ancestors for [`DEFAULT_STORE_NAME`].
    SearchFrom(PathBuf),
}

impl StoreLocation {
    pub fn locate(&self) -> Result<PathBuf> {
        match self {
            StoreLocation::Path(path) => Ok(path.clone()),
            StoreLocation::SearchFrom(dir) => find_upwards(dir, DEFAULT_STORE_NAME),
        }
    }

    pub fn open(&self) -> Result<Store> {
        Store::open(&self.locate()?)
    }
}
