// Licensed under the Apache-2.0 license

//! CMSIS-SVD register database and source generator.
//!
//! An SVD file is ingested once into a small relational store (MPU →
//! peripherals → registers → fields). Lookups against the store then render
//! reports or generate constants for assembler and Forth.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use svd_db::{convert, generate, Dialect, GenerateOptions, Store};
//!
//! // Build the store once
//! convert(Path::new("STM32F401.svd"), Path::new("STM32F401.db")).unwrap();
//!
//! // Then look things up in it
//! let store = Store::open(Path::new("STM32F401.db")).unwrap();
//! let options = GenerateOptions::new().register_filter("CR");
//! let code = generate(&store, "TIM_n", Dialect::Assembler, &options).unwrap();
//! print!("{code}");
//! ```
//!
//! ## Module Organization
//!
//! - [`store`]: Append-only journal backing the relational tables ([`Store`])
//! - [`model`]: Table rows and ids
//! - [`bits`]: Bit position normalization (`bitOffset`/`bitWidth`, `[hi:lo]`, `lsb`/`msb`)
//! - [`ingest`]: SVD tree → store, including derived peripherals
//! - [`resolve`]: Peripheral name → register/field tree
//! - [`pattern`]: Multi-instance templates such as `SPI_n`
//! - [`generate`]: Assembler and Forth dialects
//! - [`report`]: Listings, display and dump
//! - [`config`]: Register filter, generation options and store location
//! - [`util`]: Name matching and number formatting helpers

pub mod bits;
pub mod config;
pub mod error;
pub mod generate;
pub mod ingest;
pub mod model;
pub mod pattern;
pub mod report;
pub mod resolve;
pub mod store;
pub mod util;

// Re-export main public API
pub use config::{GenerateOptions, RegisterFilter, StoreLocation};
pub use error::{Result, SvdDbError};
pub use generate::{generate, Dialect};
pub use ingest::{convert, default_output_path, ingest, IngestSummary};
pub use resolve::{resolve, ResolvedField, ResolvedPeripheral, ResolvedRegister};
pub use store::{Store, DEFAULT_STORE_NAME};
