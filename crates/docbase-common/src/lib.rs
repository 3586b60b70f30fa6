//! Common utilities for docbase
//!
//! This crate provides the error type shared by the MongoDB layer and the CLI.

pub mod error;

pub use error::{classify_server_code, DocbaseError, Result, DUPLICATE_KEY_CODE};
