//! # wikirace-error
//!
//! Unified error handling for wikirace.
//!
//! - **ErrorKind**: what went wrong (e.g. `Timeout`, `InferenceFailed`)
//! - **ErrorStatus**: how it should be treated (Permanent, Temporary, Persistent)
//! - **Context**: operation name plus key-value pairs to locate the cause
//! - **Source**: the wrapped underlying error, without leaking its raw type
//!
//! ```rust
//! use wikirace_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::HttpStatus, "server answered 503")
//!         .with_operation("fetch::get")
//!         .with_context("url", "https://pl.wikipedia.org/wiki/Rust"))
//! }
//! ```
//!
//! External errors are wrapped with `set_source(err)`. Each error is handled
//! once; callers further up only append context.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using wikirace Error
pub type Result<T> = std::result::Result<T, Error>;
