//! Error types for the object pool
//!
//! The pool itself never fails: construction errors belong to the
//! factory and are handed back verbatim. The only error defined here is
//! the one a [`Context`](crate::Context) reports once it is done.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

pub type ContextResult<T> = Result<T, ContextError>;
