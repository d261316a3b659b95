//! Authority resolution for the governance gate.
//!
//! An [`AuthorityInstance`] is what the caller's session layer claims the actor
//! holds. The [`AuthorityResolver`] turns it into an [`AuthorityContext`] by
//! asking a pluggable [`AuthoritySource`], mapping every failure to
//! `INDETERMINATE` so downstream logic always has a well-formed value.

#![warn(missing_docs, clippy::pedantic)]

mod context;
pub mod http;
mod resolver;
mod source;

pub use context::{
    AuthorityConfidence, AuthorityContext, AuthorityInstance, AuthorityPayload, AuthorityStatus,
    ResolvedAuthority,
};
pub use http::{HttpAuthorityConfig, HttpAuthoritySource};
pub use resolver::{AuthorityResolver, reasons};
pub use source::{AuthorityError, AuthorityResult, AuthoritySource, StaticAuthoritySource};
