//! Error types for canon verification.

use thiserror::Error;

use crate::invariants::InvariantId;

/// Structural problems found in an invariant set.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonError {
    /// A canonical invariant is missing from the set.
    #[error("invariant `{0}` is missing")]
    MissingInvariant(InvariantId),
    /// The same invariant appears twice.
    #[error("invariant `{0}` is declared more than once")]
    DuplicateInvariant(InvariantId),
    /// A node depends on an invariant that is not in the set.
    #[error("invariant `{node}` depends on undeclared `{dependency}`")]
    UnknownDependency {
        /// Node declaring the dependency.
        node: InvariantId,
        /// Dependency that could not be found.
        dependency: InvariantId,
    },
    /// Dependencies form a cycle through this node.
    #[error("dependency cycle through `{0}`")]
    Cycle(InvariantId),
}

/// Result alias for canon operations.
pub type CanonResult<T> = Result<T, CanonError>;
