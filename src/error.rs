//! Error types for the `avrogen` library.

use thiserror::Error as ThisError;

use crate::schema::NodeId;

/// The result type returned by fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while resolving directives or generating values.
#[derive(ThisError, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A directive's JSON value had the wrong shape (e.g. `length` was a string).
    #[error("directive `{directive}` on node {node:?} has an invalid shape: {cause}")]
    InvalidDirectiveShape {
        /// Name of the offending directive.
        directive: &'static str,
        /// The node at which the directive was found.
        node: NodeId,
        /// Human readable cause.
        cause: String,
    },

    /// A `range` or `length` directive violated `min < max` (or `max > min`).
    #[error("directive `{directive}` on node {node:?} has an invalid range: {cause}")]
    InvalidRange {
        /// Name of the offending directive.
        directive: &'static str,
        /// The node at which the directive was found.
        node: NodeId,
        /// Human readable cause.
        cause: String,
    },

    /// An `iteration` directive violated one of the constraints in the data model
    /// (`start != restart`, `step != 0`, sign agreement between `step` and `restart - start`).
    #[error("directive `iteration` on node {node:?} is invalid: {cause}")]
    InvalidIteration {
        /// The node at which the directive was found.
        node: NodeId,
        /// Human readable cause.
        cause: String,
    },

    /// Two directives that mutually exclude each other were both present on a node.
    #[error("node {node:?} has mutually exclusive directives `{a}` and `{b}`")]
    MutuallyExclusiveDirectives {
        /// The node at which the conflict was found.
        node: NodeId,
        /// The first directive name.
        a: &'static str,
        /// The second directive name.
        b: &'static str,
    },

    /// An `options` list entry could not be coerced into, or failed validation
    /// against, the node's schema.
    #[error("node {node:?}: option entry could not be coerced into the expected schema: {cause}")]
    OptionCoercion {
        /// The node at which the coercion failed.
        node: NodeId,
        /// Human readable cause.
        cause: String,
    },

    /// The `options` directive resolved to an empty list, or the backing file
    /// could not be opened/decoded.
    #[error("node {node:?}: options source is unusable: {cause}")]
    OptionsSource {
        /// The node at which the options source failed.
        node: NodeId,
        /// Human readable cause.
        cause: String,
    },

    /// A directive was attached to a schema variant that cannot support it
    /// (e.g. `iteration` on an `array`).
    #[error("directive `{directive}` is not supported on node {node:?} of kind {kind}")]
    UnsupportedDirective {
        /// Name of the offending directive.
        directive: &'static str,
        /// The node at which the directive was found.
        node: NodeId,
        /// A short name for the node's schema kind, used only for diagnostics.
        kind: &'static str,
    },

    /// The regex could not be compiled.
    #[error("invalid regex on node {node:?}: {source}")]
    InvalidRegex {
        /// The node at which the regex was found.
        node: NodeId,
        /// Underlying compilation error.
        #[source]
        source: rand_regex::Error,
    },

    /// A numeric value did not fit in the target schema type (e.g. an
    /// `options` literal that overflows `int`).
    #[error("node {node:?}: value does not fit the expected numeric type: {cause}")]
    NumericOverflow {
        /// The node at which the overflow was found.
        node: NodeId,
        /// Human readable cause.
        cause: String,
    },
}
