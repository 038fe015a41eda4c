//! Error types for line matching.
//!
//! Three failure classes exist, each with a different blast radius:
//!
//! - [`MatcherError`]: a matcher could not be built. Fatal at setup time.
//! - [`FieldError`]: a line matched but one captured field is unusable.
//!   Local to that line.
//! - [`ParseError`]: what [`MatcherRegistry::try_parse`] surfaces for a
//!   malformed line when the registry is configured to reject them.
//!
//! A line that matches nothing is not an error at all.
//!
//! [`MatcherRegistry::try_parse`]: crate::MatcherRegistry::try_parse

use thiserror::Error;

// =============================================================================
// Matcher Construction Errors
// =============================================================================

/// Errors raised while building a matcher.
#[derive(Debug, Clone, Error)]
pub enum MatcherError {
    /// The pattern does not compile.
    #[error("matcher '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        /// Matcher name.
        name: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The pattern's capture groups do not line up with the extracted fields.
    #[error("matcher '{name}' expects {expected} capture groups, pattern has {actual}")]
    GroupCount {
        /// Matcher name.
        name: String,
        /// Groups the extractor reads.
        expected: usize,
        /// Groups the pattern defines.
        actual: usize,
    },
}

// =============================================================================
// Field Errors
// =============================================================================

/// A captured field could not be converted into its event field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A numeric field is not a number or does not fit its type.
    #[error("field '{field}' has invalid numeric value '{value}': {reason}")]
    InvalidNumber {
        /// Event field name.
        field: &'static str,
        /// Raw captured text.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The team label is not one of the known labels.
    #[error("unknown team label '{0}'")]
    UnknownTeam(String),

    /// The extractor asked for a group the pattern did not capture.
    #[error("capture group {0} did not participate in the match")]
    MissingGroup(usize),
}

// =============================================================================
// Parse Errors
// =============================================================================

/// Errors surfaced by [`MatcherRegistry::try_parse`](crate::MatcherRegistry::try_parse).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A matcher recognized the line but could not build its event.
    #[error("line recognized by '{matcher}' is malformed: {source}")]
    Malformed {
        /// Name of the matcher that recognized the line.
        matcher: String,
        /// The offending field.
        #[source]
        source: FieldError,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for matcher construction.
pub type MatcherResult<T> = Result<T, MatcherError>;

/// Result type for line parsing.
pub type ParseResult<T> = Result<T, ParseError>;
