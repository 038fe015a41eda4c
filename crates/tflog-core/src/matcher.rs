//! Line matchers.
//!
//! A [`Matcher`] looks at one raw log line and either recognizes it, producing
//! an [`Event`], or declines. Recognition and extraction happen in a single
//! call, so matchers carry no state between lines and can be shared freely
//! across threads.
//!
//! [`RegexMatcher`] is the stock implementation: a full-line regular
//! expression plus an extractor that maps capture groups to event fields.
//!
//! ```rust,ignore
//! use tflog_core::{Event, RegexMatcher, SayEvent};
//!
//! let matcher = RegexMatcher::new(
//!     "say",
//!     r#""(.+)<(\d+)><(.+)><(Blue|Red|Unassigned|Spectator)>" say "(.+)""#,
//!     5,
//!     |groups| {
//!         Ok(Event::Say(SayEvent {
//!             identity: groups.identity()?,
//!             message: groups.text(5)?.to_string(),
//!         }))
//!     },
//! )?;
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::{Captures, Regex};

use crate::error::{FieldError, MatcherError, MatcherResult};
use crate::event::{Event, Identity};

// ============================================================================
// Matcher Trait
// ============================================================================

/// Outcome of offering a line to a matcher.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutput {
    /// The line is not of this matcher's shape.
    NoMatch,
    /// The line was recognized and converted.
    Matched(Event),
    /// The line has this matcher's shape but a captured field is unusable.
    Malformed(FieldError),
}

/// A recognizer for one line shape.
///
/// Implementations must not panic on any input; a line they cannot handle is
/// [`MatchOutput::NoMatch`].
pub trait Matcher: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Offers a line to this matcher.
    fn recognize(&self, line: &str) -> MatchOutput;
}

/// A type-erased matcher that can be stored in collections.
pub type BoxedMatcher = Box<dyn Matcher>;

// ============================================================================
// Capture Groups
// ============================================================================

/// Positional view over the capture groups of a successful match.
///
/// Group 0 is the whole line; extracted fields start at 1.
pub struct Groups<'h> {
    captures: Captures<'h>,
}

impl<'h> Groups<'h> {
    /// Returns the text of group `index`.
    pub fn text(&self, index: usize) -> Result<&'h str, FieldError> {
        self.captures
            .get(index)
            .map(|m| m.as_str())
            .ok_or(FieldError::MissingGroup(index))
    }

    /// Parses group `index` as a base-10 number made of ASCII digits only;
    /// signs and whitespace are malformed.
    ///
    /// `field` names the event field for error reporting.
    pub fn number<T>(&self, index: usize, field: &'static str) -> Result<T, FieldError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.text(index)?;
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError::InvalidNumber {
                field,
                value: value.to_string(),
                reason: "not a base-10 digit sequence".to_string(),
            });
        }
        value.parse::<T>().map_err(|e| FieldError::InvalidNumber {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    /// Builds the player identity from groups 1 to 4
    /// (name, session id, player id, team).
    pub fn identity(&self) -> Result<Identity, FieldError> {
        Ok(Identity::new(
            self.text(1)?,
            self.number(2, "session_id")?,
            self.text(3)?,
            self.text(4)?.parse()?,
        ))
    }
}

// ============================================================================
// Regex Matcher
// ============================================================================

/// A type-erased extractor turning capture groups into an event.
pub type ExtractFn = Arc<dyn Fn(&Groups<'_>) -> Result<Event, FieldError> + Send + Sync>;

/// A matcher backed by a regular expression.
///
/// The pattern must match the whole line. The number of capture groups is
/// checked against what the extractor reads when the matcher is built, so a
/// mismatched pattern never reaches the ingestion path.
#[derive(Clone)]
pub struct RegexMatcher {
    name: String,
    regex: Regex,
    extract: ExtractFn,
}

impl RegexMatcher {
    /// Compiles `pattern` and pairs it with `extract`.
    ///
    /// `fields` is the number of capture groups `extract` reads.
    ///
    /// # Errors
    ///
    /// [`MatcherError::InvalidPattern`] if the pattern does not compile and
    /// [`MatcherError::GroupCount`] if it defines a different number of groups.
    pub fn new<F>(
        name: impl Into<String>,
        pattern: &str,
        fields: usize,
        extract: F,
    ) -> MatcherResult<Self>
    where
        F: Fn(&Groups<'_>) -> Result<Event, FieldError> + Send + Sync + 'static,
    {
        let name = name.into();
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            MatcherError::InvalidPattern {
                name: name.clone(),
                source,
            }
        })?;

        // captures_len() counts the implicit whole-match group.
        let actual = regex.captures_len() - 1;
        if actual != fields {
            return Err(MatcherError::GroupCount {
                name,
                expected: fields,
                actual,
            });
        }

        Ok(Self {
            name,
            regex,
            extract: Arc::new(extract),
        })
    }

    /// Returns the anchored pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for RegexMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(&self, line: &str) -> MatchOutput {
        let Some(captures) = self.regex.captures(line) else {
            return MatchOutput::NoMatch;
        };

        match (self.extract)(&Groups { captures }) {
            Ok(event) => MatchOutput::Matched(event),
            Err(e) => MatchOutput::Malformed(e),
        }
    }
}

impl fmt::Debug for RegexMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexMatcher")
            .field("name", &self.name)
            .field("pattern", &self.regex.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{SayEvent, Team};

    fn echo_matcher() -> RegexMatcher {
        RegexMatcher::new("echo", r"(\w+)<(\d+)><(\w+)><(\w*)> (.+)", 5, |groups| {
            Ok(Event::Say(SayEvent {
                identity: groups.identity()?,
                message: groups.text(5)?.to_string(),
            }))
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = RegexMatcher::new("broken", r"(unclosed", 1, |_| {
            Err(FieldError::MissingGroup(1))
        });
        assert!(matches!(
            result,
            Err(MatcherError::InvalidPattern { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn test_group_count_mismatch_rejected() {
        let result = RegexMatcher::new("short", r"(\w+) (\w+)", 3, |_| {
            Err(FieldError::MissingGroup(3))
        });
        assert!(matches!(
            result,
            Err(MatcherError::GroupCount {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_recognize_extracts_positionally() {
        let output = echo_matcher().recognize("bob<7><abc><Blue> hello there");
        let MatchOutput::Matched(Event::Say(say)) = output.clone() else {
            panic!("expected a say event, got {output:?}");
        };
        assert_eq!(say.identity.name(), "bob");
        assert_eq!(say.identity.session_id(), 7);
        assert_eq!(say.identity.player_id(), "abc");
        assert_eq!(say.identity.team(), Team::Blue);
        assert_eq!(say.message, "hello there");
    }

    #[test]
    fn test_requires_full_line_match() {
        let matcher = echo_matcher();
        assert_eq!(
            matcher.recognize("prefix! bob<7><abc><Blue> hello"),
            MatchOutput::NoMatch
        );
        assert_eq!(matcher.recognize(""), MatchOutput::NoMatch);
    }

    #[test]
    fn test_overflowing_number_is_malformed() {
        let output = echo_matcher().recognize("bob<99999999999><abc><Red> hi");
        assert!(matches!(
            output,
            MatchOutput::Malformed(FieldError::InvalidNumber {
                field: "session_id",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_team_is_malformed() {
        let output = echo_matcher().recognize("bob<1><abc><Green> hi");
        assert_eq!(
            output,
            MatchOutput::Malformed(FieldError::UnknownTeam("Green".to_string()))
        );
    }
}
