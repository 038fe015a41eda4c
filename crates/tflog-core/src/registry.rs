//! Ordered matcher registry.
//!
//! The [`MatcherRegistry`] offers each incoming line to its matchers in
//! registration order. The first matcher that recognizes the line produces
//! the event and the remaining matchers are never consulted.
//!
//! # Malformed Fields
//!
//! A matcher can recognize a line's shape and still fail to build the event,
//! for example when the port is out of range. What happens next is decided by
//! the registry's [`MalformedFieldPolicy`]:
//!
//! | Policy        | Outcome                                                   |
//! |---------------|-----------------------------------------------------------|
//! | `FallThrough` | The line counts as not recognized by that matcher; the next matcher is tried. |
//! | `Reject`      | Matching stops and [`ParseError::Malformed`] is returned. |

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::catalog;
use crate::error::{MatcherResult, ParseError, ParseResult};
use crate::event::Event;
use crate::matcher::{BoxedMatcher, MatchOutput, Matcher};

/// What to do with a line whose shape matched but whose fields did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedFieldPolicy {
    /// Treat the line as unrecognized by that matcher and keep going.
    #[default]
    FallThrough,
    /// Stop and surface a [`ParseError`].
    Reject,
}

/// An ordered, append-only list of matchers.
#[derive(Default)]
pub struct MatcherRegistry {
    matchers: Vec<BoxedMatcher>,
    policy: MalformedFieldPolicy,
}

impl MatcherRegistry {
    /// Creates an empty registry.
    pub fn new(policy: MalformedFieldPolicy) -> Self {
        Self {
            matchers: Vec::new(),
            policy,
        }
    }

    /// Creates a registry holding the built-in connect, disconnect and say
    /// matchers, in that order.
    pub fn with_catalog(policy: MalformedFieldPolicy) -> MatcherResult<Self> {
        let mut registry = Self::new(policy);
        registry.register(catalog::connect_matcher()?);
        registry.register(catalog::disconnect_matcher()?);
        registry.register(catalog::say_matcher()?);
        Ok(registry)
    }

    /// Appends a matcher. It is consulted after every matcher registered before it.
    pub fn register<M>(&mut self, matcher: M)
    where
        M: Matcher + 'static,
    {
        debug!(matcher = matcher.name(), position = self.matchers.len(), "Registered matcher");
        self.matchers.push(Box::new(matcher));
    }

    /// Returns the malformed-field policy.
    pub fn policy(&self) -> MalformedFieldPolicy {
        self.policy
    }

    /// Returns the number of registered matchers.
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Returns `true` if no matcher is registered.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Returns matcher names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Converts a line into an event using the first matcher that recognizes it.
    ///
    /// Returns `Ok(None)` when no matcher recognizes the line.
    ///
    /// # Errors
    ///
    /// [`ParseError::Malformed`] when a matcher recognizes the line but cannot
    /// build its event and the policy is [`MalformedFieldPolicy::Reject`].
    pub fn try_parse(&self, line: &str) -> ParseResult<Option<Event>> {
        for matcher in &self.matchers {
            match matcher.recognize(line) {
                MatchOutput::NoMatch => {}
                MatchOutput::Matched(event) => {
                    trace!(matcher = matcher.name(), kind = %event.kind(), "Line recognized");
                    return Ok(Some(event));
                }
                MatchOutput::Malformed(source) => match self.policy {
                    MalformedFieldPolicy::FallThrough => {
                        debug!(
                            matcher = matcher.name(),
                            error = %source,
                            "Malformed line, trying next matcher"
                        );
                    }
                    MalformedFieldPolicy::Reject => {
                        return Err(ParseError::Malformed {
                            matcher: matcher.name().to_string(),
                            source,
                        });
                    }
                },
            }
        }

        Ok(None)
    }
}

impl std::fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherRegistry")
            .field("matchers", &self.names())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::event::{EventKind, Team};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records how often it is consulted and never recognizes anything.
    struct CountingMatcher {
        calls: Arc<AtomicUsize>,
    }

    impl Matcher for CountingMatcher {
        fn name(&self) -> &str {
            "counting"
        }

        fn recognize(&self, _line: &str) -> MatchOutput {
            self.calls.fetch_add(1, Ordering::SeqCst);
            MatchOutput::NoMatch
        }
    }

    fn catalog_with_counter(policy: MalformedFieldPolicy) -> (MatcherRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = MatcherRegistry::with_catalog(policy).unwrap();
        registry.register(CountingMatcher {
            calls: Arc::clone(&calls),
        });
        (registry, calls)
    }

    #[test]
    fn test_catalog_order() {
        let registry = MatcherRegistry::with_catalog(MalformedFieldPolicy::default()).unwrap();
        assert_eq!(registry.names(), vec!["connect", "disconnect", "say"]);
        assert_eq!(registry.policy(), MalformedFieldPolicy::FallThrough);
    }

    #[test]
    fn test_empty_registry_recognizes_nothing() {
        let registry = MatcherRegistry::new(MalformedFieldPolicy::Reject);
        assert!(registry.is_empty());
        assert_eq!(registry.try_parse(r#""A<1><X><Red>" say "hi""#), Ok(None));
    }

    #[test]
    fn test_unrecognized_line_yields_none() {
        let (registry, calls) = catalog_with_counter(MalformedFieldPolicy::FallThrough);
        let line = r#"World triggered "Round_Start""#;
        assert_eq!(registry.try_parse(line), Ok(None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_match_wins() {
        let (registry, calls) = catalog_with_counter(MalformedFieldPolicy::FallThrough);
        let event = registry
            .try_parse(r#""Alice<23><STEAM_0:1:111><Red>" say "gg""#)
            .unwrap()
            .unwrap();
        assert_eq!(event.kind(), EventKind::Say);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_earlier_matcher_shadows_later_one() {
        let mut registry = MatcherRegistry::new(MalformedFieldPolicy::FallThrough);
        registry.register(catalog::say_matcher().unwrap());
        registry.register(
            crate::matcher::RegexMatcher::new("shadowed", r"(.*)", 1, |_| {
                Err(FieldError::MissingGroup(1))
            })
            .unwrap(),
        );

        let event = registry
            .try_parse(r#""Dave<3><STEAM_0:0:4><Blue>" say "first""#)
            .unwrap()
            .unwrap();
        assert_eq!(event.identity().team(), Team::Blue);
    }

    #[test]
    fn test_malformed_port_falls_through() {
        let (registry, calls) = catalog_with_counter(MalformedFieldPolicy::FallThrough);
        let line = r#""Bob<5><STEAM_0:0:222><Blue>" connected, address "192.168.1.10:http""#;
        assert_eq!(registry.try_parse(line), Ok(None));
        // Every later matcher still saw the line.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_port_rejected() {
        let (registry, calls) = catalog_with_counter(MalformedFieldPolicy::Reject);
        let line = r#""Bob<5><STEAM_0:0:222><Blue>" connected, address "192.168.1.10:70000""#;
        let err = registry.try_parse(line).unwrap_err();
        let ParseError::Malformed { matcher, source } = err;
        assert_eq!(matcher, "connect");
        assert!(matches!(
            source,
            FieldError::InvalidNumber { field: "port", ref value, .. } if value == "70000"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
