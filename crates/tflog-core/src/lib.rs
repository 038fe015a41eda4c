//! # tflog Core
//!
//! The matching half of the tflog engine: turns raw game server log lines
//! into strongly-typed events.
//!
//! - **Event Model**: [`Event`] and its variants, all embedding an [`Identity`]
//! - **Matchers**: the [`Matcher`] contract and the regex-backed [`RegexMatcher`]
//! - **Registry**: [`MatcherRegistry`], evaluated in order, first match wins
//! - **Catalog**: the built-in connect, disconnect and say matchers
//!
//! This crate has no async runtime dependency; delivery of events to
//! handlers lives in `tflog-framework`.
//!
//! ```text
//! raw line ──▶ MatcherRegistry ──▶ Matcher #1 ─┐
//!                                  Matcher #2 ─┼─▶ Option<Event>
//!                                  Matcher #3 ─┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use tflog_core::{Event, MalformedFieldPolicy, MatcherRegistry};
//!
//! let registry = MatcherRegistry::with_catalog(MalformedFieldPolicy::FallThrough)?;
//!
//! if let Some(Event::Say(say)) = registry.try_parse(r#""Alice<23><STEAM_0:1:111><Red>" say "gg""#)? {
//!     println!("{}: {}", say.identity.name(), say.message);
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod event;
pub mod matcher;
pub mod registry;

pub use error::{FieldError, MatcherError, MatcherResult, ParseError, ParseResult};
pub use event::{
    ConnectEvent, DisconnectEvent, Event, EventKind, FromEvent, Identity, SayEvent,
    SubscriptionKey, Team,
};
pub use matcher::{BoxedMatcher, ExtractFn, Groups, MatchOutput, Matcher, RegexMatcher};
pub use registry::{MalformedFieldPolicy, MatcherRegistry};
