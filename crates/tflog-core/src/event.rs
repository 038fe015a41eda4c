//! Event model for recognized log lines.
//!
//! Every recognized line becomes one [`Event`]. Each variant wraps a struct
//! that embeds the player [`Identity`] plus the fields specific to that line
//! shape:
//!
//! ```text
//! Event
//! ├── Connect(ConnectEvent { identity, address, port })
//! ├── Disconnect(DisconnectEvent { identity, reason })
//! └── Say(SayEvent { identity, message })
//! ```
//!
//! # Typed Extraction
//!
//! Handlers ask for the event shape they care about through [`FromEvent`].
//! The variant structs extract themselves from the matching variant only,
//! while [`Event`] itself extracts from anything and acts as the wildcard:
//!
//! ```rust,ignore
//! use tflog_core::{Event, FromEvent, SayEvent};
//!
//! let say = SayEvent::from_event(&event);   // Some only for Event::Say
//! let any = Event::from_event(&event);      // always Some
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

// ============================================================================
// Team
// ============================================================================

/// Team label carried by every player line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Team {
    Blue,
    Red,
    Unassigned,
    Spectator,
    /// The server logged an empty team label, e.g. while still connecting.
    #[default]
    Unset,
}

impl Team {
    /// Returns the label as it appears on the wire (`""` for [`Team::Unset`]).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "Blue",
            Self::Red => "Red",
            Self::Unassigned => "Unassigned",
            Self::Spectator => "Spectator",
            Self::Unset => "",
        }
    }
}

impl FromStr for Team {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Blue" => Ok(Self::Blue),
            "Red" => Ok(Self::Red),
            "Unassigned" => Ok(Self::Unassigned),
            "Spectator" => Ok(Self::Spectator),
            "" => Ok(Self::Unset),
            other => Err(FieldError::UnknownTeam(other.to_string())),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Identity
// ============================================================================

/// The player fields shared by every user-originated event.
///
/// Fields are only readable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    name: String,
    session_id: u32,
    player_id: String,
    team: Team,
}

impl Identity {
    /// Creates a new identity.
    pub fn new(
        name: impl Into<String>,
        session_id: u32,
        player_id: impl Into<String>,
        team: Team,
    ) -> Self {
        Self {
            name: name.into(),
            session_id,
            player_id: player_id.into(),
            team,
        }
    }

    /// Display name at the time the line was logged.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-connection user id. The server reuses ids after a disconnect.
    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    /// Persistent player id (Steam id), stable across sessions.
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Team the player was on.
    pub fn team(&self) -> Team {
        self.team
    }
}

// ============================================================================
// Event Variants
// ============================================================================

/// A player connected to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectEvent {
    pub identity: Identity,
    /// Remote address, as logged (no port).
    pub address: String,
    pub port: u16,
}

/// A player left the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectEvent {
    pub identity: Identity,
    pub reason: String,
}

/// A player wrote in the all-chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SayEvent {
    pub identity: Identity,
    pub message: String,
}

// ============================================================================
// Event
// ============================================================================

/// Discriminator for [`Event`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Connect,
    Disconnect,
    Say,
}

impl EventKind {
    /// Every known kind, in declaration order.
    pub const ALL: [EventKind; 3] = [Self::Connect, Self::Disconnect, Self::Say];

    /// Returns the lowercase name used in configuration and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Say => "say",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A recognized log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Connect(ConnectEvent),
    Disconnect(DisconnectEvent),
    Say(SayEvent),
}

impl Event {
    /// Returns the discriminator of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connect(_) => EventKind::Connect,
            Self::Disconnect(_) => EventKind::Disconnect,
            Self::Say(_) => EventKind::Say,
        }
    }

    /// Returns the player identity embedded in every variant.
    pub fn identity(&self) -> &Identity {
        match self {
            Self::Connect(e) => &e.identity,
            Self::Disconnect(e) => &e.identity,
            Self::Say(e) => &e.identity,
        }
    }
}

impl From<ConnectEvent> for Event {
    fn from(event: ConnectEvent) -> Self {
        Self::Connect(event)
    }
}

impl From<DisconnectEvent> for Event {
    fn from(event: DisconnectEvent) -> Self {
        Self::Disconnect(event)
    }
}

impl From<SayEvent> for Event {
    fn from(event: SayEvent) -> Self {
        Self::Say(event)
    }
}

// ============================================================================
// Subscription Keys
// ============================================================================

/// Key under which handlers are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKey {
    /// The wildcard: every event regardless of kind.
    Any,
    /// Events of exactly one kind.
    Kind(EventKind),
}

impl FromStr for SubscriptionKey {
    type Err = String;

    /// Parses `"*"`/`"any"` or an event kind name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        if name == "*" || name == "any" {
            return Ok(Self::Any);
        }
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .map(Self::Kind)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Kind(kind) => kind.fmt(f),
        }
    }
}

// ============================================================================
// Event Extraction
// ============================================================================

/// Trait for extracting a typed event from a dispatched [`Event`].
///
/// `KEY` tells the subscription registry which events a handler of this type
/// can receive, so a handler's shape is checked when it is compiled rather
/// than when an event arrives.
pub trait FromEvent: Sized + Clone + Send + Sync + 'static {
    /// The registry key handlers for this type are stored under.
    const KEY: SubscriptionKey;

    /// Returns `Some` when `event` carries this type.
    fn from_event(event: &Event) -> Option<Self>;
}

impl FromEvent for Event {
    const KEY: SubscriptionKey = SubscriptionKey::Any;

    fn from_event(event: &Event) -> Option<Self> {
        Some(event.clone())
    }
}

macro_rules! impl_from_event {
    ($ty:ty, $variant:ident) => {
        impl FromEvent for $ty {
            const KEY: SubscriptionKey = SubscriptionKey::Kind(EventKind::$variant);

            fn from_event(event: &Event) -> Option<Self> {
                match event {
                    Event::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_from_event!(ConnectEvent, Connect);
impl_from_event!(DisconnectEvent, Disconnect);
impl_from_event!(SayEvent, Say);

#[cfg(test)]
mod tests {
    use super::*;

    fn say() -> Event {
        Event::Say(SayEvent {
            identity: Identity::new("Alice", 23, "STEAM_0:1:111", Team::Red),
            message: "gg".to_string(),
        })
    }

    #[test]
    fn test_team_from_str() {
        assert_eq!("Blue".parse::<Team>().unwrap(), Team::Blue);
        assert_eq!("Spectator".parse::<Team>().unwrap(), Team::Spectator);
        assert_eq!("".parse::<Team>().unwrap(), Team::Unset);
        assert!(matches!(
            "Green".parse::<Team>(),
            Err(FieldError::UnknownTeam(label)) if label == "Green"
        ));
    }

    #[test]
    fn test_typed_extraction() {
        let event = say();
        assert!(SayEvent::from_event(&event).is_some());
        assert!(ConnectEvent::from_event(&event).is_none());
        assert!(DisconnectEvent::from_event(&event).is_none());
        assert_eq!(Event::from_event(&event), Some(event));
    }

    #[test]
    fn test_keys() {
        assert_eq!(Event::KEY, SubscriptionKey::Any);
        assert_eq!(SayEvent::KEY, SubscriptionKey::Kind(EventKind::Say));
        assert_eq!(ConnectEvent::KEY, SubscriptionKey::Kind(EventKind::Connect));
    }

    #[test]
    fn test_subscription_key_from_str() {
        assert_eq!("*".parse::<SubscriptionKey>(), Ok(SubscriptionKey::Any));
        assert_eq!("Any".parse::<SubscriptionKey>(), Ok(SubscriptionKey::Any));
        assert_eq!(
            " Disconnect ".parse::<SubscriptionKey>(),
            Ok(SubscriptionKey::Kind(EventKind::Disconnect))
        );
        assert_eq!(
            "kill".parse::<SubscriptionKey>(),
            Err("kill".to_string())
        );
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let json = serde_json::to_value(say()).unwrap();
        assert_eq!(json["type"], "say");
        assert_eq!(json["message"], "gg");
        assert_eq!(json["identity"]["team"], "Red");
    }
}
