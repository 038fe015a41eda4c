//! Built-in matchers for the player lines the server logs.
//!
//! Each pattern starts with the player block
//! `"<name><<session id>><<player id>><<team>>"`, captured as groups 1 to 4,
//! followed by the line-specific fields.

use crate::error::MatcherResult;
use crate::event::{ConnectEvent, DisconnectEvent, Event, SayEvent};
use crate::matcher::RegexMatcher;

/// `"Bob<5><STEAM_0:0:222><Blue>" connected, address "192.168.1.10:27015"`
pub const CONNECT_PATTERN: &str =
    r#""(.+)<(\d+)><(.+)><(Blue|Red|Unassigned|Spectator|)>" connected, address "(.+):(.+)""#;

/// `"Carol<9><STEAM_0:1:333><>" disconnected (reason "Client left")`
pub const DISCONNECT_PATTERN: &str =
    r#""(.+)<(\d+)><(.+)><(Blue|Red|Unassigned|Spectator|)>" disconnected \(reason "(.+)"\)"#;

/// `"Alice<23><STEAM_0:1:111><Red>" say "gg"`
pub const SAY_PATTERN: &str =
    r#""(.+)<(\d+)><(.+)><(Blue|Red|Unassigned|Spectator)>" say "(.+)""#;

/// Matches connect lines. The port must fit in a `u16`.
pub fn connect_matcher() -> MatcherResult<RegexMatcher> {
    RegexMatcher::new("connect", CONNECT_PATTERN, 6, |groups| {
        Ok(Event::Connect(ConnectEvent {
            identity: groups.identity()?,
            address: groups.text(5)?.to_string(),
            port: groups.number(6, "port")?,
        }))
    })
}

/// Matches disconnect lines.
pub fn disconnect_matcher() -> MatcherResult<RegexMatcher> {
    RegexMatcher::new("disconnect", DISCONNECT_PATTERN, 5, |groups| {
        Ok(Event::Disconnect(DisconnectEvent {
            identity: groups.identity()?,
            reason: groups.text(5)?.to_string(),
        }))
    })
}

/// Matches all-chat lines.
pub fn say_matcher() -> MatcherResult<RegexMatcher> {
    RegexMatcher::new("say", SAY_PATTERN, 5, |groups| {
        Ok(Event::Say(SayEvent {
            identity: groups.identity()?,
            message: groups.text(5)?.to_string(),
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::event::{Identity, Team};
    use crate::matcher::{MatchOutput, Matcher};

    #[test]
    fn test_say_line() {
        let output = say_matcher()
            .unwrap()
            .recognize(r#""Alice<23><STEAM_0:1:111><Red>" say "gg""#);
        assert_eq!(
            output,
            MatchOutput::Matched(Event::Say(SayEvent {
                identity: Identity::new("Alice", 23, "STEAM_0:1:111", Team::Red),
                message: "gg".to_string(),
            }))
        );
    }

    #[test]
    fn test_say_requires_team() {
        let output = say_matcher()
            .unwrap()
            .recognize(r#""Alice<23><STEAM_0:1:111><>" say "gg""#);
        assert_eq!(output, MatchOutput::NoMatch);
    }

    #[test]
    fn test_connect_line() {
        let output = connect_matcher()
            .unwrap()
            .recognize(r#""Bob<5><STEAM_0:0:222><Blue>" connected, address "192.168.1.10:27015""#);
        assert_eq!(
            output,
            MatchOutput::Matched(Event::Connect(ConnectEvent {
                identity: Identity::new("Bob", 5, "STEAM_0:0:222", Team::Blue),
                address: "192.168.1.10".to_string(),
                port: 27015,
            }))
        );
    }

    #[test]
    fn test_connect_non_numeric_port() {
        let output = connect_matcher()
            .unwrap()
            .recognize(r#""Bob<5><STEAM_0:0:222><Blue>" connected, address "192.168.1.10:port""#);
        assert!(matches!(
            output,
            MatchOutput::Malformed(FieldError::InvalidNumber { field: "port", .. })
        ));
    }

    #[test]
    fn test_connect_signed_port_is_malformed() {
        let output = connect_matcher()
            .unwrap()
            .recognize(r#""Bob<5><STEAM_0:0:222><Blue>" connected, address "192.168.1.10:+27015""#);
        assert_eq!(
            output,
            MatchOutput::Malformed(FieldError::InvalidNumber {
                field: "port",
                value: "+27015".to_string(),
                reason: "not a base-10 digit sequence".to_string(),
            })
        );
    }

    #[test]
    fn test_disconnect_line_with_unset_team() {
        let output = disconnect_matcher()
            .unwrap()
            .recognize(r#""Carol<9><STEAM_0:1:333><>" disconnected (reason "Client left")"#);
        assert_eq!(
            output,
            MatchOutput::Matched(Event::Disconnect(DisconnectEvent {
                identity: Identity::new("Carol", 9, "STEAM_0:1:333", Team::Unset),
                reason: "Client left".to_string(),
            }))
        );
    }

    #[test]
    fn test_steam_id3_player_ids() {
        let output = say_matcher()
            .unwrap()
            .recognize(r#""Eve<41><[U:1:123456]><Spectator>" say "who's up?""#);
        let MatchOutput::Matched(event) = output else {
            panic!("say line not recognized");
        };
        assert_eq!(event.identity().player_id(), "[U:1:123456]");
        assert_eq!(event.identity().team(), Team::Spectator);
    }
}
