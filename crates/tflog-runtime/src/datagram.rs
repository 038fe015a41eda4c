//! Log datagram decoding.
//!
//! A game server started with `logaddress_add` sends every log line as its own
//! UDP datagram:
//!
//! ```text
//! FF FF FF FF 'R' "L 10/18/2026 - 21:04:11: " <line> '\n' '\0'
//! FF FF FF FF 'S' <secret> "L 10/18/2026 - 21:04:11: " <line> '\n' '\0'
//! ```
//!
//! [`decode`] strips the header, the timestamp and the trailing terminators
//! and hands back just `<line>`. Datagrams without a header are taken as the
//! bare line.

const HEADER: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];

/// Shape of the `L MM/DD/YYYY - HH:MM:SS: ` prefix; `0` stands for any digit.
const TIMESTAMP_SHAPE: &[u8] = b"L 00/00/0000 - 00:00:00: ";

/// Extracts the log line from a datagram.
///
/// Invalid UTF-8 is replaced rather than rejected. Returns `None` when
/// nothing but framing is left.
pub fn decode(datagram: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(strip_header(datagram));
    let line = text.trim_end_matches(['\n', '\r', '\0']);
    let line = strip_timestamp(line);

    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

fn strip_header(datagram: &[u8]) -> &[u8] {
    let Some(rest) = datagram.strip_prefix(HEADER) else {
        return datagram;
    };

    match rest.split_first() {
        Some((b'R', body)) => body,
        // The secret runs up to the "L " that opens the timestamp.
        Some((b'S', body)) => body
            .windows(2)
            .position(|pair| pair == b"L ")
            .map_or(body, |start| &body[start..]),
        _ => rest,
    }
}

fn strip_timestamp(line: &str) -> &str {
    let bytes = line.as_bytes();
    if bytes.len() < TIMESTAMP_SHAPE.len() {
        return line;
    }

    let matches_shape = TIMESTAMP_SHAPE
        .iter()
        .zip(bytes)
        .all(|(&expected, &actual)| match expected {
            b'0' => actual.is_ascii_digit(),
            _ => actual == expected,
        });

    if matches_shape {
        // The prefix is ASCII, so this is a char boundary.
        &line[TIMESTAMP_SHAPE.len()..]
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#""Alice<23><STEAM_0:1:111><Red>" say "gg""#;

    fn framed(kind: &[u8], body: &str) -> Vec<u8> {
        let mut datagram = HEADER.to_vec();
        datagram.extend_from_slice(kind);
        datagram.extend_from_slice(body.as_bytes());
        datagram.extend_from_slice(b"\n\0");
        datagram
    }

    #[test]
    fn test_plain_line_passes_through() {
        assert_eq!(decode(LINE.as_bytes()).as_deref(), Some(LINE));
    }

    #[test]
    fn test_unsecured_header() {
        let datagram = framed(b"R", &format!("L 10/18/2026 - 21:04:11: {LINE}"));
        assert_eq!(decode(&datagram).as_deref(), Some(LINE));
    }

    #[test]
    fn test_secured_header() {
        let datagram = framed(b"S12345", &format!("L 10/18/2026 - 21:04:11: {LINE}"));
        assert_eq!(decode(&datagram).as_deref(), Some(LINE));
    }

    #[test]
    fn test_header_without_timestamp() {
        let datagram = framed(b"R", LINE);
        assert_eq!(decode(&datagram).as_deref(), Some(LINE));
    }

    #[test]
    fn test_timestamp_without_header() {
        let line = format!("L 01/02/2026 - 03:04:05: {LINE}\r\n");
        assert_eq!(decode(line.as_bytes()).as_deref(), Some(LINE));
    }

    #[test]
    fn test_non_timestamp_prefix_is_kept() {
        let line = "L is for lines that only look like timestamps";
        assert_eq!(decode(line.as_bytes()).as_deref(), Some(line));
    }

    #[test]
    fn test_framing_only() {
        assert_eq!(decode(b""), None);
        assert_eq!(decode(&framed(b"R", "")), None);
        assert_eq!(decode(&framed(b"R", "L 10/18/2026 - 21:04:11: ")), None);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut datagram = framed(b"R", "");
        datagram.truncate(5);
        datagram.extend_from_slice(b"\"Bj\xF6rn<1><X><Red>\" say \"hej\"\0");
        let line = decode(&datagram).unwrap();
        assert!(line.starts_with("\"Bj\u{FFFD}rn<1>"));
        assert!(line.ends_with("say \"hej\""));
    }
}
