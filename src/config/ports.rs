//! Port list grammar: comma-separated ports and inclusive ranges.
//!
//! A bind entry names its ports as text, e.g. `"6667"`, `"6660-6669"`,
//! or `"6667,6697,7000-7005"`. Expansion preserves order and drops
//! repeats inside a single entry; repeats across entries are a
//! validation error, not a parsing concern.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortRangeError {
    #[error("empty port list")]
    Empty,
    #[error("invalid port number: {0}")]
    InvalidNumber(String),
    #[error("port out of range (1-65535): {0}")]
    OutOfRange(String),
    #[error("range runs backwards: {0}")]
    ReversedRange(String),
}

fn parse_port(token: &str) -> Result<u16, PortRangeError> {
    let port: u32 = token
        .trim()
        .parse()
        .map_err(|_| PortRangeError::InvalidNumber(token.trim().to_string()))?;
    if port == 0 || port > u16::MAX as u32 {
        return Err(PortRangeError::OutOfRange(token.trim().to_string()));
    }
    Ok(port as u16)
}

/// Expand a port list string into individual ports.
pub fn parse_ports(source: &str) -> Result<Vec<u16>, PortRangeError> {
    let mut ports = Vec::new();

    for token in source.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(PortRangeError::Empty);
        }

        match token.split_once('-') {
            Some((begin, end)) => {
                let begin = parse_port(begin)?;
                let end = parse_port(end)?;
                if begin > end {
                    return Err(PortRangeError::ReversedRange(token.to_string()));
                }
                for port in begin..=end {
                    if !ports.contains(&port) {
                        ports.push(port);
                    }
                }
            }
            None => {
                let port = parse_port(token)?;
                if !ports.contains(&port) {
                    ports.push(port);
                }
            }
        }
    }

    if ports.is_empty() {
        return Err(PortRangeError::Empty);
    }
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_port() {
        assert_eq!(parse_ports("6667").unwrap(), vec![6667]);
    }

    #[test]
    fn comma_list_keeps_order() {
        assert_eq!(parse_ports("6697,6667").unwrap(), vec![6697, 6667]);
    }

    #[test]
    fn range_is_inclusive() {
        assert_eq!(parse_ports("6667-6669").unwrap(), vec![6667, 6668, 6669]);
    }

    #[test]
    fn mixed_list_and_range() {
        assert_eq!(
            parse_ports("6667,7000-7002,6697").unwrap(),
            vec![6667, 7000, 7001, 7002, 6697]
        );
    }

    #[test]
    fn repeats_within_entry_collapse() {
        assert_eq!(parse_ports("6667,6665-6668").unwrap(), vec![6667, 6665, 6666, 6668]);
    }

    #[test]
    fn whitespace_tolerated() {
        assert_eq!(parse_ports(" 6667 , 6697 ").unwrap(), vec![6667, 6697]);
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(parse_ports(""), Err(PortRangeError::Empty));
        assert_eq!(parse_ports("6667,"), Err(PortRangeError::Empty));
        assert!(matches!(
            parse_ports("irc"),
            Err(PortRangeError::InvalidNumber(_))
        ));
    }

    #[test]
    fn rejects_zero_and_oversized() {
        assert!(matches!(parse_ports("0"), Err(PortRangeError::OutOfRange(_))));
        assert!(matches!(
            parse_ports("65536"),
            Err(PortRangeError::OutOfRange(_))
        ));
    }

    #[test]
    fn rejects_backwards_range() {
        assert!(matches!(
            parse_ports("6669-6667"),
            Err(PortRangeError::ReversedRange(_))
        ));
    }
}
