use nom::branch::alt;
use nom::bytes::complete::{tag, take_till1, take_until, take_while_m_n};
use nom::character::complete::{char, digit0, digit1, space1};
use nom::combinator::{eof, map, map_res, opt};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;

use super::{Direction, RawTimestamp};

/// A parsed header line
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeaderLine<'a> {
    /// Blade slot of chassis models (`[FPC01]`)
    pub slot: Option<&'a str>,
    pub timestamp: RawTimestamp<'a>,
    /// `None` when the sniffer did not print the interface (low verbosity)
    pub interface: Option<&'a str>,
    pub direction: Direction,
    pub summary: &'a str,
}

/// A counter from the sniffer footer
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FooterLine {
    ReceivedByFilter(u64),
    DroppedByKernel(u64),
}

fn fixed_digits<'a>(count: usize) -> impl FnMut(&'a str) -> IResult<&'a str, u32> {
    map_res(
        take_while_m_n(count, count, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u32>(),
    )
}

fn slot_prefix(i: &str) -> IResult<&str, &str> {
    map(
        terminated(delimited(char('['), take_until("]"), char(']')), space1),
        str::trim,
    )(i)
}

fn absolute_time(i: &str) -> IResult<&str, RawTimestamp> {
    let (i, (year, _, month, _, day)) = tuple((
        fixed_digits(4),
        char('-'),
        fixed_digits(2),
        char('-'),
        fixed_digits(2),
    ))(i)?;
    let (i, _) = char(' ')(i)?;
    let (i, (hour, _, minute, _, second)) = tuple((
        fixed_digits(2),
        char(':'),
        fixed_digits(2),
        char(':'),
        fixed_digits(2),
    ))(i)?;
    let (i, fraction) = preceded(char('.'), digit0)(i)?;
    let ts = RawTimestamp::Absolute {
        year,
        month,
        day,
        hour,
        minute,
        second,
        fraction,
    };
    Ok((i, ts))
}

fn relative_time(i: &str) -> IResult<&str, RawTimestamp> {
    map(
        separated_pair(digit1, char('.'), digit1),
        |(seconds, fraction)| RawTimestamp::Relative { seconds, fraction },
    )(i)
}

fn direction(i: &str) -> IResult<&str, Direction> {
    terminated(
        alt((
            map(tag("in"), |_| Direction::In),
            map(tag("out"), |_| Direction::Out),
            map(tag("--"), |_| Direction::Unknown),
        )),
        alt((space1, eof)),
    )(i)
}

fn interface_and_direction(i: &str) -> IResult<&str, (&str, Direction)> {
    pair(
        terminated(take_till1(|c: char| c.is_whitespace()), space1),
        direction,
    )(i)
}

/// Parse a header line
///
/// The line must start with a timestamp (possibly after a slot prefix)
/// followed by a blank. Interface and direction are optional.
pub fn parse_header_line(i: &str) -> IResult<&str, HeaderLine> {
    let (i, slot) = opt(slot_prefix)(i)?;
    let (i, timestamp) = terminated(alt((absolute_time, relative_time)), space1)(i)?;
    let (i, iface) = opt(interface_and_direction)(i)?;
    let (interface, direction) = match iface {
        Some((name, direction)) => (Some(name), direction),
        None => (None, Direction::Unknown),
    };
    let header = HeaderLine {
        slot,
        timestamp,
        interface,
        direction,
        summary: i.trim(),
    };
    Ok(("", header))
}

/// Parse one of the statistics lines printed when the sniffer stops
pub fn parse_footer_line(i: &str) -> IResult<&str, FooterLine> {
    let (i, count) = terminated(map_res(digit1, |s: &str| s.parse::<u64>()), space1)(i)?;
    alt((
        map(tag("packets received by filter"), move |_| {
            FooterLine::ReceivedByFilter(count)
        }),
        map(tag("packets dropped by kernel"), move |_| {
            FooterLine::DroppedByKernel(count)
        }),
    ))(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_relative() {
        let (_, h) = parse_header_line("0.918957 port1 in 10.0.0.1 -> 10.0.0.2: icmp: echo request")
            .expect("header");
        assert_eq!(h.slot, None);
        assert_eq!(
            h.timestamp,
            RawTimestamp::Relative {
                seconds: "0",
                fraction: "918957"
            }
        );
        assert_eq!(h.interface, Some("port1"));
        assert_eq!(h.direction, Direction::In);
        assert_eq!(h.summary, "10.0.0.1 -> 10.0.0.2: icmp: echo request");
    }

    #[test]
    fn header_absolute_with_slot() {
        let (_, h) = parse_header_line("[FPC03] 2022-08-23 14:02:11.004512 port5 out arp who-has")
            .expect("header");
        assert_eq!(h.slot, Some("FPC03"));
        assert_eq!(
            h.timestamp,
            RawTimestamp::Absolute {
                year: 2022,
                month: 8,
                day: 23,
                hour: 14,
                minute: 2,
                second: 11,
                fraction: "004512"
            }
        );
        assert_eq!(h.interface, Some("port5"));
        assert_eq!(h.direction, Direction::Out);
    }

    #[test]
    fn header_without_summary() {
        let (_, h) = parse_header_line("0.000001 port1 in").expect("header");
        assert_eq!(h.interface, Some("port1"));
        assert_eq!(h.direction, Direction::In);
        assert_eq!(h.summary, "");
    }

    #[test]
    fn header_without_interface() {
        let (_, h) = parse_header_line("3.500000 10.0.0.1.1234 -> 10.0.0.2.80: syn").expect("header");
        assert_eq!(h.interface, None);
        assert_eq!(h.direction, Direction::Unknown);
        assert_eq!(h.summary, "10.0.0.1.1234 -> 10.0.0.2.80: syn");
    }

    #[test]
    fn direction_needs_word_boundary() {
        let (_, h) = parse_header_line("1.5 port1 inbound traffic").expect("header");
        assert_eq!(h.interface, None);
        assert_eq!(h.summary, "port1 inbound traffic");
    }

    #[test]
    fn not_a_header() {
        assert!(parse_header_line("interfaces=[any]").is_err());
        assert!(parse_header_line("0x0000   4500 0014").is_err());
        assert!(parse_header_line("12 packets received by filter").is_err());
        assert!(parse_header_line("1.2.3.4 is an address").is_err());
        assert!(parse_header_line("0.5").is_err());
    }

    #[test]
    fn footer() {
        assert_eq!(
            parse_footer_line("12 packets received by filter").map(|r| r.1),
            Ok(FooterLine::ReceivedByFilter(12))
        );
        assert_eq!(
            parse_footer_line("0 packets dropped by kernel").map(|r| r.1),
            Ok(FooterLine::DroppedByKernel(0))
        );
        assert!(parse_footer_line("12 packets").is_err());
    }
}
