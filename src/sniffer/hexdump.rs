use std::borrow::Cow;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::{char, hex_digit0, hex_digit1, one_of, space0, space1};
use nom::combinator::{eof, map_res, peek};
use nom::multi::separated_list0;
use nom::sequence::{preceded, terminated};
use nom::IResult;

use crate::options::HexDialect;

/// Length of the ASCII gutter printed after the hex groups
pub const GUTTER_LEN: usize = 16;

/// A hex-dump line, split into offset and hex groups. The ASCII gutter is dropped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HexLine<'a> {
    /// Offset printed at the start of the line, `None` if the dump has no offsets
    pub offset: Option<usize>,
    /// Hex groups in line order (usually 2 bytes each, possibly shorter at the end)
    pub groups: Vec<&'a str>,
}

fn parse_offset(s: &str) -> Result<Option<usize>, std::num::ParseIntError> {
    if s.is_empty() {
        Ok(None)
    } else {
        usize::from_str_radix(s, 16).map(Some)
    }
}

fn strict_offset(i: &str) -> IResult<&str, Option<usize>> {
    map_res(
        terminated(
            preceded(
                tag("0x"),
                take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
            ),
            peek(one_of(" \t")),
        ),
        parse_offset,
    )(i)
}

fn compatible_offset(i: &str) -> IResult<&str, Option<usize>> {
    map_res(
        alt((
            terminated(preceded(tag("0x"), hex_digit0), one_of(" \t:")),
            terminated(hex_digit0, char('\t')),
        )),
        parse_offset,
    )(i)
}

fn offset(dialect: HexDialect) -> fn(&str) -> IResult<&str, Option<usize>> {
    match dialect {
        HexDialect::Strict => strict_offset,
        HexDialect::Compatible => compatible_offset,
    }
}

// A group must be followed by a blank or the end of line, so that a gutter
// glued to the data is not taken for hex.
fn hex_groups(i: &str) -> IResult<&str, Vec<&str>> {
    preceded(
        space0,
        separated_list0(
            char(' '),
            terminated(hex_digit1, peek(alt((space1, eof)))),
        ),
    )(i)
}

/// Test if the (trimmed) line starts with a hex-dump offset
pub fn is_hex_line(line: &str, dialect: HexDialect) -> bool {
    offset(dialect)(line).is_ok()
}

/// Parse a hex-dump line
///
/// Groups are separated by a single blank. The gutter starts after the first
/// wider gap, and is ignored.
pub fn parse_hex_line(line: &str, dialect: HexDialect) -> IResult<&str, HexLine> {
    let (i, offset) = offset(dialect)(line)?;
    let (i, groups) = hex_groups(i)?;
    Ok((i, HexLine { offset, groups }))
}

/// Separate an ASCII gutter glued to the last hex group
///
/// Some dumps print no blank between data and gutter. When the last token is
/// longer than the gutter, its last [`GUTTER_LEN`] characters are split off.
pub fn normalize_line(line: &str) -> Cow<str> {
    let trimmed = line.trim_end();
    let last = match trimmed.split_whitespace().last() {
        Some(last) => last,
        None => return Cow::Borrowed(line),
    };
    let count = last.chars().count();
    if count <= GUTTER_LEN {
        return Cow::Borrowed(line);
    }
    let split = last
        .char_indices()
        .nth(count - GUTTER_LEN)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let start = trimmed.len() - last.len();
    let mut s = String::with_capacity(trimmed.len() + 1);
    s.push_str(&trimmed[..start]);
    s.push_str(&last[..split]);
    s.push(' ');
    s.push_str(&last[split..]);
    Cow::Owned(s)
}
