//! Line-oriented command language driving the demo surface.
//!
//! ```text
//! type hello @al      # insert at the caret (replaces the selection)
//! backspace 2
//! select 6 5          # start, optional length
//! replace 0 0 !       # start, length, text
//! pick 0              # accept the n-th suggestion shown
//! accept alice        # accept an arbitrary candidate
//! reset some text
//! print
//! ```
//!
//! Text arguments run to the end of the line; `\s`, `\n`, `\t` and `\\`
//! escapes allow whitespace at the edges and line breaks. `\u{...}` inserts
//! any scalar value.

use anyhow::{Context, Result, anyhow, bail};
use core_text::Utf16Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Type(String),
    Backspace(usize),
    Select(Utf16Range),
    Replace { range: Utf16Range, text: String },
    Pick(usize),
    Accept(String),
    Reset(String),
    Print,
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(' ') {
        Some((verb, rest)) => (verb, rest),
        None => (line.trim_end(), ""),
    };
    let cmd = match verb {
        "type" => Command::Type(unescape(rest)?),
        "backspace" => Command::Backspace(match rest.trim() {
            "" => 1,
            n => parse_num(n)?,
        }),
        "select" => {
            let mut args = rest.split_whitespace();
            let start = parse_num(args.next().context("select needs a start offset")?)?;
            let len = args.next().map(parse_num).transpose()?.unwrap_or(0);
            Command::Select(range(start, len)?)
        }
        "replace" => {
            let mut args = rest.splitn(3, ' ');
            let start = parse_num(args.next().unwrap_or_default())?;
            let len = parse_num(args.next().context("replace needs a length")?)?;
            let text = unescape(args.next().unwrap_or_default())?;
            Command::Replace {
                range: range(start, len)?,
                text,
            }
        }
        "pick" => Command::Pick(parse_num(rest.trim())?),
        "accept" => {
            let name = unescape(rest.trim())?;
            if name.is_empty() {
                bail!("accept needs a candidate");
            }
            Command::Accept(name)
        }
        "reset" => Command::Reset(unescape(rest)?),
        "print" => Command::Print,
        other => bail!("unknown command `{other}`"),
    };
    Ok(Some(cmd))
}

fn parse_num(s: &str) -> Result<usize> {
    s.trim()
        .parse()
        .with_context(|| format!("expected a number, got `{s}`"))
}

/// `start` and `len` as a range; rejects an end past `usize::MAX`.
fn range(start: usize, len: usize) -> Result<Utf16Range> {
    if start.checked_add(len).is_none() {
        bail!("range {start}+{len} overflows");
    }
    Ok(Utf16Range::new(start, len))
}

fn unescape(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('u') => {
                let rest = chars.as_str();
                let body = rest
                    .strip_prefix('{')
                    .and_then(|r| r.split_once('}'))
                    .map(|(hex, _)| hex)
                    .ok_or_else(|| anyhow!("malformed \\u escape"))?;
                let value = u32::from_str_radix(body, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| anyhow!("invalid scalar value `{body}`"))?;
                out.push(value);
                // Skip "{" + hex + "}".
                for _ in 0..body.len() + 2 {
                    chars.next();
                }
            }
            Some(other) => bail!("unknown escape `\\{other}`"),
            None => bail!("dangling backslash"),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   # note").unwrap(), None);
    }

    #[test]
    fn type_keeps_inner_spaces_and_unescapes() {
        assert_eq!(
            parse_line("type hello @al").unwrap(),
            Some(Command::Type("hello @al".into()))
        );
        assert_eq!(
            parse_line(r"type \sx\u{202E}y").unwrap(),
            Some(Command::Type(" x\u{202E}y".into()))
        );
    }

    #[test]
    fn numeric_arguments() {
        assert_eq!(parse_line("backspace").unwrap(), Some(Command::Backspace(1)));
        assert_eq!(parse_line("backspace 3").unwrap(), Some(Command::Backspace(3)));
        assert_eq!(
            parse_line("select 6 5").unwrap(),
            Some(Command::Select(Utf16Range::new(6, 5)))
        );
        assert_eq!(
            parse_line("select 4").unwrap(),
            Some(Command::Select(Utf16Range::caret(4)))
        );
        assert_eq!(
            parse_line("replace 0 0 ! ").unwrap(),
            Some(Command::Replace {
                range: Utf16Range::caret(0),
                text: "! ".into()
            })
        );
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(parse_line("jump 3").is_err());
        assert!(parse_line("select").is_err());
        assert!(parse_line("pick x").is_err());
        assert!(parse_line("accept").is_err());
        assert!(parse_line(r"type \q").is_err());
        assert!(parse_line(r"type \u{110000}").is_err());
    }

    #[test]
    fn ranges_ending_past_usize_max_are_errors() {
        let max = usize::MAX;
        assert!(parse_line(&format!("select {max} 1")).is_err());
        assert!(parse_line(&format!("replace 1 {max} x")).is_err());
        assert_eq!(
            parse_line(&format!("select {max}")).unwrap(),
            Some(Command::Select(Utf16Range::caret(max)))
        );
    }
}
