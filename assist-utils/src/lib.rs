use chrono::{DateTime, Utc};
use std::borrow::Cow;

pub const RUN_DIR_PREFIX: &str = "run";
const QUOTE_PAIRS: &[(char, char)] = &[('"', '"'), ('\u{201C}', '\u{201D}')];

pub fn trimmed_or_none(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

/// Removes one pair of matching quotation marks wrapping the whole value.
pub fn strip_wrapping_quotes(input: &str) -> &str {
    let trimmed = input.trim();
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = trimmed
            .strip_prefix(*open)
            .and_then(|rest| rest.strip_suffix(*close))
        {
            return inner.trim();
        }
    }
    trimmed
}

/// Removes markdown emphasis asterisks around a value.
pub fn strip_emphasis(input: &str) -> &str {
    input.trim().trim_matches('*').trim()
}

/// Formats an ISO-8601 UTC timestamp that is safe to use as a path component.
///
/// `2024-05-01T12:30:45.123Z` becomes `2024-05-01T12-30-45-123Z`.
pub fn path_safe_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-")
}

pub fn run_dir_name(timestamp: DateTime<Utc>) -> String {
    format!("{RUN_DIR_PREFIX}-{}", path_safe_timestamp(timestamp))
}

/// Quotes an argument for display in a copy-pasteable POSIX shell command.
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    let is_plain = !arg.is_empty()
        && arg
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | '+' | ':' | '='));

    if is_plain {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

pub fn shell_command_line<I, S>(program: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = shell_quote(program).into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg.as_ref()));
    }
    line
}
