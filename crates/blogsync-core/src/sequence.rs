//! Date-scoped post naming.
//!
//! New posts are named `<Y>-<M>-<D>-0x<hex>.md`, where the date carries no
//! zero padding and the hex counter is one past the highest counter already
//! used on that day.

use chrono::{Datelike, Local, NaiveDate};

use crate::constants::POST_EXTENSION;
use crate::models::AutoFilename;

/// Today's date in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `YYYY-M-D` without zero padding.
pub fn date_prefix(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Counter encoded in `name` if it follows the naming scheme for `prefix`.
/// Names with a missing, non-hex or overflowing counter yield `None`.
pub fn parse_sequence(name: &str, prefix: &str) -> Option<u64> {
    let middle = name
        .strip_prefix(prefix)?
        .strip_prefix("-0x")?
        .strip_suffix(POST_EXTENSION)?
        .strip_suffix('.')?;

    if middle.is_empty() || !middle.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(middle, 16)
        .ok()
        .filter(|value| *value < u64::MAX)
}

/// Next free name for `date` given a snapshot of existing names.
///
/// Deterministic for a fixed date and snapshot, and never returns a name that
/// is in the snapshot.
pub fn next_in_sequence<'a, I>(date: NaiveDate, existing: I) -> AutoFilename
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = date_prefix(date);
    let max = existing
        .into_iter()
        .filter_map(|name| parse_sequence(name, &prefix))
        .max();

    AutoFilename {
        date,
        sequence: max.map_or(1, |m| m + 1),
        extension: POST_EXTENSION.to_string(),
    }
}
