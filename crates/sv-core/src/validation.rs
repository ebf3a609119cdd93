//! Field normalization shared by create, update and the query filters.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::{AppError, Result};

pub const MAX_TAGS: usize = 10;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// Lowercases, trims and dedupes tags, keeping first-seen order.
/// Never returns more than [`MAX_TAGS`] entries.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags = dedupe_tags(raw);
    tags.truncate(MAX_TAGS);
    tags
}

/// Write-path variant of [`normalize_tags`]: too many distinct tags is an error.
pub fn checked_tags<I, S>(raw: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tags = dedupe_tags(raw);
    if tags.len() > MAX_TAGS {
        return Err(AppError::ValidationError(format!(
            "A snippet can have max {MAX_TAGS} tags!"
        )));
    }
    Ok(tags)
}

fn dedupe_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

pub fn normalize_title(raw: Option<&str>) -> Result<String> {
    match raw.map(str::trim) {
        Some(title) if !title.is_empty() => Ok(title.to_string()),
        _ => Err(AppError::ValidationError("Title is required!".to_string())),
    }
}

/// Code must contain something besides whitespace but is stored verbatim.
pub fn check_code(raw: Option<&str>) -> Result<String> {
    match raw {
        Some(code) if !code.trim().is_empty() => Ok(code.to_string()),
        _ => Err(AppError::ValidationError("Code content is required!".to_string())),
    }
}

pub fn normalize_language(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(language) if !language.is_empty() => language.to_lowercase(),
        _ => DEFAULT_LANGUAGE.to_string(),
    }
}

pub fn normalize_description(raw: Option<&str>) -> Result<String> {
    let description = raw.map(str::trim).unwrap_or_default();
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::ValidationError(format!(
            "Description can be at most {MAX_DESCRIPTION_CHARS} characters!"
        )));
    }
    Ok(description.to_string())
}

/// Splits a comma-separated tag filter, dropping blank entries.
pub fn parse_tag_filter(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
///
/// A bare date used as an upper bound covers the whole day. Anything
/// unparseable yields `None` so the bound is simply dropped.
pub fn parse_date_bound(raw: &str, upper: bool) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = if upper {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)?
    };
    Some(date.and_time(time).and_utc())
}
