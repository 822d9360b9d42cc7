//! Canonical video and channel IDs from free-form input lines.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id regex"));

static VIDEO_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:v=|/v/|youtu\.be/|/embed/)([A-Za-z0-9_-]{11})").expect("video url regex")
});

static CHANNEL_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"youtube\.com/channel/(UC[A-Za-z0-9_-]+)").expect("channel url regex")
});

static CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UC[A-Za-z0-9_-]{9,}$").expect("channel id regex"));

static HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_.\-]+)").expect("handle regex"));

/// Exactly 11 characters from `[A-Za-z0-9_-]`
pub fn is_video_id(s: &str) -> bool {
    VIDEO_ID.is_match(s)
}

/// Video ID from a bare ID, a `watch?v=`, `/v/`, `youtu.be/` or `/embed/`
/// link, or any URL whose last path segment is an ID (`/shorts/`, `/live/`).
pub fn extract_video_id(input: &str) -> Option<String> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if is_video_id(s) {
        return Some(s.to_string());
    }
    if let Some(caps) = VIDEO_IN_URL.captures(s) {
        return Some(caps[1].to_string());
    }
    if s.starts_with("http") {
        let path = s.split(['?', '#']).next().unwrap_or(s);
        let candidate = path.trim_end_matches('/').rsplit('/').next()?;
        if is_video_id(candidate) {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Channel ID available without a remote lookup: a `/channel/UC...` URL or
/// a bare `UC...` token.
pub fn extract_channel_id(input: &str) -> Option<String> {
    let s = input.trim();
    if let Some(caps) = CHANNEL_URL.captures(s) {
        return Some(caps[1].to_string());
    }
    if CHANNEL_ID.is_match(s) {
        return Some(s.to_string());
    }
    None
}

/// The `@handle` part of a line, without the `@`
pub fn extract_handle(input: &str) -> Option<String> {
    HANDLE
        .captures(input)
        .map(|caps| caps[1].trim_end_matches('.').to_string())
        .filter(|h| !h.is_empty())
}

/// Drop repeats, keeping the first occurrence of each item in place
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
