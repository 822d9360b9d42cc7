//! Turns input files into ordered, de-duplicated work lists.
//!
//! Bad lines never fail a file: they are logged and dropped. Only a file
//! that cannot be read at all is an error.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::{info, warn};
use yt_data_client::ApiError;

use crate::error::BatchError;
use crate::ids::{dedup_preserving_order, extract_channel_id, extract_handle, extract_video_id};

/// Comments read from one file when no other cap is given
pub const DEFAULT_MAX_COMMENTS: usize = 1000;

/// Remote lookups used to turn handles and names into channel IDs
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn channel_for_handle(&self, handle: &str) -> Result<Option<String>, ApiError>;
    async fn search_channel(&self, query: &str) -> Result<Option<String>, ApiError>;
}

fn read_lines(path: &Path) -> Result<Vec<String>, BatchError> {
    if !path.exists() {
        return Err(BatchError::MissingInput(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|err| BatchError::read(path, err))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Canonical video IDs from input lines, invalid lines dropped, first occurrence kept
pub fn parse_video_ids<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ids = lines.into_iter().filter_map(|line| {
        let line = line.as_ref();
        let id = extract_video_id(line);
        if id.is_none() {
            warn!(entry = line, "skipping invalid video entry");
        }
        id
    });
    dedup_preserving_order(ids)
}

/// [`parse_video_ids`] over the non-blank lines of a file
pub fn read_video_ids(path: &Path) -> Result<Vec<String>, BatchError> {
    let ids = parse_video_ids(read_lines(path)?);
    info!(count = ids.len(), path = %path.display(), "loaded unique video IDs");
    Ok(ids)
}

/// Resolve one line to a channel ID.
///
/// Direct forms need no network. An `@handle` is looked up exactly first and
/// falls back to a keyword search; anything else goes straight to search.
pub async fn resolve_channel(directory: &dyn ChannelDirectory, input: &str) -> Option<String> {
    if let Some(id) = extract_channel_id(input) {
        return Some(id);
    }

    let query = match extract_handle(input) {
        Some(handle) => {
            match directory.channel_for_handle(&handle).await {
                Ok(Some(id)) => return Some(id),
                Ok(None) => info!(handle = %handle, "no channel for handle, trying search"),
                Err(err) => warn!(handle = %handle, error = %err, "handle lookup failed, trying search"),
            }
            handle
        }
        None => input.to_string(),
    };

    match directory.search_channel(&query).await {
        Ok(found) => found,
        Err(err) => {
            warn!(query = %query, error = %err, "channel search failed");
            None
        }
    }
}

/// Resolve every line with [`resolve_channel`], dropping failures and repeats
pub async fn resolve_channel_ids<I, S>(directory: &dyn ChannelDirectory, lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ids = Vec::new();
    for line in lines {
        let line = line.as_ref();
        match resolve_channel(directory, line).await {
            Some(id) => {
                info!(entry = line, channel_id = %id, "resolved channel");
                ids.push(id);
            }
            None => warn!(entry = line, "skipping unrecognized channel entry"),
        }
    }
    dedup_preserving_order(ids)
}

/// [`resolve_channel_ids`] over the non-blank lines of a file
pub async fn read_channel_ids(
    path: &Path,
    directory: &dyn ChannelDirectory,
) -> Result<Vec<String>, BatchError> {
    let lines = read_lines(path)?;
    let ids = resolve_channel_ids(directory, lines).await;
    info!(count = ids.len(), path = %path.display(), "loaded unique channel IDs");
    Ok(ids)
}

/// Comment texts, one per non-blank line, at most `max`
pub fn read_comments(path: &Path, max: usize) -> Result<Vec<String>, BatchError> {
    let mut comments = read_lines(path)?;
    comments.truncate(max);
    info!(count = comments.len(), path = %path.display(), "loaded comments");
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDirectory {
        handles: HashMap<String, String>,
        searches: HashMap<String, String>,
        failing_handles: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChannelDirectory for FakeDirectory {
        async fn channel_for_handle(&self, handle: &str) -> Result<Option<String>, ApiError> {
            self.calls.lock().unwrap().push(format!("handle:{handle}"));
            if self.failing_handles {
                return Err(ApiError::Http {
                    status: 400,
                    body: "invalid forHandle".into(),
                });
            }
            Ok(self.handles.get(handle).cloned())
        }

        async fn search_channel(&self, query: &str) -> Result<Option<String>, ApiError> {
            self.calls.lock().unwrap().push(format!("search:{query}"));
            Ok(self.searches.get(query).cloned())
        }
    }

    const CHANNEL_A: &str = "UCaaaaaaaaaaaaaaaaaaaaaa";
    const CHANNEL_B: &str = "UCbbbbbbbbbbbbbbbbbbbbbb";

    #[tokio::test]
    async fn direct_ids_skip_the_directory() {
        let directory = FakeDirectory::default();
        let url = format!("https://www.youtube.com/channel/{CHANNEL_A}");
        assert_eq!(resolve_channel(&directory, &url).await.as_deref(), Some(CHANNEL_A));
        assert!(directory.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handle_lookup_then_search_fallback() {
        let mut directory = FakeDirectory::default();
        directory.handles.insert("known".into(), CHANNEL_A.into());
        directory.searches.insert("fuzzy".into(), CHANNEL_B.into());

        assert_eq!(resolve_channel(&directory, "@known").await.as_deref(), Some(CHANNEL_A));
        assert_eq!(
            resolve_channel(&directory, "https://youtube.com/@fuzzy").await.as_deref(),
            Some(CHANNEL_B)
        );
        assert_eq!(
            *directory.calls.lock().unwrap(),
            vec!["handle:known", "handle:fuzzy", "search:fuzzy"]
        );
    }

    #[tokio::test]
    async fn failed_handle_lookup_still_searches() {
        let mut directory = FakeDirectory {
            failing_handles: true,
            ..Default::default()
        };
        directory.searches.insert("someone".into(), CHANNEL_A.into());
        assert_eq!(resolve_channel(&directory, "@someone").await.as_deref(), Some(CHANNEL_A));
    }

    #[tokio::test]
    async fn plain_names_go_straight_to_search() {
        let mut directory = FakeDirectory::default();
        directory.searches.insert("Some Channel Name".into(), CHANNEL_B.into());
        assert_eq!(
            resolve_channel(&directory, "Some Channel Name").await.as_deref(),
            Some(CHANNEL_B)
        );
        assert_eq!(*directory.calls.lock().unwrap(), vec!["search:Some Channel Name"]);
    }

    #[tokio::test]
    async fn unresolvable_lines_are_dropped_and_duplicates_removed() {
        let mut directory = FakeDirectory::default();
        directory.handles.insert("a".into(), CHANNEL_A.into());
        let ids = resolve_channel_ids(&directory, [CHANNEL_A, "nobody knows", "@a", CHANNEL_B]).await;
        assert_eq!(ids, vec![CHANNEL_A, CHANNEL_B]);
    }

    #[test]
    fn video_lines_are_filtered_and_deduplicated() {
        let ids = parse_video_ids([
            "https://youtu.be/dQw4w9WgXcQ",
            "not a video",
            "dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=9bZkp7q19f0",
        ]);
        assert_eq!(ids, vec!["dQw4w9WgXcQ", "9bZkp7q19f0"]);
    }

    #[test]
    fn comments_skip_blank_lines_and_respect_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Comments.txt");
        fs::write(&path, "first\n\n   \nsecond\nthird\n").unwrap();
        assert_eq!(read_comments(&path, 2).unwrap(), vec!["first", "second"]);
        assert_eq!(read_comments(&path, 10).unwrap().len(), 3);
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let err = read_video_ids(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, BatchError::MissingInput(_)));
    }
}
