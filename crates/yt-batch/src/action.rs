use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

/// The three supported operations. Each one owns a separate partition of
/// the progress store and a value of the audit log's `action` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    Like,
    Comment,
    Subscribe,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Like, ActionKind::Comment, ActionKind::Subscribe];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Like => "like",
            ActionKind::Comment => "comment",
            ActionKind::Subscribe => "subscribe",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" | "likes" => Ok(ActionKind::Like),
            "comment" | "comments" => Ok(ActionKind::Comment),
            "subscribe" | "subscribes" => Ok(ActionKind::Subscribe),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

/// Parse a prompt answer such as `like, subscribe` or `all`.
///
/// Unknown names are ignored; the result keeps the order of
/// [`ActionKind::ALL`] and holds each kind at most once.
pub fn parse_action_list(input: &str) -> Vec<ActionKind> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return ActionKind::ALL.to_vec();
    }
    let chosen: Vec<ActionKind> = input
        .split(',')
        .filter_map(|part| part.parse().ok())
        .collect();
    ActionKind::ALL
        .into_iter()
        .filter(|kind| chosen.contains(kind))
        .collect()
}

/// Lowercase hex SHA-256 of the text's UTF-8 bytes
pub fn content_fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Progress key for a comment: the same text may go to different videos,
/// but never twice to the same one.
pub fn comment_key(video_id: &str, text: &str) -> String {
    format!("{}::{}", video_id, content_fingerprint(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kinds_case_insensitively() {
        assert_eq!("LIKE".parse::<ActionKind>(), Ok(ActionKind::Like));
        assert_eq!(" subscribe ".parse::<ActionKind>(), Ok(ActionKind::Subscribe));
        assert!("share".parse::<ActionKind>().is_err());
    }

    #[test]
    fn action_list_accepts_all_and_ignores_unknown() {
        assert_eq!(parse_action_list("all"), ActionKind::ALL.to_vec());
        assert_eq!(
            parse_action_list("subscribe, bogus,like,like"),
            vec![ActionKind::Like, ActionKind::Subscribe]
        );
        assert!(parse_action_list("nothing").is_empty());
    }

    #[test]
    fn fingerprint_is_stable_sha256() {
        assert_eq!(
            content_fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn same_text_on_two_videos_gives_distinct_keys() {
        let a = comment_key("aaaaaaaaaaa", "Nice!");
        let b = comment_key("bbbbbbbbbbb", "Nice!");
        assert_ne!(a, b);
        assert_eq!(a, comment_key("aaaaaaaaaaa", "Nice!"));
        assert!(a.starts_with("aaaaaaaaaaa::"));
    }
}
