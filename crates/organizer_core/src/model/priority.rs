//! Priority prefix parsing for task titles.
//!
//! # Responsibility
//! - Extract hierarchical priority keys such as `2.1` from free-text titles.
//!
//! # Invariants
//! - Parsing never fails loudly; unrecognized prefixes simply yield `None`.
//! - Titles are never rewritten by parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

static PRIORITY_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.?\s").expect("valid priority regex"));

/// Dotted numeric priority parsed from a title prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriorityKey {
    segments: Vec<u32>,
}

impl PriorityKey {
    /// Builds a key from explicit segments.
    pub fn new(segments: Vec<u32>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    /// Element-wise comparison where missing trailing segments count as `0`.
    ///
    /// `[2]` and `[2, 0]` compare equal; this is intentionally not `Ord`.
    pub fn compare(&self, other: &Self) -> Ordering {
        let width = self.segments.len().max(other.segments.len());
        (0..width)
            .map(|index| {
                let left = self.segments.get(index).copied().unwrap_or(0);
                let right = other.segments.get(index).copied().unwrap_or(0);
                left.cmp(&right)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Parses the leading `N(.N)*` priority prefix of `title`.
///
/// The prefix must be followed by an optional `.` and whitespace:
/// `"2.1 Subtask"` and `"10. Buy milk"` match, `"1.a Task"` and `"2.1"` don't.
pub fn parse_priority(title: &str) -> Option<PriorityKey> {
    let captures = PRIORITY_PREFIX_RE.captures(title)?;
    let prefix = captures.get(1)?.as_str();
    let segments = prefix
        .split('.')
        .map(|segment| segment.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    Some(PriorityKey::new(segments))
}

#[cfg(test)]
mod tests {
    use super::{parse_priority, PriorityKey};
    use std::cmp::Ordering;

    fn key(segments: &[u32]) -> PriorityKey {
        PriorityKey::new(segments.to_vec())
    }

    #[test]
    fn parses_single_and_nested_prefixes() {
        assert_eq!(parse_priority("2.1 Subtask"), Some(key(&[2, 1])));
        assert_eq!(parse_priority("10. Buy milk"), Some(key(&[10])));
        assert_eq!(parse_priority("3 Pay rent"), Some(key(&[3])));
        assert_eq!(parse_priority("1.2.3. Deep"), Some(key(&[1, 2, 3])));
    }

    #[test]
    fn non_matching_titles_yield_none() {
        assert_eq!(parse_priority("Buy milk"), None);
        assert_eq!(parse_priority("1.a Task"), None);
        assert_eq!(parse_priority("2.1"), None);
        assert_eq!(parse_priority("v2 release"), None);
        assert_eq!(parse_priority("99999999999 overflow"), None);
    }

    #[test]
    fn compare_pads_missing_segments_with_zero() {
        assert_eq!(key(&[2]).compare(&key(&[2, 1])), Ordering::Less);
        assert_eq!(key(&[2]).compare(&key(&[2, 0])), Ordering::Equal);
        assert_eq!(key(&[10]).compare(&key(&[9, 9])), Ordering::Greater);
    }
}
