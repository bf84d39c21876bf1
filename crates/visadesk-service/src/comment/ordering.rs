//! Comment ordering with configurable pinned authors.

use std::cmp::Ordering;

use tracing::debug;

use visadesk_core::config::CommentsConfig;
use visadesk_entity::Comment;

/// Orders comments: pinned authors first in pinned-list order, then
/// everyone else newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentOrdering {
    /// Lowercased pinned author identities, in priority order.
    pinned: Vec<String>,
}

impl CommentOrdering {
    /// Creates an ordering pinning `authors`. Matching ignores case and
    /// surrounding whitespace; blank entries are skipped.
    pub fn new<I, S>(authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pinned: Vec<String> = Vec::new();
        for author in authors {
            let key = normalize(author.as_ref());
            if !key.is_empty() && !pinned.contains(&key) {
                pinned.push(key);
            }
        }
        Self { pinned }
    }

    /// Build from the `comments` configuration section.
    pub fn from_config(config: &CommentsConfig) -> Self {
        Self::new(&config.pinned_authors)
    }

    /// Position of `author` in the pinned list.
    pub fn pin_rank(&self, author: &str) -> Option<usize> {
        let key = normalize(author);
        self.pinned.iter().position(|p| *p == key)
    }

    /// Whether `author` is pinned.
    pub fn is_pinned(&self, author: &str) -> bool {
        self.pin_rank(author).is_some()
    }

    /// Compare two comments under this ordering.
    pub fn compare(&self, a: &Comment, b: &Comment) -> Ordering {
        match (self.pin_rank(&a.author), self.pin_rank(&b.author)) {
            (Some(ra), Some(rb)) => ra
                .cmp(&rb)
                .then_with(|| b.created_at.cmp(&a.created_at)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.created_at.cmp(&a.created_at),
        }
        .then_with(|| a.id.cmp(&b.id))
    }

    /// Sort `comments` in place.
    pub fn sort(&self, comments: &mut [Comment]) {
        comments.sort_by(|a, b| self.compare(a, b));
        debug!(count = comments.len(), pinned = self.pinned.len(), "Comments ordered");
    }

    /// Return `comments` sorted.
    pub fn sorted(&self, mut comments: Vec<Comment>) -> Vec<Comment> {
        self.sort(&mut comments);
        comments
    }
}

fn normalize(author: &str) -> String {
    author.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn comment(id: &str, author: &str, secs: i64) -> Comment {
        Comment {
            id: id.into(),
            author: author.to_string(),
            body: format!("body {id}"),
            created_at: DateTime::<Utc>::from_timestamp(1_760_000_000 + secs, 0).unwrap(),
        }
    }

    fn ids(comments: &[Comment]) -> Vec<&str> {
        comments.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_without_pins_newest_first() {
        let ordering = CommentOrdering::default();
        let sorted = ordering.sorted(vec![
            comment("1", "ana", 10),
            comment("2", "ben", 30),
            comment("3", "cy", 20),
        ]);
        assert_eq!(ids(&sorted), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_pinned_authors_first_in_list_order() {
        let ordering = CommentOrdering::new(["Officer@Example.com", "lead.reviewer"]);
        let sorted = ordering.sorted(vec![
            comment("1", "applicant", 50),
            comment("2", "lead.reviewer", 10),
            comment("3", "officer@example.com", 5),
            comment("4", "  OFFICER@example.com ", 40),
            comment("5", "applicant", 60),
        ]);
        assert_eq!(ids(&sorted), vec!["4", "3", "2", "5", "1"]);
    }

    #[test]
    fn test_from_config_skips_blank_and_duplicate_entries() {
        let config = CommentsConfig {
            pinned_authors: vec!["a".into(), " ".into(), "A".into(), "b".into()],
        };
        let ordering = CommentOrdering::from_config(&config);
        assert_eq!(ordering.pin_rank("a"), Some(0));
        assert_eq!(ordering.pin_rank("B"), Some(1));
        assert!(!ordering.is_pinned(""));
    }
}
