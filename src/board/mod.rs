//! # Message Boards
//!
//! A [`Board`] is the shared state behind one bulletin board: the set of joined
//! usernames and the ordered, sequentially-numbered posts. The public board and
//! every group board use the same type; group boards are wrapped by
//! [`registry::GroupBoard`] which adds the configured id and display name.
//!
//! ## Concurrency
//!
//! Every connection task holds an `Arc` to the same boards. Each board guards its
//! users, posts and id counter behind a single `parking_lot::Mutex`, so:
//!
//! - id assignment in [`Board::add_post`] is atomic (no two posts share an id)
//! - concurrent joins and leaves never lose updates
//! - readers never observe a half-applied mutation
//!
//! Locks are held only for the duration of one in-memory operation and never
//! across an `.await`.
//!
//! ## Holders
//!
//! Several connections may join under the same username. The board counts how
//! many sessions hold each name and lists the name until the last holder
//! removes it, so one connection leaving never un-joins another.
//!
//! ## Ids
//!
//! Post ids start at 1 and are never reused, even after the poster leaves.

pub mod registry;

use parking_lot::Mutex;
use std::collections::BTreeMap;
use thiserror::Error;

pub use registry::{BoardRegistry, GroupBoard};

/// Errors raised by board and registry lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    /// No post with this id exists on the board.
    #[error("message {0} not found")]
    NotFound(u64),

    /// The identifier matched neither a group id nor a group name.
    #[error("unknown group: {0}")]
    UnknownGroup(String),
}

/// An immutable message stored on a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: u64,
    pub sender: String,
    /// Caller-supplied date text; stored verbatim.
    pub post_date: String,
    pub subject: String,
    pub content: String,
}

impl Post {
    /// Canonical text form returned by `%message` / `%groupmessage`.
    pub fn render(&self) -> String {
        format!("Subject: {}\nContent: {}", self.subject, self.content)
    }
}

#[derive(Debug)]
struct BoardState {
    // Insertion order with the holder count of each name; counts are never zero.
    users: Vec<(String, usize)>,
    posts: BTreeMap<u64, Post>,
    next_id: u64,
}

/// A single message board shared across connections.
#[derive(Debug)]
pub struct Board {
    state: Mutex<BoardState>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Board {
            state: Mutex::new(BoardState {
                users: Vec::new(),
                posts: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Add one holder of `name`. The name is listed once however many
    /// sessions hold it.
    ///
    /// Returns `true` when the name was newly listed.
    pub fn add_user(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        if let Some((_, holders)) = state.users.iter_mut().find(|(u, _)| u == name) {
            *holders += 1;
            return false;
        }
        state.users.push((name.to_string(), 1));
        true
    }

    /// Drop one holder of `name`; absent names are a no-op.
    ///
    /// Returns `true` when the last holder left and the name was unlisted.
    pub fn remove_user(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(pos) = state.users.iter().position(|(u, _)| u == name) else {
            return false;
        };
        state.users[pos].1 -= 1;
        if state.users[pos].1 == 0 {
            state.users.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.state.lock().users.iter().any(|(u, _)| u == name)
    }

    /// Snapshot of the joined users in join order.
    pub fn list_users(&self) -> Vec<String> {
        self.state.lock().users.iter().map(|(u, _)| u.clone()).collect()
    }

    /// Append a post and return its id.
    ///
    /// Membership of `sender` is not checked here; callers decide who may post.
    pub fn add_post(&self, sender: &str, post_date: &str, subject: &str, content: &str) -> u64 {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.posts.insert(
            id,
            Post {
                id,
                sender: sender.to_string(),
                post_date: post_date.to_string(),
                subject: subject.to_string(),
                content: content.to_string(),
            },
        );
        id
    }

    pub fn get_post(&self, id: u64) -> Result<Post, BoardError> {
        self.state
            .lock()
            .posts
            .get(&id)
            .cloned()
            .ok_or(BoardError::NotFound(id))
    }

    /// Rendered subject and content of post `id`.
    pub fn get_message(&self, id: u64) -> Result<String, BoardError> {
        self.get_post(id).map(|p| p.render())
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().posts.len()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn add_user_is_idempotent() {
        let board = Board::new();
        assert!(board.add_user("alice"));
        assert!(!board.add_user("alice"));
        assert_eq!(board.list_users(), vec!["alice".to_string()]);
    }

    #[test]
    fn users_listed_in_join_order() {
        let board = Board::new();
        board.add_user("carol");
        board.add_user("alice");
        board.add_user("bob");
        board.add_user("carol");
        assert_eq!(board.list_users(), vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn shared_name_stays_until_last_holder_leaves() {
        let board = Board::new();
        assert!(board.add_user("alice"));
        assert!(!board.add_user("alice"));
        assert!(!board.remove_user("alice"));
        assert!(board.has_user("alice"));
        assert!(board.remove_user("alice"));
        assert!(!board.has_user("alice"));
        assert!(!board.remove_user("alice"));
    }

    #[test]
    fn remove_absent_user_is_noop() {
        let board = Board::new();
        board.add_user("alice");
        assert!(!board.remove_user("bob"));
        assert!(board.remove_user("alice"));
        assert!(board.list_users().is_empty());
    }

    #[test]
    fn ids_start_at_one_and_survive_leave() {
        let board = Board::new();
        board.add_user("bob");
        assert_eq!(board.add_post("bob", "2024-01-01", "Hello", "World"), 1);
        board.remove_user("bob");
        board.add_user("bob");
        assert_eq!(board.add_post("bob", "2024-01-02", "Again", "Text"), 2);
        assert_eq!(board.post_count(), 2);
    }

    #[test]
    fn get_message_renders_subject_and_content() {
        let board = Board::new();
        let id = board.add_post("bob", "2024-01-01", "Hello", "World");
        assert_eq!(board.get_message(id).unwrap(), "Subject: Hello\nContent: World");
        let post = board.get_post(id).unwrap();
        assert_eq!(post.sender, "bob");
        assert_eq!(post.post_date, "2024-01-01");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let board = Board::new();
        assert_eq!(board.get_message(0), Err(BoardError::NotFound(0)));
        board.add_post("a", "d", "s", "c");
        assert_eq!(board.get_message(2), Err(BoardError::NotFound(2)));
    }

    #[test]
    fn concurrent_posts_get_distinct_ids() {
        let board = Arc::new(Board::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let board = board.clone();
            handles.push(std::thread::spawn(move || {
                (0..250)
                    .map(|i| board.add_post(&format!("u{t}"), "d", "s", &i.to_string()))
                    .collect::<Vec<_>>()
            }));
        }
        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 2000);
        assert_eq!(board.post_count(), 2000);
        assert_eq!(seen.iter().copied().max(), Some(2000));
    }

    #[test]
    fn concurrent_joins_do_not_lose_users() {
        let board = Arc::new(Board::new());
        let handles: Vec<_> = (0..16)
            .map(|t| {
                let board = board.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        board.add_user(&format!("user-{t}-{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(board.user_count(), 800);
    }
}
