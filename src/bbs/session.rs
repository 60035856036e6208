use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// # Connection Session
///
/// Per-connection state owned exclusively by the task serving that connection.
/// Nothing here is shared, so no locking is involved.
///
/// ## Lifecycle
///
/// 1. Created when the connection is accepted (`username: None`)
/// 2. `%join <name>` sets the username
/// 3. `%groupjoin` / `%groupleave` add and remove group ids
/// 4. `%leave` clears the username and the group ids
/// 5. Dropped when the connection ends, by whichever path
///
/// ```rust
/// use boardd::bbs::session::Session;
///
/// let mut session = Session::new("1".to_string(), "127.0.0.1:40000".to_string());
/// assert!(!session.is_joined());
/// session.join("alice".to_string());
/// assert_eq!(session.display_name(), "alice");
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub peer: String,
    pub username: Option<String>,
    /// Ids of the group boards this connection has joined.
    pub member_groups: BTreeSet<String>,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, peer: String) -> Self {
        let now = Utc::now();
        Session {
            id,
            peer,
            username: None,
            member_groups: BTreeSet::new(),
            connected_at: now,
            last_activity: now,
        }
    }

    /// Update the last activity timestamp
    pub fn update_activity(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Bind a username to this connection, replacing any previous one.
    pub fn join(&mut self, username: String) {
        self.username = Some(username);
    }

    /// Clear the username, returning the one that was set.
    pub fn leave(&mut self) -> Option<String> {
        self.username.take()
    }

    pub fn is_joined(&self) -> bool {
        self.username.is_some()
    }

    /// Get the username, or "Guest" if not joined
    pub fn display_name(&self) -> String {
        self.username.clone().unwrap_or_else(|| "Guest".to_string())
    }

    pub fn join_group(&mut self, group_id: &str) {
        self.member_groups.insert(group_id.to_string());
    }

    pub fn leave_group(&mut self, group_id: &str) -> bool {
        self.member_groups.remove(group_id)
    }

    pub fn is_member(&self, group_id: &str) -> bool {
        self.member_groups.contains(group_id)
    }

    /// Forget every group membership, returning the ids that were held.
    pub fn take_groups(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.member_groups)
    }

    pub fn session_duration(&self) -> chrono::Duration {
        self.last_activity - self.connected_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_and_leave_round_trip() {
        let mut s = Session::new("1".into(), "peer".into());
        assert_eq!(s.display_name(), "Guest");
        s.join("bob".into());
        assert!(s.is_joined());
        assert_eq!(s.leave(), Some("bob".into()));
        assert_eq!(s.leave(), None);
    }

    #[test]
    fn group_membership_tracking() {
        let mut s = Session::new("1".into(), "peer".into());
        s.join_group("2");
        s.join_group("2");
        assert!(s.is_member("2"));
        assert_eq!(s.member_groups.len(), 1);
        assert!(s.leave_group("2"));
        assert!(!s.leave_group("2"));
    }

    #[test]
    fn take_groups_empties_membership() {
        let mut s = Session::new("1".into(), "peer".into());
        s.join_group("1");
        s.join_group("3");
        let taken = s.take_groups();
        assert_eq!(taken.into_iter().collect::<Vec<_>>(), vec!["1", "3"]);
        assert!(!s.is_member("1"));
        assert!(s.session_duration() >= chrono::Duration::zero());
    }
}
