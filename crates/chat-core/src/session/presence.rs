//! Local presence roster
//!
//! Named chatters in recency order (most recent first) plus the total number
//! of connected identities the server reports. Identities the server counts
//! but never names are lurkers.

/// Presence roster built from broadcast events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceCache {
    users: Vec<String>,
    total: u32,
}

impl PresenceCache {
    /// Create an empty roster
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a join: prepend the user and adopt the server count
    ///
    /// Without a server count the total grows by one per join.
    /// Returns `true` if the roster changed.
    pub fn join(&mut self, user: Option<&str>, user_count: Option<u32>) -> bool {
        let before = self.fingerprint();

        if let Some(user) = user {
            self.users.insert(0, user.to_string());
        }
        self.total = match user_count {
            Some(count) => count,
            None => self.total.saturating_add(1),
        };

        self.fingerprint() != before
    }

    /// Apply a leave: drop the first matching user and shrink the total
    ///
    /// A server count is authoritative and still includes the departing
    /// client, so the total becomes `user_count - 1`. Without one, the total
    /// shrinks by one only when a named user was removed.
    /// Returns `true` if the roster changed.
    pub fn leave(&mut self, user: Option<&str>, user_count: Option<u32>) -> bool {
        let before = self.fingerprint();

        let removed = user
            .and_then(|user| self.users.iter().position(|u| u == user))
            .map(|index| self.users.remove(index))
            .is_some();

        match user_count {
            Some(count) => self.total = count.saturating_sub(1),
            None if removed => self.total = self.total.saturating_sub(1),
            None => {}
        }

        self.fingerprint() != before
    }

    /// Record a user seen on an ordinary message, if not already known
    ///
    /// Returns `true` if the roster changed.
    pub fn observe(&mut self, user: &str, user_count: Option<u32>) -> bool {
        let before = self.fingerprint();

        if !self.contains(user) {
            self.users.insert(0, user.to_string());
        }
        if let Some(count) = user_count {
            self.total = count;
        }

        self.fingerprint() != before
    }

    /// Named users, most recent first
    #[must_use]
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Total connected identities
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Connected identities that are not named in the roster
    #[must_use]
    pub fn lurkers(&self) -> u32 {
        let named = u32::try_from(self.users.len()).unwrap_or(u32::MAX);
        self.total.saturating_sub(named)
    }

    /// Check if a user is named in the roster
    #[must_use]
    pub fn contains(&self, user: &str) -> bool {
        self.users.iter().any(|u| u == user)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.users.clear();
        self.total = 0;
    }

    // Joins only prepend and leaves only remove, so length plus total is
    // enough to tell whether anything moved.
    fn fingerprint(&self) -> (usize, u32) {
        (self.users.len(), self.total)
    }
}
