//! Repository port traits.

use async_trait::async_trait;
use chatrelay_domain::{PresenceStatus, UserId, UserPresence};
use chrono::{DateTime, Utc};

use super::RepoError;

/// Durable user store, as far as presence is concerned.
///
/// The relay only ever writes status transitions; reads exist for
/// diagnostics and tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStatusRepo: Send + Sync {
    /// Set the durable status of a user and refresh its last-seen time.
    async fn set_status(
        &self,
        user_id: &UserId,
        status: PresenceStatus,
        last_seen: DateTime<Utc>,
    ) -> Result<(), RepoError>;

    /// Read back the durable presence of a user.
    async fn get_presence(&self, user_id: &UserId) -> Result<Option<UserPresence>, RepoError>;
}
