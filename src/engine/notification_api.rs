use super::{Engine, INBOX_LIMIT};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::NotificationAPI,
    auth::User,
    entities::{Inbox, Notification},
    error::Error,
};

#[async_trait]
impl NotificationAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_notifications(&self, user: User, member_id: Uuid) -> Result<Inbox, Error> {
        let member = self.fetch_member(member_id).await?;

        self.authorize(user, "read_notifications", member)?;

        let notifications = self
            .bounded(self.store.list_notifications(member_id, INBOX_LIMIT))
            .await?;
        let unread_count = self
            .bounded(self.store.count_unread_notifications(member_id))
            .await?;

        Ok(Inbox {
            notifications,
            unread_count,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn mark_notification_read(
        &self,
        user: User,
        member_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Notification, Error> {
        let member = self.fetch_member(member_id).await?;

        self.authorize(user, "update", member)?;

        self.bounded(
            self.store
                .mark_notification_read(member_id, notification_id),
        )
        .await
    }
}
