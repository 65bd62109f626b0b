use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::ChatAPI,
    auth::User,
    entities::{Chat, Message},
    error::Error,
};

#[async_trait]
impl ChatAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_chats(&self, user: User, member_id: Uuid) -> Result<Vec<Chat>, Error> {
        let member = self.fetch_member(member_id).await?;

        self.authorize(user, "read_chats", member)?;

        self.bounded(self.store.list_chats(member_id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_chat(&self, user: User, chat_id: Uuid) -> Result<(), Error> {
        let chat = self.fetch_chat(chat_id).await?;

        self.authorize(user, "delete", chat)?;

        self.bounded(self.store.delete_chat(chat_id)).await?;

        tracing::info!("chat deleted");

        Ok(())
    }

    #[tracing::instrument(skip(self, text))]
    async fn send_message(
        &self,
        user: User,
        chat_id: Uuid,
        text: String,
    ) -> Result<Message, Error> {
        let chat = self.fetch_chat(chat_id).await?;
        let sender_id = user.id;

        self.authorize(user, "send_message", chat)?;

        let message = Message::new(chat_id, sender_id, &text)?;

        self.bounded(self.store.insert_message(&message)).await?;

        tracing::debug!(message_id = %message.id, "message sent");

        Ok(message)
    }

    #[tracing::instrument(skip(self))]
    async fn list_messages(&self, user: User, chat_id: Uuid) -> Result<Vec<Message>, Error> {
        let chat = self.fetch_chat(chat_id).await?;

        self.authorize(user, "read", chat)?;

        self.bounded(self.store.list_messages(chat_id)).await
    }

    #[tracing::instrument(skip(self, text))]
    async fn update_message(
        &self,
        user: User,
        chat_id: Uuid,
        message_id: Uuid,
        text: String,
    ) -> Result<Message, Error> {
        let mut message = self.fetch_message(chat_id, message_id).await?;

        self.authorize(user, "update", message.clone())?;

        message.edit(&text)?;

        self.bounded(self.store.update_message(&message)).await?;

        Ok(message)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_message(
        &self,
        user: User,
        chat_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), Error> {
        let message = self.fetch_message(chat_id, message_id).await?;

        self.authorize(user, "delete", message)?;

        self.bounded(self.store.delete_message(message_id)).await
    }
}
