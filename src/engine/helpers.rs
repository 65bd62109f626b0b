use std::future::Future;

use uuid::Uuid;

use super::Engine;
use crate::{
    entities::{Booking, Chat, Member, Message, Notification, Ride, Vehicle},
    error::Error,
};

impl Engine {
    /// Runs a store call under the configured timeout.
    pub(super) async fn bounded<T, F>(&self, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        tokio::time::timeout(self.settings.store_timeout, call).await?
    }

    #[tracing::instrument(skip(self))]
    pub(super) async fn fetch_member(&self, id: Uuid) -> Result<Member, Error> {
        self.bounded(self.store.find_member(id))
            .await?
            .ok_or_else(|| Error::not_found_error("member"))
    }

    #[tracing::instrument(skip(self))]
    pub(super) async fn fetch_ride(&self, id: Uuid) -> Result<Ride, Error> {
        self.bounded(self.store.find_ride(id))
            .await?
            .ok_or_else(|| Error::not_found_error("ride"))
    }

    #[tracing::instrument(skip(self))]
    pub(super) async fn fetch_booking(&self, id: Uuid) -> Result<Booking, Error> {
        self.bounded(self.store.find_booking(id))
            .await?
            .ok_or_else(|| Error::not_found_error("booking"))
    }

    #[tracing::instrument(skip(self))]
    pub(super) async fn fetch_vehicle(&self, id: Uuid) -> Result<Vehicle, Error> {
        self.bounded(self.store.find_vehicle(id))
            .await?
            .ok_or_else(|| Error::not_found_error("vehicle"))
    }

    #[tracing::instrument(skip(self))]
    pub(super) async fn fetch_chat(&self, id: Uuid) -> Result<Chat, Error> {
        self.bounded(self.store.find_chat(id))
            .await?
            .ok_or_else(|| Error::not_found_error("chat"))
    }

    /// A message of another chat is reported as missing.
    #[tracing::instrument(skip(self))]
    pub(super) async fn fetch_message(&self, chat_id: Uuid, id: Uuid) -> Result<Message, Error> {
        self.bounded(self.store.find_message(id))
            .await?
            .filter(|message| message.chat_id == chat_id)
            .ok_or_else(|| Error::not_found_error("message"))
    }

    /// Stores `notification` in the recipient's inbox and hands it to the
    /// notifier. Failures are logged and swallowed.
    #[tracing::instrument(skip_all, fields(member_id = %notification.member_id, kind = notification.kind.name()))]
    pub(super) async fn notify(&self, notification: Notification) {
        if let Err(err) = self.deliver(&notification).await {
            tracing::warn!("failed to deliver notification: {}", err);
        }
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), Error> {
        self.bounded(self.store.insert_notification(notification))
            .await?;

        let recipient = self.fetch_member(notification.member_id).await?;

        self.notifier.dispatch(&recipient, notification).await
    }

    /// Opens the chat for an accepted booking, or reuses the pair's chat.
    #[tracing::instrument(skip_all, fields(booking_id = %booking.id))]
    pub(super) async fn open_chat(&self, booking: &Booking) {
        let chat = Chat::for_booking(booking);

        match self.bounded(self.store.open_chat(&chat)).await {
            Ok(chat) => tracing::info!(chat_id = %chat.id, "chat ready"),
            Err(err) => tracing::warn!("failed to open chat: {}", err),
        }
    }
}
