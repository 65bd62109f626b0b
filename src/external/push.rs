use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    entities::{Member, Notification},
    error::Error,
};

/// Delivers inbox notifications to a member's device.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, recipient: &Member, notification: &Notification)
        -> Result<(), Error>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    #[tracing::instrument(skip_all, fields(member_id = %recipient.id, kind = notification.kind.name()))]
    async fn dispatch(
        &self,
        recipient: &Member,
        notification: &Notification,
    ) -> Result<(), Error> {
        tracing::info!(
            push_token = recipient.push_token.as_deref().unwrap_or("none"),
            "{}: {}",
            notification.title,
            notification.message
        );

        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushMessage<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    data: PushData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushData<'a> {
    kind: &'a str,
    notification_id: Uuid,
    booking_id: Uuid,
    ride_id: Uuid,
}

/// Posts notifications as JSON to a push relay.
#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[tracing::instrument(skip_all, fields(member_id = %recipient.id, kind = notification.kind.name()))]
    async fn dispatch(
        &self,
        recipient: &Member,
        notification: &Notification,
    ) -> Result<(), Error> {
        let token = match recipient.push_token.as_deref() {
            Some(token) => token,
            None => {
                tracing::debug!("member has no push token, skipping delivery");
                return Ok(());
            }
        };

        let message = PushMessage {
            to: token,
            title: &notification.title,
            body: &notification.message,
            data: PushData {
                kind: notification.kind.name(),
                notification_id: notification.id,
                booking_id: notification.booking_id,
                ride_id: notification.ride_id,
            },
        };

        let res = self.client.post(&self.url).json(&message).send().await?;

        let status_code = res.status().as_u16();

        if (400..500).contains(&status_code) {
            return Err(Error::invalid_input_error(format!(
                "push relay rejected the message with status {}",
                status_code
            )));
        } else if !res.status().is_success() {
            return Err(Error::upstream_error());
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::net::{SocketAddr, TcpListener};
    use std::sync::{Arc, Mutex};

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;

    use super::*;
    use crate::entities::ride::new_ride_spec;
    use crate::entities::{Booking, NewBooking, NewMember, Ride};

    type Received = Arc<Mutex<Vec<Value>>>;

    /// Push relay on a free local port that answers every post with `status`.
    fn relay(status: StatusCode) -> (String, Received) {
        let received = Received::default();
        let seen = received.clone();

        let app = Router::new().route(
            "/push",
            post(move |Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(body);
                    status
                }
            }),
        );

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).unwrap();
        let addr = listener.local_addr().unwrap();
        let server = axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service());
        tokio::spawn(server);

        (format!("http://{}/push", addr), received)
    }

    fn recipient(push_token: Option<&str>) -> Member {
        let mut member = Member::new(NewMember {
            name: "Parveen".into(),
            email: "parveen@campus.edu".into(),
            phone: None,
            profile_image_url: None,
        })
        .unwrap();
        member.push_token = push_token.map(String::from);
        member
    }

    fn notification(member: &Member) -> Notification {
        let ride = Ride::new(new_ride_spec(Uuid::new_v4(), "2099-01-01", "09:00", 3)).unwrap();
        let booking = Booking::new(
            &ride,
            NewBooking {
                ride_id: ride.id,
                passenger_id: member.id,
                seats_requested: 1,
                stop_location: None,
            },
        );

        Notification::booking_accepted(&booking, &ride)
    }

    #[tokio::test]
    async fn members_without_a_token_are_skipped() {
        // nothing listens on the discard port, any request would fail
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/push");
        let member = recipient(None);

        assert!(notifier
            .dispatch(&member, &notification(&member))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn delivered_message_targets_the_token() {
        let (url, received) = relay(StatusCode::OK);
        let notifier = WebhookNotifier::new(url);
        let member = recipient(Some("device-1"));
        let notification = notification(&member);

        notifier.dispatch(&member, &notification).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["to"], "device-1");
        assert_eq!(received[0]["title"], notification.title.as_str());
        assert_eq!(received[0]["data"]["kind"], "booking_accepted");
        assert_eq!(
            received[0]["data"]["bookingId"],
            notification.booking_id.to_string()
        );
    }

    #[tokio::test]
    async fn relay_client_errors_are_validation_errors() {
        let (url, _) = relay(StatusCode::BAD_REQUEST);
        let notifier = WebhookNotifier::new(url);
        let member = recipient(Some("stale-token"));

        let err = notifier
            .dispatch(&member, &notification(&member))
            .await
            .unwrap_err();

        assert!(err.is_invalid_input_error());
    }

    #[tokio::test]
    async fn relay_server_errors_are_upstream_errors() {
        let (url, _) = relay(StatusCode::SERVICE_UNAVAILABLE);
        let notifier = WebhookNotifier::new(url);
        let member = recipient(Some("device-1"));

        let err = notifier
            .dispatch(&member, &notification(&member))
            .await
            .unwrap_err();

        assert_eq!(err.code, Error::upstream_error().code);
    }
}
