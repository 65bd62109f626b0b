mod extract;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{bookings, chats, drivers, members, passengers, rides, vehicles};
use crate::{api::API, auth::User, error::Error};

pub type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/members", post(members::create))
        .route("/members/:id", get(members::find).patch(members::update))
        .route("/members/:id/push-token", post(members::update_push_token))
        .route("/members/:id/chats", get(members::chats))
        .route("/members/:id/notifications", get(members::notifications))
        .route(
            "/members/:id/notifications/:notification_id/read",
            post(members::mark_notification_read),
        )
        .route("/chats/:id", delete(chats::delete))
        .route(
            "/chats/:id/messages",
            get(chats::messages).post(chats::send_message),
        )
        .route(
            "/chats/:id/messages/:message_id",
            patch(chats::update_message).delete(chats::delete_message),
        )
        .route("/vehicles", post(vehicles::create))
        .route("/vehicles/:id", patch(vehicles::update))
        .route("/rides", post(rides::create).get(rides::search))
        .route("/rides/:id", get(rides::find))
        .route("/rides/:id/bookings", get(rides::bookings))
        .route("/bookings", post(bookings::create))
        .route("/bookings/:id", get(bookings::find))
        .route("/bookings/:id/accept", post(bookings::accept))
        .route("/bookings/:id/reject", post(bookings::reject))
        .route("/bookings/:id/cancel", post(bookings::cancel))
        .route("/passengers/:id/bookings", get(passengers::bookings))
        .route(
            "/passengers/:id/rides/:ride_id/booking",
            get(passengers::active_booking),
        )
        .route("/drivers/:id/bookings", get(drivers::bookings))
        .route("/drivers/:id/vehicles", get(drivers::vehicles))
        .layer(Extension(api))
        // There is no authentication layer. Mutating routes act as the member
        // id the caller puts in the path or body, reads act as the system user.
        .layer(Extension(User::new_system_user()))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let app = router(Arc::new(api) as DynAPI);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!("server error: {}", err);
            Error::unexpected_error()
        })
}
