use async_trait::async_trait;
use futures::{future, TryStreamExt};
use serde::de::DeserializeOwned;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions, PgRow},
    query::Query,
    types::Json,
    Executor, Pool, Postgres, Row, Transaction,
};
use uuid::Uuid;

use super::{duplicate_booking_error, seats_error, status_changed_error, Store};
use crate::entities::{Booking, Chat, Member, Message, Notification, Ride, Vehicle};
use crate::error::Error;

type Database = Postgres;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS members (id UUID PRIMARY KEY, data JSONB NOT NULL)",
    "CREATE TABLE IF NOT EXISTS vehicles (id UUID PRIMARY KEY, driver_id UUID NOT NULL REFERENCES members(id), created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE INDEX IF NOT EXISTS vehicles_driver ON vehicles (driver_id, created_at DESC)",
    "CREATE TABLE IF NOT EXISTS rides (id UUID PRIMARY KEY, driver_id UUID NOT NULL REFERENCES members(id), available_seats INT4 NOT NULL, total_seats INT4 NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL, CONSTRAINT rides_seats_in_bounds CHECK (available_seats >= 0 AND available_seats <= total_seats))",
    "CREATE INDEX IF NOT EXISTS rides_created_at ON rides (created_at DESC)",
    "CREATE TABLE IF NOT EXISTS bookings (id UUID PRIMARY KEY, ride_id UUID NOT NULL REFERENCES rides(id), driver_id UUID NOT NULL, passenger_id UUID NOT NULL, status VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE INDEX IF NOT EXISTS bookings_ride_passenger ON bookings (ride_id, passenger_id)",
    "CREATE INDEX IF NOT EXISTS bookings_driver ON bookings (driver_id)",
    "CREATE TABLE IF NOT EXISTS chats (id UUID PRIMARY KEY, driver_id UUID NOT NULL, passenger_id UUID NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE UNIQUE INDEX IF NOT EXISTS chats_participants ON chats (LEAST(driver_id, passenger_id), GREATEST(driver_id, passenger_id))",
    "CREATE TABLE IF NOT EXISTS messages (id UUID PRIMARY KEY, chat_id UUID NOT NULL REFERENCES chats(id) ON DELETE CASCADE, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE INDEX IF NOT EXISTS messages_chat ON messages (chat_id, created_at)",
    "CREATE TABLE IF NOT EXISTS notifications (id UUID PRIMARY KEY, member_id UUID NOT NULL, is_read BOOLEAN NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE INDEX IF NOT EXISTS notifications_member ON notifications (member_id, created_at DESC)",
];

// keeps `data.availableSeats` in step with the column
const APPLY_SEAT_DELTA: &str = "
    UPDATE rides
    SET
        available_seats = available_seats + $2,
        data = jsonb_set(data, '{availableSeats}', to_jsonb(available_seats + $2))
    WHERE
        id = $1
        AND available_seats + $2 BETWEEN 0 AND total_seats
    RETURNING data
";

pub struct PgStore {
    pool: Pool<Database>,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::new", skip(db_uri))]
    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        // TODO: move this to sqlx migrations once the schema settles
        for statement in SCHEMA {
            pool.execute(*statement).await?;
        }

        Ok(Self { pool })
    }

    async fn fetch_data<T: DeserializeOwned>(
        &self,
        query: Query<'_, Database, PgArguments>,
    ) -> Result<Option<T>, Error> {
        match self.pool.fetch_optional(query).await? {
            Some(row) => Ok(Some(decode_data(&row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_all_data<T: DeserializeOwned + Send>(
        &self,
        query: Query<'_, Database, PgArguments>,
    ) -> Result<Vec<T>, Error> {
        self.pool
            .fetch(query)
            .map_err(Error::from)
            .and_then(|row| future::ready(decode_data(&row)))
            .try_collect()
            .await
    }
}

fn decode_data<T: DeserializeOwned>(row: &PgRow) -> Result<T, Error> {
    let Json(data): Json<T> = row.try_get("data")?;
    Ok(data)
}

#[tracing::instrument(skip(tx))]
async fn fetch_ride_for_update(
    tx: &mut Transaction<'_, Database>,
    id: Uuid,
) -> Result<Ride, Error> {
    let row = tx
        .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(|| Error::not_found_error("ride"))?;

    decode_data(&row)
}

#[tracing::instrument(skip(tx))]
async fn fetch_booking_for_update(
    tx: &mut Transaction<'_, Database>,
    id: Uuid,
) -> Result<Booking, Error> {
    let row = tx
        .fetch_optional(
            sqlx::query("SELECT data FROM bookings WHERE id = $1 FOR UPDATE").bind(id),
        )
        .await?
        .ok_or_else(|| Error::not_found_error("booking"))?;

    decode_data(&row)
}

/// Conditional seat update. `None` means the ride is missing or the delta
/// would leave its bounds.
#[tracing::instrument(skip(tx))]
async fn apply_seat_delta(
    tx: &mut Transaction<'_, Database>,
    ride_id: Uuid,
    delta: i32,
) -> Result<Option<Ride>, Error> {
    match tx
        .fetch_optional(sqlx::query(APPLY_SEAT_DELTA).bind(ride_id).bind(delta))
        .await?
    {
        Some(row) => Ok(Some(decode_data(&row)?)),
        None => Ok(None),
    }
}

#[tracing::instrument(skip(tx))]
async fn seat_delta_failure(
    tx: &mut Transaction<'_, Database>,
    ride_id: Uuid,
    delta: i32,
) -> Result<Error, Error> {
    let row = tx
        .fetch_optional(sqlx::query("SELECT data FROM rides WHERE id = $1").bind(ride_id))
        .await?;

    Ok(match row {
        Some(row) => seats_error(&decode_data(&row)?, delta),
        None => Error::not_found_error("ride"),
    })
}

#[tracing::instrument(skip(tx, booking), fields(booking_id = %booking.id))]
async fn update_booking(
    tx: &mut Transaction<'_, Database>,
    booking: &Booking,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE bookings SET status = $2, data = $3 WHERE id = $1")
            .bind(booking.id)
            .bind(booking.status.name())
            .bind(Json(booking)),
    )
    .await?;

    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn insert_member(&self, member: &Member) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query("INSERT INTO members (id, data) VALUES ($1, $2)")
                    .bind(member.id)
                    .bind(Json(member)),
            )
            .await?;

        Ok(())
    }

    async fn find_member(&self, id: Uuid) -> Result<Option<Member>, Error> {
        self.fetch_data(sqlx::query("SELECT data FROM members WHERE id = $1").bind(id))
            .await
    }

    async fn update_member(&self, member: &Member) -> Result<(), Error> {
        let result = self
            .pool
            .execute(
                sqlx::query("UPDATE members SET data = $2 WHERE id = $1")
                    .bind(member.id)
                    .bind(Json(member)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found_error("member"));
        }

        Ok(())
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query("INSERT INTO vehicles (id, driver_id, created_at, data) VALUES ($1, $2, $3, $4)")
                    .bind(vehicle.id)
                    .bind(vehicle.driver_id)
                    .bind(vehicle.created_at)
                    .bind(Json(vehicle)),
            )
            .await?;

        Ok(())
    }

    async fn find_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, Error> {
        self.fetch_data(sqlx::query("SELECT data FROM vehicles WHERE id = $1").bind(id))
            .await
    }

    async fn list_vehicles_for_driver(&self, driver_id: Uuid) -> Result<Vec<Vehicle>, Error> {
        self.fetch_all_data(
            sqlx::query("SELECT data FROM vehicles WHERE driver_id = $1 ORDER BY created_at DESC")
                .bind(driver_id),
        )
        .await
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), Error> {
        let result = self
            .pool
            .execute(
                sqlx::query("UPDATE vehicles SET data = $2 WHERE id = $1")
                    .bind(vehicle.id)
                    .bind(Json(vehicle)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found_error("vehicle"));
        }

        Ok(())
    }

    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query("INSERT INTO rides (id, driver_id, available_seats, total_seats, created_at, data) VALUES ($1, $2, $3, $4, $5, $6)")
                    .bind(ride.id)
                    .bind(ride.driver_id)
                    .bind(ride.available_seats)
                    .bind(ride.total_seats)
                    .bind(ride.created_at)
                    .bind(Json(ride)),
            )
            .await?;

        Ok(())
    }

    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        self.fetch_data(sqlx::query("SELECT data FROM rides WHERE id = $1").bind(id))
            .await
    }

    async fn list_rides_with_seats(&self) -> Result<Vec<Ride>, Error> {
        self.fetch_all_data(sqlx::query(
            "SELECT data FROM rides WHERE available_seats > 0 ORDER BY created_at DESC",
        ))
        .await
    }

    async fn adjust_seats(&self, ride_id: Uuid, delta: i32) -> Result<Ride, Error> {
        let mut tx = self.pool.begin().await?;

        let updated = apply_seat_delta(&mut tx, ride_id, delta).await?;

        match updated {
            Some(ride) => {
                tx.commit().await?;
                Ok(ride)
            }
            None => {
                let err = seat_delta_failure(&mut tx, ride_id, delta).await?;
                tx.rollback().await?;
                Err(err)
            }
        }
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        // serializes booking requests per ride so the duplicate check below holds
        fetch_ride_for_update(&mut tx, booking.ride_id).await?;

        let duplicate = tx
            .fetch_optional(
                sqlx::query("SELECT id FROM bookings WHERE ride_id = $1 AND passenger_id = $2 AND status IN ('pending', 'accepted') LIMIT 1")
                    .bind(booking.ride_id)
                    .bind(booking.passenger_id),
            )
            .await?;

        if duplicate.is_some() {
            tx.rollback().await?;
            return Err(duplicate_booking_error());
        }

        tx.execute(
            sqlx::query("INSERT INTO bookings (id, ride_id, driver_id, passenger_id, status, created_at, data) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                .bind(booking.id)
                .bind(booking.ride_id)
                .bind(booking.driver_id)
                .bind(booking.passenger_id)
                .bind(booking.status.name())
                .bind(booking.created_at)
                .bind(Json(booking)),
        )
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, Error> {
        self.fetch_data(sqlx::query("SELECT data FROM bookings WHERE id = $1").bind(id))
            .await
    }

    async fn find_active_booking(
        &self,
        passenger_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Option<Booking>, Error> {
        self.fetch_data(
            sqlx::query("SELECT data FROM bookings WHERE passenger_id = $1 AND ride_id = $2 AND status IN ('pending', 'accepted') ORDER BY created_at DESC LIMIT 1")
                .bind(passenger_id)
                .bind(ride_id),
        )
        .await
    }

    async fn list_bookings_for_ride(&self, ride_id: Uuid) -> Result<Vec<Booking>, Error> {
        self.fetch_all_data(
            sqlx::query("SELECT data FROM bookings WHERE ride_id = $1 ORDER BY created_at DESC")
                .bind(ride_id),
        )
        .await
    }

    async fn list_bookings_for_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Vec<Booking>, Error> {
        self.fetch_all_data(
            sqlx::query(
                "SELECT data FROM bookings WHERE passenger_id = $1 ORDER BY created_at DESC",
            )
            .bind(passenger_id),
        )
        .await
    }

    async fn list_bookings_for_driver(&self, driver_id: Uuid) -> Result<Vec<Booking>, Error> {
        self.fetch_all_data(
            sqlx::query("SELECT data FROM bookings WHERE driver_id = $1 ORDER BY created_at DESC")
                .bind(driver_id),
        )
        .await
    }

    async fn transition_booking(
        &self,
        previous: &Booking,
        next: &Booking,
        seat_delta: i32,
    ) -> Result<Ride, Error> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_booking_for_update(&mut tx, next.id).await?;

        if current.status.name() != previous.status.name() {
            tx.rollback().await?;
            return Err(status_changed_error(&current, previous));
        }

        let ride = if seat_delta == 0 {
            fetch_ride_for_update(&mut tx, next.ride_id).await?
        } else {
            let updated = apply_seat_delta(&mut tx, next.ride_id, seat_delta).await?;

            match updated {
                Some(ride) => ride,
                None => {
                    let err = seat_delta_failure(&mut tx, next.ride_id, seat_delta).await?;
                    tx.rollback().await?;
                    return Err(err);
                }
            }
        };

        update_booking(&mut tx, next).await?;

        tx.commit().await?;

        Ok(ride)
    }

    async fn open_chat(&self, chat: &Chat) -> Result<Chat, Error> {
        let mut tx = self.pool.begin().await?;

        tx.execute(
            sqlx::query("INSERT INTO chats (id, driver_id, passenger_id, created_at, data) VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING")
                .bind(chat.id)
                .bind(chat.driver_id)
                .bind(chat.passenger_id)
                .bind(chat.created_at)
                .bind(Json(chat)),
        )
        .await?;

        let row = tx
            .fetch_one(
                sqlx::query("SELECT data FROM chats WHERE LEAST(driver_id, passenger_id) = LEAST($1::uuid, $2::uuid) AND GREATEST(driver_id, passenger_id) = GREATEST($1::uuid, $2::uuid)")
                    .bind(chat.driver_id)
                    .bind(chat.passenger_id),
            )
            .await?;

        tx.commit().await?;

        decode_data(&row)
    }

    async fn find_chat(&self, id: Uuid) -> Result<Option<Chat>, Error> {
        self.fetch_data(sqlx::query("SELECT data FROM chats WHERE id = $1").bind(id))
            .await
    }

    async fn list_chats(&self, member_id: Uuid) -> Result<Vec<Chat>, Error> {
        self.fetch_all_data(
            sqlx::query("SELECT data FROM chats WHERE driver_id = $1 OR passenger_id = $1 ORDER BY created_at DESC")
                .bind(member_id),
        )
        .await
    }

    async fn delete_chat(&self, id: Uuid) -> Result<(), Error> {
        // messages go with it through ON DELETE CASCADE
        let result = self
            .pool
            .execute(sqlx::query("DELETE FROM chats WHERE id = $1").bind(id))
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found_error("chat"));
        }

        Ok(())
    }

    async fn insert_message(&self, message: &Message) -> Result<Chat, Error> {
        let mut tx = self.pool.begin().await?;

        let row = tx
            .fetch_optional(
                sqlx::query("SELECT data FROM chats WHERE id = $1 FOR UPDATE").bind(message.chat_id),
            )
            .await?
            .ok_or_else(|| Error::not_found_error("chat"))?;

        let mut chat: Chat = decode_data(&row)?;
        chat.record_message(message);

        tx.execute(
            sqlx::query("INSERT INTO messages (id, chat_id, created_at, data) VALUES ($1, $2, $3, $4)")
                .bind(message.id)
                .bind(message.chat_id)
                .bind(message.created_at)
                .bind(Json(message)),
        )
        .await?;

        tx.execute(
            sqlx::query("UPDATE chats SET data = $2 WHERE id = $1")
                .bind(chat.id)
                .bind(Json(&chat)),
        )
        .await?;

        tx.commit().await?;

        Ok(chat)
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>, Error> {
        self.fetch_data(sqlx::query("SELECT data FROM messages WHERE id = $1").bind(id))
            .await
    }

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, Error> {
        self.fetch_all_data(
            sqlx::query("SELECT data FROM messages WHERE chat_id = $1 ORDER BY created_at ASC")
                .bind(chat_id),
        )
        .await
    }

    async fn update_message(&self, message: &Message) -> Result<(), Error> {
        let result = self
            .pool
            .execute(
                sqlx::query("UPDATE messages SET data = $2 WHERE id = $1")
                    .bind(message.id)
                    .bind(Json(message)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found_error("message"));
        }

        Ok(())
    }

    async fn delete_message(&self, id: Uuid) -> Result<(), Error> {
        let result = self
            .pool
            .execute(sqlx::query("DELETE FROM messages WHERE id = $1").bind(id))
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found_error("message"));
        }

        Ok(())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query("INSERT INTO notifications (id, member_id, is_read, created_at, data) VALUES ($1, $2, $3, $4, $5)")
                    .bind(notification.id)
                    .bind(notification.member_id)
                    .bind(notification.is_read)
                    .bind(notification.created_at)
                    .bind(Json(notification)),
            )
            .await?;

        Ok(())
    }

    async fn list_notifications(
        &self,
        member_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Notification>, Error> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.fetch_all_data(
            sqlx::query("SELECT data FROM notifications WHERE member_id = $1 ORDER BY created_at DESC LIMIT $2")
                .bind(member_id)
                .bind(limit),
        )
        .await
    }

    async fn count_unread_notifications(&self, member_id: Uuid) -> Result<usize, Error> {
        let row = self
            .pool
            .fetch_one(
                sqlx::query("SELECT COUNT(*) AS unread FROM notifications WHERE member_id = $1 AND NOT is_read")
                    .bind(member_id),
            )
            .await?;

        let unread: i64 = row.try_get("unread")?;

        Ok(usize::try_from(unread).unwrap_or_default())
    }

    async fn mark_notification_read(
        &self,
        member_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Notification, Error> {
        self.fetch_data(
            sqlx::query("UPDATE notifications SET is_read = TRUE, data = jsonb_set(data, '{isRead}', 'true'::jsonb) WHERE id = $1 AND member_id = $2 RETURNING data")
                .bind(notification_id)
                .bind(member_id),
        )
        .await?
        .ok_or_else(|| Error::not_found_error("notification"))
    }
}
