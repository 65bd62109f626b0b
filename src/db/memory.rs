use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{duplicate_booking_error, seats_error, status_changed_error, Store};
use crate::entities::{Booking, Chat, Member, Message, Notification, Ride, Vehicle};
use crate::error::Error;

/// In-process store. Every operation runs inside one critical section.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    members: HashMap<Uuid, Member>,
    vehicles: Vec<Vehicle>,
    // insertion order doubles as the tie-break for equal creation times
    rides: Vec<Ride>,
    bookings: Vec<Booking>,
    chats: Vec<Chat>,
    messages: Vec<Message>,
    notifications: Vec<Notification>,
}

impl State {
    fn ride_mut(&mut self, id: Uuid) -> Option<&mut Ride> {
        self.rides.iter_mut().find(|ride| ride.id == id)
    }

    fn booking_mut(&mut self, id: Uuid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|booking| booking.id == id)
    }

    fn bookings_where(&self, predicate: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .rev()
            .filter(|booking| predicate(booking))
            .cloned()
            .collect();

        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bookings
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, Error> {
        self.state.lock().map_err(|_| Error::unexpected_error())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_member(&self, member: &Member) -> Result<(), Error> {
        self.lock()?.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn find_member(&self, id: Uuid) -> Result<Option<Member>, Error> {
        Ok(self.lock()?.members.get(&id).cloned())
    }

    async fn update_member(&self, member: &Member) -> Result<(), Error> {
        let mut state = self.lock()?;

        match state.members.get_mut(&member.id) {
            Some(stored) => {
                *stored = member.clone();
                Ok(())
            }
            None => Err(Error::not_found_error("member")),
        }
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), Error> {
        self.lock()?.vehicles.push(vehicle.clone());
        Ok(())
    }

    async fn find_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, Error> {
        Ok(self.lock()?.vehicles.iter().find(|v| v.id == id).cloned())
    }

    async fn list_vehicles_for_driver(&self, driver_id: Uuid) -> Result<Vec<Vehicle>, Error> {
        let state = self.lock()?;

        let mut vehicles: Vec<Vehicle> = state
            .vehicles
            .iter()
            .rev()
            .filter(|v| v.driver_id == driver_id)
            .cloned()
            .collect();

        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), Error> {
        let mut state = self.lock()?;

        match state.vehicles.iter_mut().find(|v| v.id == vehicle.id) {
            Some(stored) => {
                *stored = vehicle.clone();
                Ok(())
            }
            None => Err(Error::not_found_error("vehicle")),
        }
    }

    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error> {
        self.lock()?.rides.push(ride.clone());
        Ok(())
    }

    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        Ok(self.lock()?.rides.iter().find(|ride| ride.id == id).cloned())
    }

    async fn list_rides_with_seats(&self) -> Result<Vec<Ride>, Error> {
        let state = self.lock()?;

        let mut rides: Vec<Ride> = state
            .rides
            .iter()
            .rev()
            .filter(|ride| ride.has_seats())
            .cloned()
            .collect();

        rides.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rides)
    }

    async fn adjust_seats(&self, ride_id: Uuid, delta: i32) -> Result<Ride, Error> {
        let mut state = self.lock()?;

        let ride = state
            .ride_mut(ride_id)
            .ok_or_else(|| Error::not_found_error("ride"))?;

        let seats = ride.seats_after(delta).ok_or_else(|| seats_error(ride, delta))?;
        ride.available_seats = seats;

        Ok(ride.clone())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error> {
        let mut state = self.lock()?;

        if state.ride_mut(booking.ride_id).is_none() {
            return Err(Error::not_found_error("ride"));
        }

        let duplicate = state.bookings.iter().any(|b| {
            b.ride_id == booking.ride_id && b.passenger_id == booking.passenger_id && b.is_active()
        });

        if duplicate {
            return Err(duplicate_booking_error());
        }

        state.bookings.push(booking.clone());
        Ok(())
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, Error> {
        Ok(self.lock()?.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn find_active_booking(
        &self,
        passenger_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Option<Booking>, Error> {
        Ok(self
            .lock()?
            .bookings
            .iter()
            .find(|b| b.passenger_id == passenger_id && b.ride_id == ride_id && b.is_active())
            .cloned())
    }

    async fn list_bookings_for_ride(&self, ride_id: Uuid) -> Result<Vec<Booking>, Error> {
        Ok(self.lock()?.bookings_where(|b| b.ride_id == ride_id))
    }

    async fn list_bookings_for_passenger(
        &self,
        passenger_id: Uuid,
    ) -> Result<Vec<Booking>, Error> {
        Ok(self.lock()?.bookings_where(|b| b.passenger_id == passenger_id))
    }

    async fn list_bookings_for_driver(&self, driver_id: Uuid) -> Result<Vec<Booking>, Error> {
        Ok(self.lock()?.bookings_where(|b| b.driver_id == driver_id))
    }

    async fn transition_booking(
        &self,
        previous: &Booking,
        next: &Booking,
        seat_delta: i32,
    ) -> Result<Ride, Error> {
        let mut state = self.lock()?;

        let current = state
            .booking_mut(next.id)
            .ok_or_else(|| Error::not_found_error("booking"))?;

        if current.status.name() != previous.status.name() {
            return Err(status_changed_error(current, previous));
        }

        let ride = state
            .ride_mut(next.ride_id)
            .ok_or_else(|| Error::not_found_error("ride"))?;

        let seats = ride
            .seats_after(seat_delta)
            .ok_or_else(|| seats_error(ride, seat_delta))?;
        ride.available_seats = seats;
        let ride = ride.clone();

        // checked above, the lock is still held
        if let Some(current) = state.booking_mut(next.id) {
            *current = next.clone();
        }

        Ok(ride)
    }

    async fn open_chat(&self, chat: &Chat) -> Result<Chat, Error> {
        let mut state = self.lock()?;

        if let Some(existing) = state.chats.iter().find(|c| c.same_participants(chat)) {
            return Ok(existing.clone());
        }

        state.chats.push(chat.clone());
        Ok(chat.clone())
    }

    async fn find_chat(&self, id: Uuid) -> Result<Option<Chat>, Error> {
        Ok(self.lock()?.chats.iter().find(|chat| chat.id == id).cloned())
    }

    async fn list_chats(&self, member_id: Uuid) -> Result<Vec<Chat>, Error> {
        let state = self.lock()?;

        let mut chats: Vec<Chat> = state
            .chats
            .iter()
            .rev()
            .filter(|chat| chat.includes(member_id))
            .cloned()
            .collect();

        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(chats)
    }

    async fn delete_chat(&self, id: Uuid) -> Result<(), Error> {
        let mut state = self.lock()?;

        let before = state.chats.len();
        state.chats.retain(|chat| chat.id != id);

        if state.chats.len() == before {
            return Err(Error::not_found_error("chat"));
        }

        state.messages.retain(|message| message.chat_id != id);
        Ok(())
    }

    async fn insert_message(&self, message: &Message) -> Result<Chat, Error> {
        let mut state = self.lock()?;

        let chat = state
            .chats
            .iter_mut()
            .find(|chat| chat.id == message.chat_id)
            .ok_or_else(|| Error::not_found_error("chat"))?;

        chat.record_message(message);
        let chat = chat.clone();

        state.messages.push(message.clone());
        Ok(chat)
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>, Error> {
        Ok(self.lock()?.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, Error> {
        let state = self.lock()?;

        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();

        // stable, so equal timestamps keep send order
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn update_message(&self, message: &Message) -> Result<(), Error> {
        let mut state = self.lock()?;

        match state.messages.iter_mut().find(|m| m.id == message.id) {
            Some(stored) => {
                *stored = message.clone();
                Ok(())
            }
            None => Err(Error::not_found_error("message")),
        }
    }

    async fn delete_message(&self, id: Uuid) -> Result<(), Error> {
        let mut state = self.lock()?;

        let before = state.messages.len();
        state.messages.retain(|m| m.id != id);

        if state.messages.len() == before {
            return Err(Error::not_found_error("message"));
        }

        Ok(())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), Error> {
        self.lock()?.notifications.push(notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        member_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Notification>, Error> {
        let state = self.lock()?;

        let mut notifications: Vec<Notification> = state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.member_id == member_id)
            .cloned()
            .collect();

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(limit);
        Ok(notifications)
    }

    async fn count_unread_notifications(&self, member_id: Uuid) -> Result<usize, Error> {
        Ok(self
            .lock()?
            .notifications
            .iter()
            .filter(|n| n.member_id == member_id && !n.is_read)
            .count())
    }

    async fn mark_notification_read(
        &self,
        member_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Notification, Error> {
        let mut state = self.lock()?;

        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.member_id == member_id)
            .ok_or_else(|| Error::not_found_error("notification"))?;

        notification.is_read = true;
        Ok(notification.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ride::new_ride_spec;
    use crate::entities::NewBooking;

    fn ride(seats: i32) -> Ride {
        Ride::new(new_ride_spec(Uuid::new_v4(), "2030-01-01", "09:00", seats)).unwrap()
    }

    fn booking(ride: &Ride, seats: i32) -> Booking {
        Booking::new(
            ride,
            NewBooking {
                ride_id: ride.id,
                passenger_id: Uuid::new_v4(),
                seats_requested: seats,
                stop_location: None,
            },
        )
    }

    #[tokio::test]
    async fn adjust_seats_respects_bounds() {
        let store = MemoryStore::new();
        let ride = ride(2);
        store.insert_ride(&ride).await.unwrap();

        assert_eq!(store.adjust_seats(ride.id, -2).await.unwrap().available_seats, 0);
        assert!(store.adjust_seats(ride.id, -1).await.unwrap_err().is_capacity_error());
        assert_eq!(store.adjust_seats(ride.id, 2).await.unwrap().available_seats, 2);
        assert!(store.adjust_seats(ride.id, 1).await.unwrap_err().is_capacity_error());
        assert!(store
            .adjust_seats(Uuid::new_v4(), 1)
            .await
            .unwrap_err()
            .is_not_found_error());
    }

    #[tokio::test]
    async fn list_rides_with_seats_is_newest_first() {
        let store = MemoryStore::new();

        let older = ride(1);
        let mut newer = ride(1);
        newer.created_at = older.created_at + chrono::Duration::seconds(1);
        let full = ride(1);

        store.insert_ride(&newer).await.unwrap();
        store.insert_ride(&older).await.unwrap();
        store.insert_ride(&full).await.unwrap();
        store.adjust_seats(full.id, -1).await.unwrap();

        let ids: Vec<Uuid> = store
            .list_rides_with_seats()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn duplicate_active_booking_is_refused() {
        let store = MemoryStore::new();
        let ride = ride(4);
        store.insert_ride(&ride).await.unwrap();

        let first = booking(&ride, 1);
        store.insert_booking(&first).await.unwrap();

        let mut second = booking(&ride, 1);
        second.passenger_id = first.passenger_id;

        assert!(store.insert_booking(&second).await.unwrap_err().is_invalid_input_error());
    }

    #[tokio::test]
    async fn failed_transition_changes_nothing() {
        let store = MemoryStore::new();
        let ride = ride(1);
        store.insert_ride(&ride).await.unwrap();

        let previous = booking(&ride, 2);
        store.insert_booking(&previous).await.unwrap();

        let mut next = previous.clone();
        next.accept().unwrap();

        let err = store
            .transition_booking(&previous, &next, next.reservation())
            .await
            .unwrap_err();
        assert!(err.is_capacity_error());

        let stored = store.find_booking(previous.id).await.unwrap().unwrap();
        assert!(stored.is_pending());
        assert_eq!(store.find_ride(ride.id).await.unwrap().unwrap().available_seats, 1);
    }

    #[tokio::test]
    async fn stale_transition_is_refused() {
        let store = MemoryStore::new();
        let ride = ride(3);
        store.insert_ride(&ride).await.unwrap();

        let previous = booking(&ride, 1);
        store.insert_booking(&previous).await.unwrap();

        let mut accepted = previous.clone();
        accepted.accept().unwrap();
        store
            .transition_booking(&previous, &accepted, accepted.reservation())
            .await
            .unwrap();

        let mut rejected = previous.clone();
        rejected.reject(None).unwrap();
        let err = store.transition_booking(&previous, &rejected, 0).await.unwrap_err();

        assert!(err.is_invalid_state_error());
        assert_eq!(store.find_ride(ride.id).await.unwrap().unwrap().available_seats, 2);
    }

    #[tokio::test]
    async fn open_chat_reuses_existing_pair() {
        let store = MemoryStore::new();
        let ride = ride(3);
        let booking = booking(&ride, 1);

        let first = store.open_chat(&Chat::for_booking(&booking)).await.unwrap();

        let mut reversed = Chat::for_booking(&booking);
        std::mem::swap(&mut reversed.driver_id, &mut reversed.passenger_id);
        let second = store.open_chat(&reversed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.list_chats(booking.driver_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_chat_drops_its_messages() {
        let store = MemoryStore::new();
        let ride = ride(3);
        let booking = booking(&ride, 1);
        let chat = store.open_chat(&Chat::for_booking(&booking)).await.unwrap();

        let message = Message::new(chat.id, booking.passenger_id, "hello").unwrap();
        let updated = store.insert_message(&message).await.unwrap();
        assert_eq!(updated.last_message.as_deref(), Some("hello"));

        store.delete_chat(chat.id).await.unwrap();

        assert!(store.find_chat(chat.id).await.unwrap().is_none());
        assert!(store.find_message(message.id).await.unwrap().is_none());
        assert!(store.delete_chat(chat.id).await.unwrap_err().is_not_found_error());

        let orphan = Message::new(chat.id, booking.passenger_id, "anyone?").unwrap();
        assert!(store.insert_message(&orphan).await.unwrap_err().is_not_found_error());
    }
}
