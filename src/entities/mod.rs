pub mod booking;
mod chat;
mod member;
mod message;
pub mod notification;
pub(crate) mod ride;
mod search;
pub(crate) mod vehicle;

pub use booking::{Booking, NewBooking, Status as BookingStatus};
pub use chat::Chat;
pub use member::{Member, MemberUpdate, NewMember};
pub use message::Message;
pub use notification::{Inbox, Kind as NotificationKind, Notification};
pub use ride::{NewRide, Ride, MAX_SEATS};
pub use search::{rank, RideListing, RideQuery};
pub use vehicle::{NewVehicle, Vehicle, VehicleUpdate};
