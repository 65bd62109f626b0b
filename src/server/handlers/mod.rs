pub mod bookings;
pub mod chats;
pub mod drivers;
pub mod members;
pub mod passengers;
pub mod rides;
pub mod vehicles;
