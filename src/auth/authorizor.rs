use oso::{Oso, OsoError, PolarClass};

use crate::auth::User;
use crate::entities::{Booking, Chat, Member, Message, Ride, Vehicle};

pub fn new() -> Result<Oso, OsoError> {
    let mut o = Oso::new();

    o.register_class(User::get_polar_class())?;
    o.register_class(Member::get_polar_class())?;
    o.register_class(Ride::get_polar_class())?;
    o.register_class(Booking::get_polar_class())?;
    o.register_class(Chat::get_polar_class())?;
    o.register_class(Message::get_polar_class())?;
    o.register_class(Vehicle::get_polar_class())?;

    o.load_str(include_str!("rules.polar"))?;

    Ok(o)
}
