pub mod reservation;
pub mod slot_key;
pub mod slot_template;

pub use reservation::{Reservation, ReservationStatus};
pub use slot_key::Triggers;
pub use slot_template::{SlotButton, SlotGroup, SlotTemplate};
