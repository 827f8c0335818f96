pub mod admin;
pub mod availability;
pub mod bookings;
pub mod gift_cards;
pub mod webhooks;
