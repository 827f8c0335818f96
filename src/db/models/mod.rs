mod admin_account;
mod availability;
mod booking;
mod coach;
mod gift_card;
mod outbox;
mod service;

pub use admin_account::*;
pub use availability::*;
pub use booking::*;
pub use coach::*;
pub use gift_card::*;
pub use outbox::*;
pub use service::*;
