mod availability;
mod gift_cards;

pub use availability::AvailabilityService;
pub use gift_cards::GiftCardService;
