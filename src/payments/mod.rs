mod checkout;
mod events;
mod reconciler;
mod signature;

pub use checkout::{CheckoutClient, CheckoutSession};
pub use events::PaymentEvent;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub(crate) use reconciler::booking_confirmation_notifications;
pub use signature::{sign_payload, verify_signature, SignatureError};
