mod sender;
mod worker;

pub use sender::{HttpNotificationSender, NotificationSender, SendError};
pub use worker::spawn_outbox_worker;
