// Messaging - Notifications surfaced to the user

pub mod notification;

pub use notification::{Notification, NotificationCategory, NotificationLevel, NotificationLog};
