// Notifications — turn alert events into emails and deliver them.
//
// `Notifier` is what the pipeline talks to. `EmailNotifier` implements it by
// formatting the event and handing the message to a `MailTransport` (SMTP or
// SendGrid), picked from the configured credentials.

pub mod email;
pub mod format;
pub mod sendgrid;
pub mod smtp;
pub mod traits;

pub use email::EmailNotifier;
pub use traits::{EmailMessage, MailTransport, Notifier, NotifyError};
