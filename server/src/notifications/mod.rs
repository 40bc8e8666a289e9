pub mod dispatch;
pub mod mailer;
pub mod notifier;
pub mod templates;

pub use dispatch::MailNotificationHandler;
pub use mailer::{DeliveryError, EmailConfig, LogMailer, Mailer, SmtpMailer};
pub use notifier::{NoopNotifier, Notifier, PoolNotifier};
pub use templates::TemplateKind;
