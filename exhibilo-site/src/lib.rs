/// Exhibilo site services
///
/// The `/contact` relay that turns form submissions into mail, the client
/// the site uses to post to it, and the content client that reads
/// services, projects and testimonials from the backend with built-in
/// fallbacks.
pub mod client;
pub mod config;
pub mod contact;
pub mod content;
pub mod error;
pub mod mail;
pub mod relay;

pub use client::{ContactClient, SubmitOutcome};
pub use config::{MailSettings, SiteConfig};
pub use contact::{is_valid_email, ContactForm, ContactSubmission, ValidContact};
pub use content::{
    find_project, project_link, projects_in_category, slugify, ContentClient, Project, Service,
    Testimonial,
};
pub use error::{ConfigError, MailError};
pub use mail::{LogTransport, MailMessage, MailTransport, SendmailTransport};
pub use relay::{router, RelayState};
