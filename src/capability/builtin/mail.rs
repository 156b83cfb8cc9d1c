//! Status-report mail: drafting, and delivery over an SMTP relay.

use std::sync::Arc;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::capability::{Capability, CapabilityArguments, FnCapability, ParameterSchema};
use crate::config::SmtpConfig;
use crate::error::DispatchError;

const SUBJECT_MAX_CHARS: usize = 80;

fn report_schema() -> ParameterSchema {
    ParameterSchema::object()
        .string("to", "Recipient email address", true)
        .string("body", "Full report text", true)
        .build()
}

fn parse_mailbox(capability: &str, raw: &str) -> Result<Mailbox, DispatchError> {
    raw.trim()
        .parse::<Mailbox>()
        .map_err(|e| DispatchError::execution(capability, format!("'{raw}' is not an email address: {e}")))
}

/// First 80 characters of the body on one line.
fn subject_line(body: &str) -> String {
    body.chars()
        .take(SUBJECT_MAX_CHARS)
        .collect::<String>()
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

/// `draft_email(to, body)`: plain-text mail draft with derived subject.
pub fn draft_email_capability() -> Arc<dyn Capability> {
    Arc::new(FnCapability::from_sync(
        "draft_email",
        "Prepare a plain-text status report email for a recipient",
        report_schema(),
        |args: &CapabilityArguments| {
            let to = parse_mailbox("draft_email", args.get_str("to")?)?;
            let body = args.get_str("body")?;
            let date = chrono::Utc::now().to_rfc2822();
            Ok(format!(
                "To: {to}\nSubject: {}\nDate: {date}\n\n{body}",
                subject_line(body)
            ))
        },
    ))
}

/// `send_email(to, body)`: deliver a plain-text report through `transport`.
///
/// Generic over the transport so hosts can plug in a pooled relay, a file
/// transport, or a stub.
pub fn send_email_capability<T>(transport: T, from: Mailbox) -> Arc<dyn Capability>
where
    T: AsyncTransport + Send + Sync + 'static,
    T::Error: std::fmt::Display,
{
    let transport = Arc::new(transport);
    Arc::new(FnCapability::new(
        "send_email",
        "Send a plain-text status report email to a recipient",
        report_schema(),
        move |args: CapabilityArguments| {
            let transport = Arc::clone(&transport);
            let from = from.clone();
            async move {
                let to = parse_mailbox("send_email", args.get_str("to")?)?;
                let body = args.get_str("body")?;
                let subject = subject_line(body);

                let message = Message::builder()
                    .from(from)
                    .to(to.clone())
                    .subject(subject.as_str())
                    .header(ContentType::TEXT_PLAIN)
                    .body(body.to_string())
                    .map_err(|e| DispatchError::execution("send_email", e.to_string()))?;

                transport
                    .send(message)
                    .await
                    .map_err(|e| DispatchError::execution("send_email", format!("delivery failed: {e}")))?;

                tracing::info!(to = %to, "report email sent");
                Ok(format!("Email sent to {to}: {subject}"))
            }
        },
    ))
}

/// STARTTLS relay built from the mail settings.
pub fn smtp_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, DispatchError> {
    let host = config
        .host
        .as_deref()
        .ok_or_else(|| DispatchError::Configuration("smtp.host is not set".into()))?;

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        .map_err(|e| DispatchError::Configuration(format!("smtp relay {host}: {e}")))?
        .port(config.port());
    if let (Some(user), Some(password)) = (&config.username, &config.password) {
        builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }
    Ok(builder.build())
}

/// `send_email` over the configured relay.
pub fn smtp_send_email_capability(config: &SmtpConfig) -> Result<Arc<dyn Capability>, DispatchError> {
    let from = config
        .from
        .as_deref()
        .ok_or_else(|| DispatchError::Configuration("smtp.from is not set".into()))?
        .parse::<Mailbox>()
        .map_err(|e| DispatchError::Configuration(format!("smtp.from: {e}")))?;
    Ok(send_email_capability(smtp_transport(config)?, from))
}
