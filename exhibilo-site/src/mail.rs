/// Contact mail composition and delivery
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::MailSettings;
use crate::contact::ValidContact;
use crate::error::MailError;

/// A plain-text UTF-8 message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from_name: String,
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn for_contact(settings: &MailSettings, contact: &ValidContact) -> Self {
        Self {
            from_name: settings.from_name.clone(),
            from: settings.from.clone(),
            to: settings.to.clone(),
            reply_to: contact.email.clone(),
            subject: settings.subject.clone(),
            body: contact_body(contact),
        }
    }

    /// RFC 5322 rendering with CRLF line endings, as handed to sendmail
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("To: {}\r\n", self.to));
        out.push_str(&format!("From: {} <{}>\r\n", self.from_name, self.from));
        out.push_str(&format!("Reply-To: {}\r\n", self.reply_to));
        out.push_str(&format!("Subject: {}\r\n", encode_header(&self.subject)));
        out.push_str("MIME-Version: 1.0\r\n");
        out.push_str("Content-Type: text/plain; charset=UTF-8\r\n");
        out.push_str("Content-Transfer-Encoding: 8bit\r\n");
        out.push_str("\r\n");
        for line in self.body.lines() {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out
    }
}

/// RFC 2047 encoded-word for non-ASCII header text
pub fn encode_header(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(text))
}

fn contact_body(contact: &ValidContact) -> String {
    let mut body = format!(
        "Nombre: {}\nEmail: {}\nTeléfono: {}\nEmpresa: {}\n",
        contact.name, contact.email, contact.phone, contact.company
    );
    if let Some(industry) = &contact.industry {
        body.push_str(&format!("Rubro: {industry}\n"));
    }
    body.push_str(&format!("\nMensaje:\n{}\n", contact.message));
    body
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Pipes messages to a sendmail-compatible program (`-t -i`)
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    program: PathBuf,
}

impl SendmailTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl MailTransport for SendmailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let mut child = Command::new(&self.program)
            .args(["-t", "-i"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| MailError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(message.render().as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(MailError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        debug!(to = %message.to, "message handed to sendmail");
        Ok(())
    }
}

/// Logs messages instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            reply_to = %message.reply_to,
            subject = %message.subject,
            "not sending contact mail (dry run):\n{}",
            message.body
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(industry: Option<&str>) -> ValidContact {
        ValidContact {
            name: "Ana".into(),
            email: "ana@retail.com".into(),
            phone: "1155".into(),
            company: "Retail SA".into(),
            industry: industry.map(str::to_owned),
            message: "Necesito 20 exhibidores".into(),
        }
    }

    #[test]
    fn test_subject_is_base64_encoded_word() {
        assert_eq!(
            encode_header("Nueva consulta desde la web"),
            "=?UTF-8?B?TnVldmEgY29uc3VsdGEgZGVzZGUgbGEgd2Vi?="
        );
    }

    #[test]
    fn test_message_headers_and_body() {
        let message = MailMessage::for_contact(&MailSettings::default(), &contact(None));
        let rendered = message.render();

        assert!(rendered.contains("To: ventas@exhibilo.com.ar\r\n"));
        assert!(rendered.contains("From: Exhibilo <no-reply@exhibilo.com.ar>\r\n"));
        assert!(rendered.contains("Reply-To: ana@retail.com\r\n"));
        assert!(rendered.contains("Content-Type: text/plain; charset=UTF-8\r\n"));
        assert!(rendered.contains("\r\n\r\nNombre: Ana\r\n"));
        assert!(rendered.ends_with("Mensaje:\r\nNecesito 20 exhibidores\r\n"));
        assert!(!message.body.contains("Rubro"));
    }

    #[test]
    fn test_industry_is_listed_when_present() {
        let message = MailMessage::for_contact(&MailSettings::default(), &contact(Some("Bebidas")));
        assert!(message.body.contains("Empresa: Retail SA\nRubro: Bebidas\n"));
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sendmail_exit_status_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let accept = script(dir.path(), "accept", "cat > /dev/null");
        let refuse = script(dir.path(), "refuse", "cat > /dev/null\necho refused >&2\nexit 75");
        let message = MailMessage::for_contact(&MailSettings::default(), &contact(None));

        assert!(SendmailTransport::new(accept).send(&message).await.is_ok());
        match SendmailTransport::new(refuse).send(&message).await.unwrap_err() {
            MailError::Exit { stderr, .. } => assert_eq!(stderr, "refused"),
            other => panic!("unexpected error {other}"),
        }

        let err = SendmailTransport::new("/nonexistent/sendmail")
            .send(&message)
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Spawn { .. }));
    }
}
