/// Client side of the contact form
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::contact::ContactForm;

pub const DEFAULT_THANKS: &str = "¡Gracias! Te contactaremos a la brevedad.";

/// What to tell the visitor after submitting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub success: bool,
    pub message: String,
}

/// Posts contact forms to `<base>/contact`
#[derive(Debug, Clone)]
pub struct ContactClient {
    http: Client,
    endpoint: String,
}

impl ContactClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/contact", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn submit(&self, form: &ContactForm) -> SubmitOutcome {
        let response = match self.http.post(&self.endpoint).json(form).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "contact submission failed");
                return failure(err.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.endpoint, %status, "contact submission rejected");
            return failure(format!("HTTP {}", status.as_u16()));
        }

        // a success without a readable body still counts
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or(DEFAULT_THANKS)
            .to_owned();
        debug!(endpoint = %self.endpoint, "contact submission accepted");

        SubmitOutcome {
            success: true,
            message,
        }
    }
}

fn failure(reason: String) -> SubmitOutcome {
    SubmitOutcome {
        success: false,
        message: if reason.is_empty() {
            "Error de red".to_owned()
        } else {
            reason
        },
    }
}
