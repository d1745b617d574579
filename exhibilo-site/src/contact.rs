/// Contact submissions: parsing, honeypot and validation
use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

/// Raw fields of a submission, untrimmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub industry: String,
    pub message: String,
    /// Hidden field that only bots fill in
    pub website: String,
}

/// A submission that passed validation, with every field trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub industry: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalid {
    MissingName,
    InvalidEmail,
    MissingMessage,
}

impl ContactSubmission {
    /// Parse a request body: a JSON object when it is one, form encoding
    /// otherwise.
    pub fn parse(body: &[u8]) -> Self {
        Self::from_fields(parse_fields(body))
    }

    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        let mut take = |key: &str| fields.remove(key).unwrap_or_default();
        Self {
            name: take("name"),
            email: take("email"),
            phone: take("phone"),
            company: take("company"),
            industry: take("industry"),
            message: take("message"),
            website: take("website"),
        }
    }

    /// A filled honeypot field marks a bot. `"0"` counts as empty, so a
    /// JSON `0` or `"0"` is let through.
    pub fn is_spam(&self) -> bool {
        !matches!(self.website.as_str(), "" | "0")
    }

    pub fn validate(&self) -> Result<ValidContact, Invalid> {
        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();

        if name.is_empty() {
            return Err(Invalid::MissingName);
        }
        if !is_valid_email(email) {
            return Err(Invalid::InvalidEmail);
        }
        if message.is_empty() {
            return Err(Invalid::MissingMessage);
        }

        let industry = self.industry.trim();
        Ok(ValidContact {
            name: name.to_owned(),
            email: email.to_owned(),
            phone: self.phone.trim().to_owned(),
            company: self.company.trim().to_owned(),
            industry: (!industry.is_empty()).then(|| industry.to_owned()),
            message: message.to_owned(),
        })
    }
}

fn parse_fields(body: &[u8]) -> HashMap<String, String> {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        if !map.is_empty() {
            return map
                .into_iter()
                .map(|(key, value)| (key, field_text(value)))
                .collect();
        }
    }
    form_urlencoded::parse(body).into_owned().collect()
}

fn field_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "1".to_owned(),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Syntactic address check: dot-atom local part, dotted domain of at least
/// two labels.
pub fn is_valid_email(address: &str) -> bool {
    if address.len() > 254 {
        return false;
    }
    let Some((local, domain)) = address.rsplit_once('@') else {
        return false;
    };

    valid_local_part(local) && valid_domain(domain)
}

fn valid_local_part(local: &str) -> bool {
    const SPECIALS: &str = "!#$%&'*+/=?^_`{|}~-";

    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || SPECIALS.contains(c))
}

fn valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// The form as the site's visitors fill it in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactForm {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub industry: String,
    pub message: String,
}

impl ContactForm {
    /// Required fields left empty, in form order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("company", &self.company),
            ("email", &self.email),
            ("industry", &self.industry),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}
