use anyhow::Context;
use async_trait::async_trait;

use super::{Notice, Notifier};
use crate::config::AppConfig;

pub struct MailtrapNotifier {
    api_url: String,
    api_token: String,
    sender_email: String,
    sender_name: String,
    client: reqwest::Client,
}

impl MailtrapNotifier {
    pub fn new(api_url: String, api_token: String, sender_email: String, sender_name: String) -> Self {
        Self {
            api_url,
            api_token,
            sender_email,
            sender_name,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.mailtrap_api_url.clone(),
            config.mailtrap_token.clone(),
            config.sender_email.clone(),
            config.sender_name.clone(),
        )
    }

    fn payload(&self, notice: &Notice) -> serde_json::Value {
        let mut to = serde_json::json!({ "email": notice.to_email });
        if let Some(name) = &notice.to_name {
            to["name"] = serde_json::Value::String(name.clone());
        }

        serde_json::json!({
            "from": { "email": self.sender_email, "name": self.sender_name },
            "to": [to],
            "subject": notice.subject,
            "text": notice.text,
            "html": notice.html,
            "category": "Booking",
        })
    }
}

#[async_trait]
impl Notifier for MailtrapNotifier {
    async fn notify(&self, notice: &Notice) -> anyhow::Result<()> {
        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&self.payload(notice))
            .send()
            .await
            .context("failed to reach Mailtrap")?
            .error_for_status()
            .context("Mailtrap API returned error")?;

        tracing::debug!(to = %notice.to_email, subject = %notice.subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let notifier = MailtrapNotifier::new(
            "http://localhost/send".into(),
            "token".into(),
            "noreply@example.com".into(),
            "Bookings".into(),
        );
        let payload = notifier.payload(&Notice {
            to_email: "pat@example.com".into(),
            to_name: Some("Pat Provider".into()),
            subject: "New booking request for Haircut".into(),
            text: "text".into(),
            html: "<p>html</p>".into(),
        });

        assert_eq!(payload["from"]["email"], "noreply@example.com");
        assert_eq!(payload["to"][0]["email"], "pat@example.com");
        assert_eq!(payload["to"][0]["name"], "Pat Provider");
        assert_eq!(payload["subject"], "New booking request for Haircut");
    }
}
