use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use super::{endpoint, ensure_success, IntegrationError};
use crate::config::IntegrationsConfig;

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), IntegrationError>;
}

#[derive(Serialize)]
struct JsonEmail<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

/// Email API client: JSON body, or multipart when there are attachments
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_key: Option<String>, from: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            from: from.into(),
        }
    }

    fn request(&self) -> reqwest::RequestBuilder {
        let request = self.client.post(endpoint(&self.url, "send"));
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn multipart(&self, message: &EmailMessage) -> Result<Form, IntegrationError> {
        let mut form = Form::new()
            .text("from", self.from.clone())
            .text("to", message.to.join(","))
            .text("subject", message.subject.clone())
            .text("html", message.html.clone());
        for attachment in &message.attachments {
            let part = Part::bytes(attachment.bytes.clone())
                .file_name(attachment.filename.clone())
                .mime_str(&attachment.content_type)?;
            form = form.part("attachments", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), IntegrationError> {
        let request = if message.attachments.is_empty() {
            self.request().json(&JsonEmail {
                from: &self.from,
                to: &message.to,
                subject: &message.subject,
                html: &message.html,
            })
        } else {
            self.request().multipart(self.multipart(message)?)
        };
        ensure_success("servicio de correo", request.send().await?).await?;
        tracing::debug!("Email '{}' sent to {} recipient(s)", message.subject, message.to.len());
        Ok(())
    }
}

/// Used when notifications are disabled or no email API is configured
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), IntegrationError> {
        tracing::debug!("Notifications disabled; dropping email '{}'", message.subject);
        Ok(())
    }
}

pub fn from_config(config: &IntegrationsConfig, client: &reqwest::Client) -> Arc<dyn Mailer> {
    match (&config.email_api_url, config.notifications_enabled) {
        (Some(url), true) => Arc::new(HttpMailer::new(
            client.clone(),
            url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
        )),
        _ => Arc::new(NoopMailer),
    }
}
