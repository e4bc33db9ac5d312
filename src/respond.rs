//! Responder: the render primitive.
//!
//! DESIGN
//! ======
//! Every screen update goes through `Responder::update_response`, which edits
//! the live response of an interaction. Form dialogs go through
//! `open_modal`. The manager depends only on the trait; `WebhookResponder`
//! is the HTTP implementation used by the binary and tests swap in a
//! recording mock.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures are returned, never retried here. Callers log them and
//! move on; the next user action re-renders naturally.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use crate::config::AppConfig;
use crate::event::Interaction;
use crate::message::{ButtonStyle, Component, ModalSpec, OutboundMessage, Panel, TextInputStyle};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("platform rejected response: status {status}")]
    Status { status: u16, body: String },
    #[error("response parse failed: {0}")]
    Parse(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ResponseError {
    /// Whether repeating the same call later could succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

/// Identity of a message the platform accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId(pub String);

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    /// Replace the content of the interaction's existing response.
    async fn update_response(&self, event: &Interaction, message: &OutboundMessage) -> Result<MessageId, ResponseError>;

    /// Open a form dialog over the interaction.
    async fn open_modal(&self, event: &Interaction, modal: &ModalSpec) -> Result<(), ResponseError>;
}

// =============================================================================
// WEBHOOK RESPONDER
// =============================================================================

const MODAL_CALLBACK_TYPE: u8 = 9;

pub struct WebhookResponder {
    http: reqwest::Client,
    api_base: String,
    application_id: String,
}

impl WebhookResponder {
    /// Build the HTTP transport from the service configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, ResponseError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ResponseError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            application_id: config.application_id.clone(),
        })
    }

    fn original_message_url(&self, event: &Interaction) -> String {
        format!("{}/webhooks/{}/{}/messages/@original", self.api_base, self.application_id, event.token())
    }

    fn callback_url(&self, event: &Interaction) -> String {
        format!("{}/interactions/{}/{}/callback", self.api_base, event.id, event.token())
    }
}

#[async_trait::async_trait]
impl Responder for WebhookResponder {
    async fn update_response(&self, event: &Interaction, message: &OutboundMessage) -> Result<MessageId, ResponseError> {
        let payload = message_payload(message);
        let request = self.http.patch(self.original_message_url(event));

        let request = if message.attachments.is_empty() {
            request.json(&payload)
        } else {
            let mut form = Form::new().text("payload_json", payload.to_string());
            for (index, file) in message.attachments.iter().enumerate() {
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.filename.clone())
                    .mime_str(file.content_type())
                    .map_err(|e| ResponseError::Request(e.to_string()))?;
                form = form.part(format!("files[{index}]"), part);
            }
            request.multipart(form)
        };

        let response = request
            .send()
            .await
            .map_err(|e| ResponseError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ResponseError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(ResponseError::Status { status, body: text });
        }
        parse_message_id(&text)
    }

    async fn open_modal(&self, event: &Interaction, modal: &ModalSpec) -> Result<(), ResponseError> {
        let response = self
            .http
            .post(self.callback_url(event))
            .json(&modal_payload(modal))
            .send()
            .await
            .map_err(|e| ResponseError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(ResponseError::Status { status, body });
        }
        Ok(())
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

fn parse_message_id(text: &str) -> Result<MessageId, ResponseError> {
    let body: Value = serde_json::from_str(text).map_err(|e| ResponseError::Parse(e.to_string()))?;
    body.get("id")
        .and_then(Value::as_str)
        .map(|id| MessageId(id.to_string()))
        .ok_or_else(|| ResponseError::Parse("message id missing".into()))
}

pub(crate) fn message_payload(message: &OutboundMessage) -> Value {
    let embeds: Vec<Value> = message.panels.iter().map(panel_payload).collect();
    let components: Vec<Value> = message
        .rows
        .iter()
        .filter(|row| !row.0.is_empty())
        .map(|row| json!({"type": 1, "components": row.0.iter().map(component_payload).collect::<Vec<_>>()}))
        .collect();
    let attachments: Vec<Value> = message
        .attachments
        .iter()
        .enumerate()
        .map(|(id, file)| json!({"id": id, "filename": file.filename}))
        .collect();

    json!({
        "content": message.content,
        "embeds": embeds,
        "components": components,
        "attachments": attachments,
    })
}

fn panel_payload(panel: &Panel) -> Value {
    let mut embed = json!({"title": panel.title});
    if let Some(description) = &panel.description {
        embed["description"] = json!(description);
    }
    if !panel.fields.is_empty() {
        embed["fields"] = json!(panel.fields);
    }
    if let Some(color) = panel.color {
        embed["color"] = json!(color);
    }
    if let Some(image) = &panel.image {
        embed["image"] = json!({"url": image});
    }
    embed
}

fn component_payload(component: &Component) -> Value {
    match component {
        Component::Button { custom_id, label, style, disabled } => json!({
            "type": 2,
            "custom_id": custom_id,
            "label": label,
            "style": button_style_code(*style),
            "disabled": disabled,
        }),
        Component::Select { custom_id, placeholder, options, min_values, max_values, disabled } => json!({
            "type": 3,
            "custom_id": custom_id,
            "placeholder": placeholder,
            "options": options,
            "min_values": min_values,
            "max_values": max_values,
            "disabled": disabled,
        }),
    }
}

fn button_style_code(style: ButtonStyle) -> u8 {
    match style {
        ButtonStyle::Primary => 1,
        ButtonStyle::Secondary => 2,
        ButtonStyle::Success => 3,
        ButtonStyle::Danger => 4,
    }
}

pub(crate) fn modal_payload(modal: &ModalSpec) -> Value {
    let rows: Vec<Value> = modal
        .inputs
        .iter()
        .map(|input| {
            let style = match input.style {
                TextInputStyle::Short => 1,
                TextInputStyle::Paragraph => 2,
            };
            let mut field = json!({
                "type": 4,
                "custom_id": input.custom_id,
                "label": input.label,
                "style": style,
                "required": input.required,
            });
            if let Some(value) = &input.value {
                field["value"] = json!(value);
            }
            if let Some(max_length) = input.max_length {
                field["max_length"] = json!(max_length);
            }
            json!({"type": 1, "components": [field]})
        })
        .collect();

    json!({
        "type": MODAL_CALLBACK_TYPE,
        "data": {
            "custom_id": modal.custom_id,
            "title": modal.title,
            "components": rows,
        }
    })
}

#[cfg(test)]
#[path = "respond_test.rs"]
mod tests;
