//! WhatsApp Cloud API client for delivering order documents
//!
//! Two-step flow against the Graph API: upload the rendered PDF as a
//! media object, then send a pre-approved template message with the
//! media id attached as a document header. Delivery failures are
//! reported to the caller; whether they abort the request is the
//! caller's decision (booking creation treats them as non-fatal).

use reqwest::{multipart, Client};
use serde::Deserialize;
use serde_json::json;

use shared::validation::normalize_recipient_number;

use crate::config::WhatsAppConfig;
use crate::error::{AppError, AppResult};

/// Template used when a booking invoice is sent.
pub const INVOICE_TEMPLATE: &str = "order_invoice";

/// WhatsApp Cloud API client
#[derive(Clone)]
pub struct WhatsAppClient {
    client: Client,
    api_base: String,
    access_token: String,
    phone_number_id: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

impl WhatsAppClient {
    /// Build a client from configuration. Returns `None` when messaging
    /// is disabled or the credentials are incomplete, so the rest of
    /// the system can run without a Meta account.
    pub fn from_config(config: &WhatsAppConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        if config.access_token.is_empty() || config.phone_number_id.is_empty() {
            tracing::warn!("WhatsApp enabled but credentials are incomplete; disabling");
            return None;
        }
        Some(Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
        })
    }

    /// Upload a rendered PDF and return the media id the send step needs.
    pub async fn upload_document(&self, filename: &str, pdf_bytes: Vec<u8>) -> AppResult<String> {
        let url = format!("{}/{}/media", self.api_base, self.phone_number_id);

        let part = multipart::Part::bytes(pdf_bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| AppError::MessagingError(e.to_string()))?;
        let form = multipart::Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", "application/pdf")
            .part("file", part);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::MessagingError(format!("media upload failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("WhatsApp media upload failed ({}): {}", status, body);
            return Err(AppError::MessagingError(format!(
                "media upload returned {}",
                status
            )));
        }

        let upload: MediaUploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::MessagingError(format!("invalid upload response: {}", e)))?;

        Ok(upload.id)
    }

    /// Send a template message with a previously uploaded document
    /// attached as the header. `customer_name` fills the template's
    /// single body parameter.
    pub async fn send_document_template(
        &self,
        recipient: &str,
        template: &str,
        media_id: &str,
        filename: &str,
        customer_name: &str,
    ) -> AppResult<String> {
        let to = normalize_recipient_number(recipient)
            .map_err(|e| AppError::MessagingError(e.to_string()))?;
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);

        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": {
                "name": template,
                "language": { "code": "en" },
                "components": [
                    {
                        "type": "header",
                        "parameters": [{
                            "type": "document",
                            "document": { "id": media_id, "filename": filename }
                        }]
                    },
                    {
                        "type": "body",
                        "parameters": [{ "type": "text", "text": customer_name }]
                    }
                ]
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::MessagingError(format!("template send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("WhatsApp template send failed ({}): {}", status, body);
            return Err(AppError::MessagingError(format!(
                "template send returned {}",
                status
            )));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| AppError::MessagingError(format!("invalid send response: {}", e)))?;

        sent.messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| AppError::MessagingError("send response carried no message id".into()))
    }

    /// Upload and send in one call. Used by the post-commit side effect
    /// path where either step failing is logged but never fails the
    /// originating request.
    pub async fn deliver_document(
        &self,
        recipient: &str,
        template: &str,
        filename: &str,
        pdf_bytes: Vec<u8>,
        customer_name: &str,
    ) -> AppResult<String> {
        let media_id = self.upload_document(filename, pdf_bytes).await?;
        self.send_document_template(recipient, template, &media_id, filename, customer_name)
            .await
    }
}
