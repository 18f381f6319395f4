//! # df-auth-clerk
//!
//! HMAC-SHA256 implementation of `IdentityProvider`.
//! Verifies the identity provider's signed user-lifecycle webhooks and
//! decodes them into `IdentityEvent`s. Passwords and sessions never reach
//! this crate.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use df_core::error::AppError;
use df_core::models::{NewUser, UserUpdate};
use df_core::traits::{IdentityEvent, IdentityProvider, WebhookHeaders};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Allowed clock skew between the signer and us, in seconds.
pub const TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";

pub struct ClerkWebhookVerifier {
    key: Vec<u8>,
}

impl fmt::Debug for ClerkWebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClerkWebhookVerifier").field("key", &"[REDACTED]").finish()
    }
}

impl ClerkWebhookVerifier {
    /// Accepts the signing secret as issued (`whsec_<base64>`).
    pub fn new(secret: &SecretString) -> anyhow::Result<Self> {
        let raw = secret.expose_secret().trim();
        let encoded = raw.strip_prefix(SECRET_PREFIX).unwrap_or(raw);
        if encoded.is_empty() {
            anyhow::bail!("webhook signing secret is empty");
        }
        let key = STANDARD.decode(encoded)?;
        Ok(Self { key })
    }

    /// Signature check against an explicit clock.
    pub fn verify_at(&self, headers: &WebhookHeaders, body: &[u8], now: DateTime<Utc>) -> anyhow::Result<IdentityEvent> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| unauthorized("malformed webhook timestamp"))?;
        if (now.timestamp() - timestamp).abs() > TOLERANCE_SECS {
            return Err(unauthorized("webhook timestamp outside tolerance"));
        }

        let mut mac = self.mac()?;
        mac.update(headers.id.as_bytes());
        mac.update(b".");
        mac.update(headers.timestamp.trim().as_bytes());
        mac.update(b".");
        mac.update(body);

        // The header may carry several space-separated `v1,<sig>` entries
        // during secret rotation; any one of them may match.
        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|sig| STANDARD.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());
        if !matched {
            return Err(unauthorized("webhook signature mismatch"));
        }

        let event = decode_event(body)?;
        debug!(webhook = %headers.id, ?event, "webhook verified");
        Ok(event)
    }

    fn mac(&self) -> anyhow::Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| anyhow::anyhow!("invalid signing key: {e}"))
    }

    /// Signs a payload the way the provider does. Used to build fixtures.
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> anyhow::Result<String> {
        let mut mac = self.mac()?;
        mac.update(format!("{id}.{timestamp}.").as_bytes());
        mac.update(body);
        Ok(format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes())))
    }
}

impl IdentityProvider for ClerkWebhookVerifier {
    fn verify_webhook(&self, headers: &WebhookHeaders, body: &[u8]) -> anyhow::Result<IdentityEvent> {
        self.verify_at(headers, body, Utc::now())
    }
}

fn unauthorized(msg: &str) -> anyhow::Error {
    AppError::Unauthorized(msg.to_string()).into()
}

fn invalid(msg: String) -> anyhow::Error {
    AppError::Validation(msg).into()
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct EmailAddress {
    #[serde(default)]
    id: Option<String>,
    email_address: String,
}

#[derive(Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    primary_email_address_id: Option<String>,
}

impl UserPayload {
    fn email(&self) -> Option<String> {
        let primary = self.primary_email_address_id.as_deref();
        self.email_addresses
            .iter()
            .find(|e| primary.is_some() && e.id.as_deref() == primary)
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.clone())
    }

    fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

#[derive(Deserialize)]
struct DeletedPayload {
    #[serde(default)]
    id: Option<String>,
}

fn decode_event(body: &[u8]) -> anyhow::Result<IdentityEvent> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| invalid(format!("malformed webhook payload: {e}")))?;

    match envelope.kind.as_str() {
        "user.created" => {
            let user = user_payload(envelope.data)?;
            let email = user.email().unwrap_or_default();
            // Usernames are optional at the provider; fall back to the
            // mailbox name so the profile stays addressable.
            let username = user
                .username
                .clone()
                .or_else(|| email.split('@').next().map(str::to_string))
                .unwrap_or_default();
            Ok(IdentityEvent::UserCreated(NewUser {
                name: user.full_name().unwrap_or_else(|| username.clone()),
                clerk_id: user.id,
                username,
                email,
                bio: None,
                location: None,
                portfolio_website: None,
                picture: user.image_url.unwrap_or_default(),
            }))
        }
        "user.updated" => {
            let user = user_payload(envelope.data)?;
            let update = UserUpdate {
                name: user.full_name(),
                username: user.username.clone(),
                email: user.email(),
                picture: user.image_url.clone(),
                ..Default::default()
            };
            Ok(IdentityEvent::UserUpdated { clerk_id: user.id, update })
        }
        "user.deleted" => {
            let deleted: DeletedPayload = serde_json::from_value(envelope.data)
                .map_err(|e| invalid(format!("malformed user.deleted payload: {e}")))?;
            let clerk_id = deleted.id.ok_or_else(|| invalid("user.deleted without id".to_string()))?;
            Ok(IdentityEvent::UserDeleted { clerk_id })
        }
        other => Ok(IdentityEvent::Ignored(other.to_string())),
    }
}

fn user_payload(data: serde_json::Value) -> anyhow::Result<UserPayload> {
    serde_json::from_value(data).map_err(|e| invalid(format!("malformed user payload: {e}")))
}
