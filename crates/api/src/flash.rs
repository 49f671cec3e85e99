//! Flash messages
//!
//! Messages queued while handling a request travel to the next rendered page
//! in a signed cookie. A page that displays them clears the cookie, so each
//! message survives exactly one redirect.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderValue},
    response::{IntoResponseParts, ResponseParts},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::auth::cookie_value;

type HmacSha256 = Hmac<Sha256>;

pub const FLASH_COOKIE: &str = "backoffice_flash";

/// Browsers cap a cookie at roughly 4KB
const MAX_COOKIE_VALUE_LEN: usize = 3800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

/// Signs and verifies the flash cookie payload
#[derive(Clone)]
pub struct FlashCodec {
    key: Arc<[u8]>,
    secure: bool,
}

impl FlashCodec {
    pub fn new(secret: &str, secure: bool) -> Self {
        Self {
            key: Arc::from(secret.as_bytes()),
            secure,
        }
    }

    fn mac(&self) -> Option<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).ok()
    }

    /// `base64url(json) "." hex(hmac)`
    pub fn encode(&self, messages: &[FlashMessage]) -> Option<String> {
        let json = serde_json::to_vec(messages).ok()?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Some(format!("{}.{}", payload, signature))
    }

    /// Returns `None` for malformed or tampered values
    pub fn decode(&self, value: &str) -> Option<Vec<FlashMessage>> {
        let (payload, signature) = value.split_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }

    fn set_cookie(&self, value: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
            FLASH_COOKIE,
            value,
            if self.secure { "; Secure" } else { "" }
        )
    }

    fn clear_cookie(&self) -> String {
        format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{}",
            FLASH_COOKIE,
            if self.secure { "; Secure" } else { "" }
        )
    }
}

/// Flash messages of the current client.
///
/// Extract it to read or queue messages, and return it as a response part so
/// the cookie is rewritten.
pub struct Flashes {
    codec: FlashCodec,
    incoming: Vec<FlashMessage>,
    outgoing: Vec<FlashMessage>,
    had_cookie: bool,
}

impl Flashes {
    pub fn add(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.outgoing.push(FlashMessage {
            level,
            message: message.into(),
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.add(FlashLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.add(FlashLevel::Error, message);
    }

    /// Remove every pending message for display
    pub fn take(&mut self) -> Vec<FlashMessage> {
        let mut messages = std::mem::take(&mut self.incoming);
        messages.append(&mut self.outgoing);
        messages
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Flashes
where
    S: Send + Sync,
    FlashCodec: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = FlashCodec::from_ref(state);
        let raw = cookie_value(&parts.headers, FLASH_COOKIE);

        let incoming = match raw {
            Some(value) if !value.is_empty() => codec.decode(value).unwrap_or_else(|| {
                tracing::warn!("Discarding flash cookie with invalid signature");
                Vec::new()
            }),
            _ => Vec::new(),
        };

        Ok(Self {
            codec,
            incoming,
            outgoing: Vec::new(),
            had_cookie: raw.is_some(),
        })
    }
}

impl IntoResponseParts for Flashes {
    type Error = Infallible;

    fn into_response_parts(mut self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let mut pending = self.take();

        let cookie = if pending.is_empty() {
            self.had_cookie.then(|| self.codec.clear_cookie())
        } else {
            let mut encoded = self.codec.encode(&pending);
            // Drop the oldest messages until the cookie fits
            while pending.len() > 1
                && encoded.as_ref().map_or(false, |v| v.len() > MAX_COOKIE_VALUE_LEN)
            {
                pending.remove(0);
                encoded = self.codec.encode(&pending);
            }
            encoded.map(|value| self.codec.set_cookie(&value))
        };

        if let Some(cookie) = cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!(error = %e, "Could not build flash cookie header"),
            }
        }

        Ok(res)
    }
}
