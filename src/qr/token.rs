use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::geo::GeoPoint;

/// What a QR code stands for. Serialized as the `type` claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QrPayload {
    /// Shown on the front-desk display; `location` is that device's GPS fix at issuance.
    #[serde(rename = "OFFICE_QR")]
    Office {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<GeoPoint>,
    },
    /// A personal badge.
    #[serde(rename = "USER_QR")]
    User { user_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrClaims {
    #[serde(flatten)]
    pub payload: QrPayload,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Issues and verifies the short-lived HS256 tokens behind office and badge QR codes.
#[derive(Clone)]
pub struct QrSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl QrSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, payload: QrPayload, ttl_seconds: u64) -> Result<String, Error> {
        self.issue_at(payload, ttl_seconds, now())
    }

    pub(crate) fn issue_at(
        &self,
        payload: QrPayload,
        ttl_seconds: u64,
        issued_at: u64,
    ) -> Result<String, Error> {
        let claims = QrClaims {
            payload,
            iat: issued_at,
            exp: issued_at + ttl_seconds,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// `None` for anything that is not a live token of ours: bad signature,
    /// garbage input, expired, or a token without a QR `type`.
    pub fn verify(&self, token: &str) -> Option<QrClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<QrClaims>(token.trim(), &self.decoding, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "QR token rejected");
                None
            }
        }
    }

    pub fn verify_office(&self, token: &str) -> Option<Option<GeoPoint>> {
        match self.verify(token)?.payload {
            QrPayload::Office { location } => Some(location),
            QrPayload::User { .. } => None,
        }
    }

    pub fn verify_user(&self, token: &str) -> Option<u64> {
        match self.verify(token)?.payload {
            QrPayload::User { user_id } => Some(user_id),
            QrPayload::Office { .. } => None,
        }
    }
}
