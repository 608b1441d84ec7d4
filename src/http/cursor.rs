//! Opaque pagination cursors
//!
//! `next_token` values hand the storage layer's page key back to the
//! client without exposing or trusting its contents: the JSON key is
//! base64url-encoded and HMAC-SHA256 signed. A forged or corrupted
//! token fails verification and turns into a 400.

use crate::storage::LastKey;
use crate::{Result, YellowsError};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies pagination cursors
pub struct CursorCodec {
    key: Vec<u8>,
}

impl CursorCodec {
    pub fn new(signing_key: &str) -> Self {
        Self {
            key: signing_key.as_bytes().to_vec(),
        }
    }

    /// Encode a page key into an opaque token: `b64(payload).hex(tag)`
    pub fn encode(&self, key: &LastKey) -> Result<String> {
        let payload = serde_json::to_vec(key)?;
        let tag = self.sign(&payload);
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            hex::encode(tag)
        ))
    }

    /// Decode and verify a token produced by [`encode`](Self::encode)
    pub fn decode(&self, token: &str) -> Result<LastKey> {
        let (payload_b64, tag_hex) = token
            .split_once('.')
            .ok_or_else(|| YellowsError::bad_request("Bad next_token"))?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| YellowsError::bad_request("Bad next_token"))?;
        let given_tag =
            hex::decode(tag_hex).map_err(|_| YellowsError::bad_request("Bad next_token"))?;

        let expected_tag = self.sign(&payload);
        if expected_tag.ct_eq(&given_tag).unwrap_u8() != 1 {
            return Err(YellowsError::bad_request("Bad next_token"));
        }

        serde_json::from_slice(&payload).map_err(|_| YellowsError::bad_request("Bad next_token"))
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
