//! Bearer tokens binding a request to an account.
//!
//! A token reads `<account_id>.<hex hmac-sha256(account_id)>`. Tokens carry no
//! expiry; rotating the secret revokes every issued token.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

use crate::domain::entry::AccountId;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '.';

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token secret is unusable")]
    Secret,
}

#[derive(Clone)]
pub struct TokenAuthority {
    secret: SecretString,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority").field("secret", &"[REDACTED]").finish()
    }
}

impl TokenAuthority {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    pub fn issue(&self, account_id: &AccountId) -> Result<String, TokenError> {
        let mac = self.mac(account_id.0.as_bytes())?;
        Ok(format!("{}{SEPARATOR}{}", account_id.0, encode_hex(&mac.finalize().into_bytes())))
    }

    /// Resolves a token to the account it was issued for. Accepts the raw
    /// token or an `Authorization` header value with a `Bearer ` prefix.
    pub fn resolve(&self, token: &str) -> Result<AccountId, TokenError> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        let (account, signature) = token.rsplit_once(SEPARATOR).ok_or(TokenError::Malformed)?;
        if account.is_empty() {
            return Err(TokenError::Malformed);
        }
        let signature = decode_hex(signature).ok_or(TokenError::Malformed)?;

        self.mac(account.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        Ok(AccountId(account.to_string()))
    }

    fn mac(&self, payload: &[u8]) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Secret)?;
        mac.update(payload);
        Ok(mac)
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn decode_hex(value: &str) -> Option<Vec<u8>> {
    if value.is_empty() || value.len() % 2 != 0 || !value.is_ascii() {
        return None;
    }
    (0..value.len())
        .step_by(2)
        .map(|index| u8::from_str_radix(&value[index..index + 2], 16).ok())
        .collect()
}
