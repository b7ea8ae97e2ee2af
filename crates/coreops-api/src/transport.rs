// Shared transport plumbing for building reqwest::Client instances.
//
// All four service clients share timeout and user-agent settings through
// this module, along with the common "decode or surface the raw body"
// step, avoiding duplicated builder and decoder logic per service.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Error;

/// Shared transport configuration for building HTTP clients.
///
/// The cluster services speak plain HTTP on well-known ports inside the
/// cluster network, so there is no TLS or credential handling here.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("coreops-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)
    }
}

/// Root URL for a service on `host` (hostname or IP, no scheme).
pub(crate) fn service_root(host: &str, port: u16) -> Result<Url, Error> {
    Ok(Url::parse(&format!("http://{host}:{port}/"))?)
}

/// Decode a JSON body into `T`, surfacing malformed JSON as a recoverable
/// [`Error::Deserialization`] with a short body preview.
pub(crate) fn decode_json<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(e) => {
            // Truncate on a char boundary; the cut must not split a
            // multibyte character.
            let mut cut = body.len().min(200);
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            let message = format!("{e} (body preview: {:?})", &body[..cut]);
            Err(Error::Deserialization { message, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_carries_a_preview_and_the_full_body() {
        let err = decode_json::<serde_json::Value>("not json".to_owned()).unwrap_err();

        match err {
            Error::Deserialization { message, body } => {
                assert!(message.contains("body preview"));
                assert_eq!(body, "not json");
            }
            other => panic!("expected Deserialization, got: {other:?}"),
        }
    }

    #[test]
    fn preview_truncation_respects_multibyte_boundaries() {
        // 199 ASCII bytes, then a 3-byte character straddling the
        // 200-byte preview cut.
        let body = format!("{}€ and more garbage", "x".repeat(199));

        let result = decode_json::<serde_json::Value>(body);

        assert!(
            matches!(result, Err(Error::Deserialization { .. })),
            "expected a recoverable decode error, got: {result:?}"
        );
    }
}
