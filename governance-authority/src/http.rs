//! HTTPS authority source that calls a remote authority evaluation service.

use std::sync::Arc;
use std::{env, fmt, time::Duration};

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::client::HttpConnector;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Body, Client, Request, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use uuid::Uuid;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::context::{AuthorityContext, AuthorityInstance};
use crate::source::{AuthorityError, AuthorityResult, AuthoritySource};

/// Environment variable read by [`HttpAuthorityConfig::from_env`] for the base URL.
pub const AUTHORITY_URL_ENV: &str = "GOVERNANCE_AUTHORITY_URL";
/// Environment variable read by [`HttpAuthorityConfig::from_env`] for the API key.
pub const AUTHORITY_API_KEY_ENV: &str = "GOVERNANCE_AUTHORITY_API_KEY";

const API_KEY_HEADER: &str = "x-authority-api-key";

type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Configuration for [`HttpAuthoritySource`].
#[derive(Clone)]
pub struct HttpAuthorityConfig {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for HttpAuthorityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAuthorityConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for HttpAuthorityConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl HttpAuthorityConfig {
    /// Creates an empty configuration. Building a source from it fails until a
    /// base URL and API key are supplied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the base URL and API key from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var(AUTHORITY_URL_ENV).ok(),
            api_key: env::var(AUTHORITY_API_KEY_ENV).ok(),
            ..Self::default()
        }
    }

    /// Sets the base URL of the authority service.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::Configuration`] if the URL is not http(s).
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AuthorityResult<Self> {
        self.base_url = Some(sanitize_base_url(base_url.as_ref())?);
        Ok(self)
    }

    /// Supplies the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the transport timeout for one evaluation request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Authority source backed by a remote `/v1/authority/evaluate` endpoint.
pub struct HttpAuthoritySource {
    client: HyperClient,
    endpoint: Uri,
    api_key: HeaderValue,
    timeout: Duration,
}

impl fmt::Debug for HttpAuthoritySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAuthoritySource")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpAuthoritySource {
    /// Builds a source from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::Configuration`] when the base URL or API key is
    /// missing or invalid. A misconfigured source is never silently replaced
    /// with a permissive one.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(config: HttpAuthorityConfig) -> AuthorityResult<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| AuthorityError::configuration("authority base URL missing"))
            .and_then(sanitize_base_url)?;
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AuthorityError::configuration("authority API key missing"))?;
        let mut api_key = HeaderValue::from_str(api_key)
            .map_err(|_| AuthorityError::configuration("authority API key is not a valid header"))?;
        api_key.set_sensitive(true);

        let endpoint = format!("{base_url}v1/authority/evaluate")
            .parse::<Uri>()
            .map_err(|err| {
                AuthorityError::configuration(format!("invalid authority endpoint: {err}"))
            })?;

        Ok(Self {
            client: build_https_client(),
            endpoint,
            api_key,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl AuthoritySource for HttpAuthoritySource {
    async fn lookup(&self, instance: &AuthorityInstance) -> AuthorityResult<AuthorityContext> {
        let payload = EvaluateRequest {
            request_id: Uuid::new_v4(),
            authority: instance.authority(),
            scope: instance.scope(),
        };
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AuthorityError::transport(format!("failed to encode authority request: {err}"))
        })?;

        let req = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, self.api_key.clone())
            .body(Body::from(body))
            .map_err(|err| {
                AuthorityError::transport(format!("failed to build authority request: {err}"))
            })?;

        let response = timeout(self.timeout, self.client.request(req))
            .await
            .map_err(|_| AuthorityError::transport("authority request timed out"))?
            .map_err(|err| AuthorityError::transport(format!("authority request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            AuthorityError::transport(format!("failed to read authority response: {err}"))
        })?;

        if !status.is_success() {
            return Err(AuthorityError::response(format!(
                "authority service returned {status}"
            )));
        }

        decode_response(&bytes)
    }
}

#[derive(Debug, Serialize)]
struct EvaluateRequest<'a> {
    request_id: Uuid,
    authority: &'a str,
    scope: &'a str,
}

#[derive(Debug, Deserialize)]
struct EvaluateResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    authority: Option<AuthorityContext>,
}

fn decode_response(bytes: &[u8]) -> AuthorityResult<AuthorityContext> {
    let response: EvaluateResponse = serde_json::from_slice(bytes).map_err(|err| {
        AuthorityError::response(format!("failed to decode authority response: {err}"))
    })?;
    match response {
        EvaluateResponse {
            ok: true,
            authority: Some(context),
        } => Ok(context),
        _ => Err(AuthorityError::response(
            "authority response carried no context",
        )),
    }
}

fn build_https_client() -> HyperClient {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let tls = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    Client::builder().build::<_, Body>(HttpsConnector::from((http, Arc::new(tls))))
}

fn sanitize_base_url(input: &str) -> AuthorityResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AuthorityError::configuration(
            "authority base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>().map_err(|err| {
        AuthorityError::configuration(format!("invalid authority base URL: {err}"))
    })?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AuthorityStatus;

    #[test]
    fn missing_credentials_fail_closed() {
        let err = HttpAuthoritySource::new(HttpAuthorityConfig::new()).expect_err("no url");
        assert!(matches!(err, AuthorityError::Configuration { .. }));

        let config = HttpAuthorityConfig::new()
            .with_base_url("https://authority.example")
            .unwrap();
        let err = HttpAuthoritySource::new(config).expect_err("no key");
        assert!(matches!(err, AuthorityError::Configuration { .. }));
    }

    #[test]
    fn base_url_requires_scheme_and_gets_trailing_slash() {
        assert!(HttpAuthorityConfig::new().with_base_url("authority.example").is_err());
        let config = HttpAuthorityConfig::new()
            .with_base_url("https://authority.example/api")
            .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://authority.example/api/"));
    }

    #[test]
    fn endpoint_is_derived_from_base_url() {
        let config = HttpAuthorityConfig::new()
            .with_base_url("https://authority.example")
            .unwrap()
            .with_api_key("secret");
        let source = HttpAuthoritySource::new(config).unwrap();
        assert_eq!(
            source.endpoint.to_string(),
            "https://authority.example/v1/authority/evaluate"
        );
    }

    #[test]
    fn config_debug_redacts_key() {
        let config = HttpAuthorityConfig::new().with_api_key("super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn decodes_enveloped_context() {
        let json = br#"{
            "ok": true,
            "authority": {
                "authority": "USPTO",
                "scope": "PATENTABILITY",
                "status": "NEGATIVE",
                "confidence": "LOW",
                "reason": "NO_RESULTS",
                "timestamp": "2026-01-05T10:00:00Z"
            }
        }"#;
        let context = decode_response(json).unwrap();
        assert_eq!(context.status(), AuthorityStatus::Negative);
        assert_eq!(context.reason(), Some("NO_RESULTS"));
    }

    #[test]
    fn rejects_envelope_without_context() {
        assert!(decode_response(br#"{"ok": false}"#).is_err());
        assert!(decode_response(br#"{"ok": true}"#).is_err());
        assert!(decode_response(b"not json").is_err());
    }
}
