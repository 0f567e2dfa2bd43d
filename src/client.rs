use crate::auth::{Admin, AdminToken, Credentials, Signup, User};
use crate::field::{decode_fields, normalize_fields, Field, FieldData, FieldId, Normalization};
use crate::form::FieldPayload;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::DurationSeconds;
use std::thread::sleep;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};
use ureq::{Agent, AgentBuilder, Request, Response};

const USER_AGENT: &str = concat!("field-finder/", env!("CARGO_PKG_VERSION"));
const GENERIC_ERROR: &str = "An error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("{0}")]
    Transport(String),
    #[error("Retry limit exceeded for {0}")]
    RetryLimit(String),
    #[error("Invalid response: {0}")]
    Decode(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[serde_with::serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClientOptions {
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    /// Retries after the first attempt
    pub retry_limit: u64,
    /// Wait before a retry when the server doesn't say
    #[serde_as(as = "DurationSeconds<u64>")]
    pub retry_delay: Duration,
    /// Upper bound for a server supplied Retry-After
    #[serde_as(as = "DurationSeconds<u64>")]
    pub max_retry_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry_limit: 5,
            retry_delay: Duration::from_secs(7),
            max_retry_delay: Duration::from_secs(60),
        }
    }
}

pub fn is_retryable(status: u16) -> bool {
    matches!(status, 408 | 429 | 503)
}

/// Delay before the next attempt. Retry-After is read as whole seconds and
/// capped at `max`; without a usable header the fallback is used.
pub fn retry_after(header: Option<&str>, fallback: Duration, max: Duration) -> Duration {
    header
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(fallback)
        .min(max)
}

/// Pull a readable message out of an error response body.
pub fn error_detail(body: &str, status_text: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => return detail.clone(),
            Some(Value::Null) | None => {}
            Some(other) => return other.to_string(),
        },
        Ok(Value::String(message)) => return message,
        _ => {}
    }
    if status_text.is_empty() {
        GENERIC_ERROR.to_string()
    } else {
        status_text.to_string()
    }
}

#[derive(Debug)]
pub struct Client {
    agent: Agent,
    base_url: String,
    retry_limit: u64,
    retry_delay: Duration,
    max_retry_delay: Duration,
}

impl Client {
    pub fn new(base_url: &str, opts: &ClientOptions) -> Client {
        let agent = AgentBuilder::new()
            .timeout_read(opts.timeout)
            .timeout_write(opts.timeout)
            .user_agent(USER_AGENT)
            .build();
        Client {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_limit: opts.retry_limit,
            retry_delay: opts.retry_delay,
            max_retry_delay: opts.max_retry_delay,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn fail(code: u16, response: Response) -> ApiError {
        let status_text = response.status_text().to_string();
        let body = response.into_string().unwrap_or_default();
        let detail = error_detail(&body, &status_text);
        error!("{code}: {detail}");
        ApiError::Status {
            status: code,
            detail,
        }
    }

    fn transport(err: ureq::Error) -> ApiError {
        let error = err.to_string();
        error!("{error}");
        ApiError::Transport(error)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&AdminToken>) -> Result<T> {
        let url = self.url(path);
        debug!("Fetching {url}");
        let mut retries = 0;
        loop {
            let mut request = self.agent.get(&url);
            if let Some(token) = token {
                request = request.set("Authorization", token.header_value());
            }
            match request.call() {
                Ok(response) => return Ok(response.into_json()?),
                Err(ureq::Error::Status(code, response)) if is_retryable(code) => {
                    if retries >= self.retry_limit {
                        error!("{code} for {url}, giving up after {retries} retries");
                        return Err(ApiError::RetryLimit(url));
                    }
                    let delay = retry_after(
                        response.header("retry-after"),
                        self.retry_delay,
                        self.max_retry_delay,
                    );
                    error!("{} for {}, retry in {}s", code, url, delay.as_secs());
                    retries += 1;
                    sleep(delay);
                }
                Err(ureq::Error::Status(code, response)) => return Err(Self::fail(code, response)),
                Err(err) => return Err(Self::transport(err)),
            }
        }
    }

    fn send(&self, request: Request, body: Option<&impl Serialize>) -> Result<Response> {
        debug!("{} {}", request.method(), request.url());
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(code, response)) => Err(Self::fail(code, response)),
            Err(err) => Err(Self::transport(err)),
        }
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let request = self.agent.post(&self.url(path));
        Ok(self.send(request, Some(body))?.into_json()?)
    }

    fn authorized(&self, method: &str, path: &str, token: &AdminToken) -> Request {
        self.agent
            .request(method, &self.url(path))
            .set("Authorization", token.header_value())
    }

    /// Every listing as stored, with nothing filled in. Malformed entries are
    /// dropped.
    pub fn get_field_data(&self) -> Result<Vec<FieldData>> {
        let payload: Value = self.get("fields", None)?;
        Ok(decode_fields(payload))
    }

    /// Every listing, normalized for display.
    pub fn get_fields(&self, opts: &Normalization) -> Result<Vec<Field>> {
        let payload: Value = self.get("fields", None)?;
        Ok(normalize_fields(payload, opts))
    }

    pub fn signup(&self, signup: &Signup) -> Result<User> {
        self.post("users", signup)
    }

    pub fn login(&self, credentials: &Credentials) -> Result<User> {
        self.post("users/login", credentials)
    }

    /// Log in as an admin and build the token for later admin requests.
    pub fn admin_login(&self, credentials: &Credentials) -> Result<(Admin, AdminToken)> {
        let admin = self.post("admin/login", credentials)?;
        Ok((admin, AdminToken::from_credentials(credentials)))
    }

    pub fn admin_profile(&self, token: &AdminToken) -> Result<Admin> {
        self.get("admin/me", Some(token))
    }

    pub fn create_field(&self, payload: &FieldPayload, token: &AdminToken) -> Result<FieldData> {
        let request = self.authorized("POST", "fields", token);
        Ok(self.send(request, Some(payload))?.into_json()?)
    }

    pub fn update_field(
        &self,
        id: FieldId,
        payload: &FieldPayload,
        token: &AdminToken,
    ) -> Result<FieldData> {
        let request = self.authorized("PUT", &format!("fields/{id}"), token);
        Ok(self.send(request, Some(payload))?.into_json()?)
    }

    pub fn delete_field(&self, id: FieldId, token: &AdminToken) -> Result<()> {
        let request = self.authorized("DELETE", &format!("fields/{id}"), token);
        self.send(request, None::<&()>)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_from_json_object() {
        assert_eq!(
            error_detail(r#"{"detail": "Invalid credentials"}"#, "Unauthorized"),
            "Invalid credentials"
        );
    }

    #[test]
    fn structured_detail_is_stringified() {
        let body = r#"{"detail": [{"loc": ["body", "email"], "msg": "field required"}]}"#;
        let detail = error_detail(body, "Unprocessable Entity");
        assert!(detail.contains("field required"));
    }

    #[test]
    fn detail_from_json_string() {
        assert_eq!(error_detail(r#""Field not found""#, "Not Found"), "Field not found");
    }

    #[test]
    fn detail_falls_back_to_status_text() {
        assert_eq!(error_detail("<html>oops</html>", "Bad Gateway"), "Bad Gateway");
        assert_eq!(error_detail(r#"{"error": 1}"#, "Bad Request"), "Bad Request");
        assert_eq!(error_detail("", ""), GENERIC_ERROR);
    }

    #[test]
    fn urls_are_joined_with_one_slash() {
        let client = Client::new("http://127.0.0.1:8000/api/", &ClientOptions::default());
        assert_eq!(client.url("fields"), "http://127.0.0.1:8000/api/fields");
        assert_eq!(client.url("/fields/3"), "http://127.0.0.1:8000/api/fields/3");
    }

    #[test]
    fn only_transient_statuses_are_retried() {
        for status in [408, 429, 503] {
            assert!(is_retryable(status), "{status}");
        }
        for status in [400, 401, 404, 500, 502] {
            assert!(!is_retryable(status), "{status}");
        }
    }

    #[test]
    fn retry_after_header_is_honored() {
        let fallback = Duration::from_secs(7);
        let max = Duration::from_secs(60);
        assert_eq!(retry_after(Some("3"), fallback, max), Duration::from_secs(3));
        assert_eq!(retry_after(Some(" 0 "), fallback, max), Duration::ZERO);
    }

    #[test]
    fn retry_after_falls_back_without_a_number() {
        let fallback = Duration::from_secs(7);
        let max = Duration::from_secs(60);
        assert_eq!(retry_after(None, fallback, max), fallback);
        assert_eq!(
            retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT"), fallback, max),
            fallback
        );
        assert_eq!(retry_after(Some("-5"), fallback, max), fallback);
    }

    #[test]
    fn retry_after_is_capped() {
        let max = Duration::from_secs(60);
        assert_eq!(retry_after(Some("86400"), Duration::from_secs(7), max), max);
        assert_eq!(retry_after(None, Duration::from_secs(300), max), max);
    }

    #[test]
    fn zero_retries_still_sends_one_request() {
        let opts = ClientOptions {
            retry_limit: 0,
            timeout: Duration::from_millis(200),
            ..Default::default()
        };
        // Nothing listens on port 9, so the one attempt fails in transport
        // rather than hitting the retry limit without a request.
        let client = Client::new("http://127.0.0.1:9/api", &opts);
        let err = client.get_field_data().unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    }

    #[test]
    fn durations_are_configured_in_seconds() {
        let opts: ClientOptions = serde_json::from_str(
            r#"{"timeout": 5, "retry_limit": 2, "retry_delay": 3, "max_retry_delay": 30}"#,
        )
        .unwrap();
        assert_eq!(opts.retry_delay, Duration::from_secs(3));
        assert_eq!(opts.max_retry_delay, Duration::from_secs(30));
    }

    #[test]
    fn status_errors_expose_the_code() {
        let err = ApiError::Status {
            status: 401,
            detail: "nope".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "401: nope");
        assert_eq!(ApiError::Transport("x".to_string()).status(), None);
    }
}
