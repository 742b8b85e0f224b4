// Configuration module: the explicit, per-run description of one upload.
// The CLI builds an `UploadConfig` from flags/env and hands it to the
// uploader; nothing here reads the environment on its own.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::HeaderValue;
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Everything needed to perform a single two-phase upload.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Local file whose bytes are uploaded.
    pub path: PathBuf,
    /// Base URL of the server; the data queue path is appended to it.
    pub server: Url,
    pub credentials: Credentials,
    /// The xml file type tag sent as `type` in the registration body.
    pub xml_type: String,
    pub conservation_area: String,
    /// Verify the server certificate. Turning this off makes the client
    /// trust any certificate.
    pub verify_tls: bool,
    /// Per-request timeout. `None` blocks until the server answers.
    pub timeout: Option<Duration>,
}

/// HTTP Basic credentials, attached to both outbound requests.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Build the `Authorization: Basic ...` value. The value is flagged
    /// sensitive so reqwest/hyper never print it.
    pub fn authorization(&self) -> HeaderValue {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        // base64 output is always visible ASCII, so this cannot fail.
        let mut value = HeaderValue::from_str(&format!("Basic {token}"))
            .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
        value.set_sensitive(true);
        value
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
