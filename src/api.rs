// API client module: a small blocking HTTP client for the server's data
// queue. It knows the two calls of the upload handshake and nothing about
// files on disk; the uploader feeds it sizes, names and bytes.

use crate::config::UploadConfig;
use crate::error::{Stage, UploadError};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LOCATION};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Path of the registration endpoint, relative to the server base URL.
pub const ITEMS_PATH: &str = "/server/api/dataqueue/items/";

/// Header announcing the size of the file that will follow.
pub const UPLOAD_LENGTH_HEADER: &str = "X-Upload-Content-Length";

/// Form field name the server expects the file under.
pub const FILE_FIELD: &str = "upload_file";

/// Body of the registration call. The server expects camelCase keys and
/// a `type` key, hence the renames.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub conservation_area: String,
    #[serde(rename = "type")]
    pub xml_type: String,
    /// Base name of the file, never the full path.
    pub name: String,
}

/// Blocking client holding the reqwest client, the server base URL and
/// the prebuilt Basic authorization header shared by both calls.
#[derive(Clone)]
pub struct DataQueueClient {
    client: Client,
    base_url: Url,
    authorization: HeaderValue,
}

impl DataQueueClient {
    /// Build a client from the run configuration: TLS verification and
    /// timeout come from the config, credentials are turned into the
    /// Authorization header once.
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        let server = &config.server;
        if server.cannot_be_a_base() || server.query().is_some() || server.fragment().is_some() {
            return Err(UploadError::InvalidServerUrl(server.to_string()));
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .build()
            .map_err(UploadError::ClientBuild)?;
        Ok(DataQueueClient {
            client,
            base_url: config.server.clone(),
            authorization: config.credentials.authorization(),
        })
    }

    /// Full URL of the registration endpoint. Trailing slashes of the
    /// base path are dropped before the items path is appended.
    pub fn items_url(&self) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}{ITEMS_PATH}", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url
    }

    /// Register the upload intent and return the URL the file must be
    /// posted to. Only a 200 with a usable Location header counts as
    /// success; the response body is discarded.
    pub fn register(
        &self,
        req: &UploadRequest,
        content_length: u64,
    ) -> Result<Url, UploadError> {
        let url = self.items_url();
        info!(%url, size = content_length, "registering upload");

        let res = self
            .client
            .post(url.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .header(UPLOAD_LENGTH_HEADER, content_length.to_string())
            .json(req)
            .send()
            .map_err(|source| UploadError::Network {
                stage: Stage::Registration,
                source,
            })?;

        let res = expect_status(res, Stage::Registration, StatusCode::OK)?;
        let location = location_of(&url, res.headers())?;
        debug!(%location, "registration accepted");
        Ok(location)
    }

    /// POST the file as a single `upload_file` multipart part to the
    /// location handed out by `register`. Expects 202 and returns the
    /// response body as text.
    pub fn upload(
        &self,
        location: Url,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, UploadError> {
        info!(url = %location, size = bytes.len(), "uploading file content");

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(UploadError::Multipart)?;
        let form = multipart::Form::new().part(FILE_FIELD, part);

        let res = self
            .client
            .post(location)
            .header(AUTHORIZATION, self.authorization.clone())
            .multipart(form)
            .send()
            .map_err(|source| UploadError::Network {
                stage: Stage::Upload,
                source,
            })?;

        let res = expect_status(res, Stage::Upload, StatusCode::ACCEPTED)?;
        res.text().map_err(|source| UploadError::Network {
            stage: Stage::Upload,
            source,
        })
    }
}

/// Pass the response through when it has exactly the expected status.
/// Otherwise the body is logged at debug level and dropped.
fn expect_status(
    res: Response,
    stage: Stage,
    expected: StatusCode,
) -> Result<Response, UploadError> {
    let actual = res.status();
    if actual == expected {
        return Ok(res);
    }
    let body = res.text().unwrap_or_default();
    debug!(%stage, status = actual.as_u16(), %body, "unexpected response");
    Err(UploadError::UnexpectedStatus {
        stage,
        expected,
        actual,
    })
}

/// Resolve the Location header against the URL of the request that
/// produced it, so both absolute and relative values work. Absent, blank,
/// non-ASCII and unparseable values all count as no usable location.
pub fn location_of(request_url: &Url, headers: &HeaderMap) -> Result<Url, UploadError> {
    let value = headers
        .get(LOCATION)
        .ok_or(UploadError::MissingLocation { value: None })?;
    let raw = value.to_str().map_err(|_| UploadError::MissingLocation {
        value: Some(String::from_utf8_lossy(value.as_bytes()).into_owned()),
    })?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UploadError::MissingLocation { value: None });
    }
    request_url.join(raw).map_err(|_| UploadError::MissingLocation {
        value: Some(raw.to_string()),
    })
}
