// ============================================================
// Layer 5 — Perkeep HTTP Client
// ============================================================
// Thin blocking client for the parts of the Perkeep HTTP API
// this tool needs:
//
//   GET  /ui/?camli.mode=config          → web client config
//   POST <searchRoot>camli/search/query  → search
//   GET  /ui/download/<blobref>/blob     → file contents
//   POST /ui/?camli.mode=uploadhelper    → multipart upload
//
// Every request carries HTTP basic auth from the server's
// "userpass" setting. Perkeep servers usually run with a
// self-signed certificate, so certificate checks are off
// unless ClientSettings says otherwise.
//
// The web client config (which tells us the search root) is
// fetched on first use and kept for the client's lifetime.
//
// Reference: reqwest documentation (blocking, multipart)
//            Rust Book §9 (Error Handling)

use std::{io::Write, sync::OnceLock, time::Duration};

use reqwest::blocking::{multipart, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::traits::BlobStore;
use crate::infra::config::{Auth, ClientConfig, ConfigError, ServerConfig};

const WEB_CONFIG_PATH: &str = "/ui/?camli.mode=config";
const UPLOAD_HELPER_PATH: &str = "/ui/?camli.mode=uploadhelper";
const SEARCH_QUERY_PATH: &str = "camli/search/query";

/// Perkeep client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request error, including non-2xx responses.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered 2xx with a body we cannot use.
    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

// ─── Settings ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,

    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout:              Duration::from_secs(30),
            accept_invalid_certs: true,
        }
    }
}

// ─── Response payloads ────────────────────────────────────────────────────────
/// The subset of the server's web client config we rely on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebClientConfig {
    /// Path prefix of the search handler, e.g. "/my-search/"
    pub search_root: String,
}

#[derive(Debug, Deserialize)]
struct UploadHelperResponse {
    data: UploadHelperData,
}

#[derive(Debug, Deserialize)]
struct UploadHelperData {
    #[serde(default)]
    got: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    fileref: String,
}

// ─── PerkeepClient ────────────────────────────────────────────────────────────
pub struct PerkeepClient {
    base_url:   String,
    auth:       Auth,
    client:     reqwest::blocking::Client,
    web_config: OnceLock<WebClientConfig>,
}

impl PerkeepClient {
    /// Creates a client for the default server in the local
    /// client-config.json.
    pub fn from_default_config() -> Result<Self> {
        let config = ClientConfig::load_default()?;
        Self::new(config.default_server()?, ClientSettings::default())
    }

    /// Creates a client for an explicit server entry.
    ///
    /// # Errors
    /// Returns error if the auth setting is invalid or the HTTP
    /// client cannot be built
    pub fn new(server: &ServerConfig, settings: ClientSettings) -> Result<Self> {
        let auth = server.credentials()?;

        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()?;

        tracing::debug!("Perkeep client for {}", server.server);

        Ok(Self {
            base_url: server.server.trim_end_matches('/').to_string(),
            auth,
            client,
            web_config: OnceLock::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The server's web client config, fetched once and cached.
    pub fn web_client_config(&self) -> Result<&WebClientConfig> {
        if let Some(config) = self.web_config.get() {
            return Ok(config);
        }

        let body                     = self.get(WEB_CONFIG_PATH)?.text()?;
        let fetched: WebClientConfig = parse_body("web client config", &body)?;
        tracing::debug!("Search root is '{}'", fetched.search_root);
        Ok(self.web_config.get_or_init(|| fetched))
    }

    /// Runs a search query and returns the server's JSON answer.
    ///
    /// # Arguments
    /// * `opts` - Query body, e.g. `{"expression": "tag:solln"}`
    pub fn query(&self, opts: &Value) -> Result<Value> {
        let search_root = &self.web_client_config()?.search_root;
        let path        = format!("{}{}", search_root, SEARCH_QUERY_PATH);

        let request = self.client.post(self.url(&path)).json(opts);
        let body    = self.send(request)?.text()?;
        parse_body("search query", &body)
    }

    /// Fetches the contents of the file behind `blobref`.
    pub fn download(&self, blobref: &str) -> Result<Vec<u8>> {
        let bytes = self.get(&download_path(blobref))?.bytes()?;
        Ok(bytes.to_vec())
    }

    /// Streams the contents of the file behind `blobref` into `out`.
    /// Returns the number of bytes written.
    pub fn download_to<W: Write + ?Sized>(&self, blobref: &str, out: &mut W) -> Result<u64> {
        let mut response = self.get(&download_path(blobref))?;
        Ok(response.copy_to(out)?)
    }

    /// Uploads `blob` as a file named `file_name` and returns the
    /// fileref the server assigned to it.
    pub fn upload(&self, blob: Vec<u8>, file_name: &str) -> Result<String> {
        let size = blob.len();
        let part = multipart::Part::bytes(blob)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);

        let request  = self.client.post(self.url(UPLOAD_HELPER_PATH)).multipart(form);
        let body     = self.send(request)?.text()?;
        let response: UploadHelperResponse = parse_body("upload helper", &body)?;

        let fileref = response
            .data
            .got
            .into_iter()
            .next()
            .map(|f| f.fileref)
            .ok_or_else(|| ClientError::InvalidResponse("upload helper returned no files".into()))?;

        tracing::info!("Uploaded '{}' ({} bytes) as {}", file_name, size, fileref);
        Ok(fileref)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> Result<Response> {
        self.send(self.client.get(self.url(path)))
    }

    /// Attach credentials, send, and turn non-2xx into an error.
    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.auth {
            Auth::UserPass { user, password } => request.basic_auth(user, Some(password)),
        };
        Ok(request.send()?.error_for_status()?)
    }
}

/// Decode a JSON body; anything malformed is an invalid response,
/// not a transport error.
fn parse_body<T: DeserializeOwned>(what: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| ClientError::InvalidResponse(format!("{} body: {}", what, e)))
}

fn download_path(blobref: &str) -> String {
    format!("/ui/download/{}/blob", blobref)
}

impl BlobStore for PerkeepClient {
    fn query(&self, opts: &Value) -> anyhow::Result<Value> {
        Ok(PerkeepClient::query(self, opts)?)
    }

    fn download(&self, blobref: &str) -> anyhow::Result<Vec<u8>> {
        Ok(PerkeepClient::download(self, blobref)?)
    }

    fn upload(&self, blob: Vec<u8>, file_name: &str) -> anyhow::Result<String> {
        Ok(PerkeepClient::upload(self, blob, file_name)?)
    }
}
