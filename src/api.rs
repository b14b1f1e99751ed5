// API client module: contains a small blocking HTTP client that talks to
// the image forensics service. Every public operation returns an
// `Envelope`; transport, IO and decoding failures are folded into an
// error envelope at the method boundary instead of being returned as `Err`.

use anyhow::{bail, Context, Result};
use reqwest::blocking::{multipart, Client, Response};
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::envelope::Envelope;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable consulted for the service base URL.
pub const BASE_URL_ENV: &str = "FORENSICS_API_URL";

/// Multipart field used for single-image uploads.
pub const IMAGE_FIELD: &str = "image";

/// Repeated multipart field used for batch uploads.
pub const BATCH_IMAGE_FIELD: &str = "images[]";

/// Connection settings for one process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ClientConfig {
            base_url,
            timeout: None,
        }
    }

    /// Read the base URL from `FORENSICS_API_URL` or fall back to
    /// `http://localhost:8080`.
    pub fn from_env() -> Self {
        Self::from_base_url_var(std::env::var(BASE_URL_ENV).ok())
    }

    fn from_base_url_var(value: Option<String>) -> Self {
        match value {
            Some(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    /// Bound each request. Without this, requests may block indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// An opened local file destined for one multipart part. The handle is
/// owned, so it is closed whenever the upload is dropped.
#[derive(Debug)]
pub struct FileUpload {
    pub field: &'static str,
    pub file_name: String,
    pub mime: &'static str,
    pub length: u64,
    pub file: File,
}

impl FileUpload {
    pub fn open(field: &'static str, path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open image file {}", path.display()))?;
        let length = file
            .metadata()
            .with_context(|| format!("Failed to stat image file {}", path.display()))?
            .len();
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(FileUpload {
            field,
            file_name,
            mime: mime_for(path),
            length,
            file,
        })
    }
}

/// Pick a content type from the file extension.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// The wire seam under `ForensicsClient`. Implementations return the
/// decoded JSON body or an error describing what went wrong.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Value>;

    /// POST `files` as one multipart form. Ownership of every upload moves
    /// into the call, so all handles are released when it returns.
    fn post_files(&self, url: &str, files: Vec<FileUpload>) -> Result<Value>;
}

/// `Transport` backed by a blocking reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Value> {
        let res = self
            .client
            .get(url)
            .send()
            .context("Failed to send request")?;
        decode_body(res)
    }

    fn post_files(&self, url: &str, files: Vec<FileUpload>) -> Result<Value> {
        let mut form = multipart::Form::new();
        for upload in files {
            let part = multipart::Part::reader_with_length(upload.file, upload.length)
                .file_name(upload.file_name)
                .mime_str(upload.mime)
                .context("Invalid content type for upload")?;
            form = form.part(upload.field, part);
        }

        let res = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .context("Failed to send upload request")?;
        decode_body(res)
    }
}

/// Decode the body as JSON whatever the status code: the service answers
/// failures with error envelopes on 4xx/5xx.
fn decode_body(res: Response) -> Result<Value> {
    let status = res.status();
    let txt = res.text().context("Failed to read response body")?;
    match serde_json::from_str(&txt) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => bail!("{} - {}", status, txt),
        Err(e) => Err(e).context("Parsing response json"),
    }
}

/// Client for the image forensics service.
pub struct ForensicsClient<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl ForensicsClient {
    /// Create a client that talks HTTP to `config.base_url()`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(ForensicsClient { config, transport })
    }
}

impl<T: Transport> ForensicsClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        ForensicsClient { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET /health.
    pub fn check_health(&self) -> Envelope {
        let url = self.config.endpoint("/health");
        debug!(%url, "checking service health");
        settle("health", self.transport.get(&url))
    }

    /// Upload one image to /metadata under the `image` field.
    pub fn extract_metadata(&self, path: impl AsRef<Path>) -> Envelope {
        self.upload_single("metadata", "/metadata", path.as_ref())
    }

    /// Upload several images to /metadata/batch under repeated `images[]`
    /// fields. Every path is checked before anything is opened or sent.
    pub fn batch_extract_metadata<P: AsRef<Path>>(&self, paths: &[P]) -> Envelope {
        if let Some(missing) = paths.iter().map(AsRef::as_ref).find(|p| !p.exists()) {
            return missing_file(missing);
        }

        // collect stops at the first failure and drops what was already opened
        let uploads = paths
            .iter()
            .map(|p| FileUpload::open(BATCH_IMAGE_FIELD, p.as_ref()))
            .collect::<Result<Vec<_>>>();

        let url = self.config.endpoint("/metadata/batch");
        let result = uploads.and_then(|uploads| {
            debug!(%url, files = uploads.len(), "uploading batch");
            self.transport.post_files(&url, uploads)
        });
        settle("batch", result)
    }

    /// Upload one image to /forensics under the `image` field.
    pub fn analyze_forensics(&self, path: impl AsRef<Path>) -> Envelope {
        self.upload_single("forensics", "/forensics", path.as_ref())
    }

    fn upload_single(&self, action: &str, endpoint: &str, path: &Path) -> Envelope {
        if !path.exists() {
            return missing_file(path);
        }

        let url = self.config.endpoint(endpoint);
        let result = FileUpload::open(IMAGE_FIELD, path).and_then(|upload| {
            debug!(%url, file = %upload.file_name, bytes = upload.length, "uploading image");
            self.transport.post_files(&url, vec![upload])
        });
        settle(action, result)
    }
}

fn missing_file(path: &Path) -> Envelope {
    warn!(path = %path.display(), "image file does not exist");
    Envelope::error(format!("file not found: {}", path.display()))
}

fn settle(action: &str, result: Result<Value>) -> Envelope {
    match result {
        Ok(value) => Envelope::from(value),
        Err(e) => {
            let message = format!("{e:#}");
            warn!(action, error = %message, "request failed");
            Envelope::error(message)
        }
    }
}
