//! S3-compatible file storage for the courseware client
//!
//! Uploads course material and case attachments into a single bucket and
//! hands back the public URL that the backend stores alongside the record.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, PayloadChecksumKind, PercentEncodingMode, SignableBody, SignableRequest, SigningParams,
    SigningSettings, UriPathNormalizationMode,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use bytes::Bytes;
use reqwest::Client;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use url::Url;
use uuid::Uuid;

/// Result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Folder used when the caller does not name one
pub const DEFAULT_FOLDER: &str = "courses";

/// Cache-Control value sent with every upload (one hour)
pub const CACHE_CONTROL: &str = "3600";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const FALLBACK_PROJECT_REF: &str = "project_ref";
const DEFAULT_REGION: &str = "auto";
const SIGNING_SERVICE: &str = "s3";
const CREDENTIALS_PROVIDER: &str = "courseware-storage";

/// Error type
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to upload file. Please try again.")]
    UploadFailed,

    #[error("Failed to delete file.")]
    DeleteFailed,

    #[error("Invalid file URL: {0}")]
    InvalidUrl(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request signing failed: {0}")]
    Signing(String),
}

/// Connection settings for the S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3Options {
    /// Access key
    pub access_key_id: String,
    /// Secret key
    pub secret_access_key: String,
    /// Region, "auto" when unset
    pub region: Option<String>,
    /// Endpoint URL, e.g. `https://<project>.storage.supabase.co/storage/v1/s3`
    pub endpoint: String,
    /// Bucket every object is written to
    pub bucket: String,
    /// Path-style addressing (`<endpoint>/<bucket>/<key>`), on by default
    pub force_path_style: Option<bool>,
    /// Host that serves public objects, prefixed with the project ref
    pub public_host: String,
}

impl Default for S3Options {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: Some(DEFAULT_REGION.to_string()),
            endpoint: String::new(),
            bucket: String::new(),
            force_path_style: Some(true),
            public_host: "supabase.co".to_string(),
        }
    }
}

impl S3Options {
    /// Read the options from `STORAGE_*` environment variables
    pub fn from_env() -> Result<Self> {
        fn var(name: &str) -> Result<String> {
            std::env::var(name)
                .map_err(|_| StorageError::Config(format!("{} environment variable not found", name)))
        }

        Ok(Self {
            access_key_id: var("STORAGE_ACCESS_KEY_ID")?,
            secret_access_key: var("STORAGE_SECRET_ACCESS_KEY")?,
            region: std::env::var("STORAGE_REGION").ok(),
            endpoint: var("STORAGE_ENDPOINT")?,
            bucket: var("STORAGE_BUCKET_NAME")?,
            ..Self::default()
        })
    }

    /// Set the public host
    pub fn with_public_host(mut self, host: &str) -> Self {
        self.public_host = host.to_string();
        self
    }

    /// Set path-style addressing
    pub fn with_force_path_style(mut self, value: bool) -> Self {
        self.force_path_style = Some(value);
        self
    }
}

/// A file handed to the uploader
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original file name, only its extension is kept
    pub name: String,
    /// File contents
    pub data: Bytes,
}

impl FileUpload {
    pub fn new(name: &str, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.to_string(),
            data: data.into(),
        }
    }
}

/// Storage backend used by the client for attachments
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload a file and return its public URL
    async fn upload(&self, file: FileUpload, folder: Option<&str>) -> Result<String>;

    /// Delete a file given the public URL returned by `upload`
    async fn delete(&self, url: &str) -> Result<()>;
}

/// Content type for a file name, judged by its extension
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return FALLBACK_CONTENT_TYPE,
    };

    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// Build a collision-resistant object key: `<folder>/<millis>-<random>.<ext>`
pub fn object_key(file_name: &str, folder: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let random: String = Uuid::new_v4().simple().to_string().chars().take(13).collect();

    let file_name = match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{}-{}.{}", timestamp, random, ext),
        _ => format!("{}-{}", timestamp, random),
    };

    if folder.is_empty() {
        file_name
    } else {
        format!("{}/{}", folder.trim_end_matches('/'), file_name)
    }
}

async fn read_local(file_path: &Path) -> Result<Vec<u8>> {
    let mut contents = Vec::new();
    File::open(file_path)
        .await?
        .read_to_end(&mut contents)
        .await?;
    Ok(contents)
}

/// Uploader for a single bucket on an S3-compatible endpoint
pub struct StorageUploader {
    options: S3Options,
    http_client: Client,
}

impl StorageUploader {
    /// Create a new uploader
    pub fn new(options: S3Options, http_client: Client) -> Self {
        log::debug!(
            "storage uploader for bucket '{}' (region {})",
            options.bucket,
            options.region.as_deref().unwrap_or(DEFAULT_REGION)
        );
        Self {
            options,
            http_client,
        }
    }

    /// The configured bucket
    pub fn bucket(&self) -> &str {
        &self.options.bucket
    }

    /// Public URL of an object key. Built locally, the object is not checked.
    pub fn public_url(&self, key: &str) -> String {
        let project_ref = Url::parse(&self.options.endpoint)
            .ok()
            .and_then(|url| {
                url.host_str()
                    .and_then(|host| host.split('.').next())
                    .map(str::to_string)
            })
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| FALLBACK_PROJECT_REF.to_string());

        format!(
            "https://{}.{}/storage/v1/object/public/{}/{}",
            project_ref, self.options.public_host, self.options.bucket, key
        )
    }

    /// Recover the object key from a public URL
    pub fn key_from_public_url(&self, file_url: &str) -> Result<String> {
        let marker = format!("/public/{}/", self.options.bucket);
        match file_url.split_once(&marker) {
            Some((_, key)) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(StorageError::InvalidUrl(file_url.to_string())),
        }
    }

    fn object_url(&self, key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.options.endpoint)?;
        let base_path = url.path().trim_end_matches('/').to_string();

        if self.options.force_path_style.unwrap_or(true) {
            url.set_path(&format!("{}/{}/{}", base_path, self.options.bucket, key));
        } else {
            let host = url
                .host_str()
                .ok_or_else(|| StorageError::Config("endpoint has no host".to_string()))?
                .to_string();
            url.set_host(Some(&format!("{}.{}", self.options.bucket, host)))?;
            url.set_path(&format!("{}/{}", base_path, key));
        }

        Ok(url)
    }

    fn region(&self) -> &str {
        self.options.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    /// SigV4 headers (`authorization`, `x-amz-date`, `x-amz-content-sha256`) for a request
    fn sign_request(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<(String, String)>> {
        let identity: Identity = Credentials::new(
            &self.options.access_key_id,
            &self.options.secret_access_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        )
        .into();

        let mut settings = SigningSettings::default();
        settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;
        settings.percent_encoding_mode = PercentEncodingMode::Single;
        settings.uri_path_normalization_mode = UriPathNormalizationMode::Disabled;

        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(self.region())
            .name(SIGNING_SERVICE)
            .time(SystemTime::now())
            .settings(settings)
            .build()
            .map_err(|err| StorageError::Signing(err.to_string()))?
            .into();

        let request = SignableRequest::new(
            method,
            url.as_str(),
            headers.iter().copied(),
            SignableBody::Bytes(body),
        )
        .map_err(|err| StorageError::Signing(err.to_string()))?;

        let (instructions, _signature) = sign(request, &params)
            .map_err(|err| StorageError::Signing(err.to_string()))?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    /// Put raw bytes at a key
    pub async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        let url = self.object_url(key)?;
        let headers = [("content-type", content_type), ("cache-control", CACHE_CONTROL)];
        let signed = self.sign_request("PUT", &url, &headers, &data)?;

        let mut request = self.http_client.put(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        for (name, value) in signed {
            request = request.header(name, value);
        }

        let response = request.body(data).send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StorageError::ApiError(error_text));
        }

        Ok(())
    }

    /// Delete the object at a key
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        let url = self.object_url(key)?;
        let signed = self.sign_request("DELETE", &url, &[], &[])?;

        let mut request = self.http_client.delete(url);
        for (name, value) in signed {
            request = request.header(name, value);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StorageError::ApiError(error_text));
        }

        Ok(())
    }

    /// Upload a file into `folder` (`"courses"` when `None`) and return its public URL.
    ///
    /// Every failure is reported as [`StorageError::UploadFailed`]; the cause is logged.
    pub async fn upload(&self, file: FileUpload, folder: Option<&str>) -> Result<String> {
        let key = object_key(&file.name, folder.unwrap_or(DEFAULT_FOLDER));
        let content_type = content_type_for(&file.name);

        match self.put_object(&key, file.data, content_type).await {
            Ok(()) => Ok(self.public_url(&key)),
            Err(err) => {
                log::error!("Error uploading '{}' to storage: {}", file.name, err);
                Err(StorageError::UploadFailed)
            }
        }
    }

    /// Read a local file and upload it
    pub async fn upload_path(&self, file_path: &Path, folder: Option<&str>) -> Result<String> {
        let name = file_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());

        let contents = match read_local(file_path).await {
            Ok(contents) => contents,
            Err(err) => {
                log::error!("Error reading '{}' for upload: {}", file_path.display(), err);
                return Err(StorageError::UploadFailed);
            }
        };

        self.upload(FileUpload::new(&name, contents), folder).await
    }

    /// Delete a file by its public URL.
    ///
    /// Every failure is reported as [`StorageError::DeleteFailed`]; the cause is logged.
    pub async fn delete(&self, file_url: &str) -> Result<()> {
        let result = match self.key_from_public_url(file_url) {
            Ok(key) => self.delete_object(&key).await,
            Err(err) => Err(err),
        };

        result.map_err(|err| {
            log::error!("Error deleting '{}' from storage: {}", file_url, err);
            StorageError::DeleteFailed
        })
    }
}

#[async_trait]
impl ObjectStorage for StorageUploader {
    async fn upload(&self, file: FileUpload, folder: Option<&str>) -> Result<String> {
        StorageUploader::upload(self, file, folder).await
    }

    async fn delete(&self, url: &str) -> Result<()> {
        StorageUploader::delete(self, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, header_regex, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uploader(endpoint: &str) -> StorageUploader {
        let options = S3Options {
            access_key_id: "access".to_string(),
            secret_access_key: "SUPERSECRET".to_string(),
            endpoint: endpoint.to_string(),
            bucket: "materials".to_string(),
            ..S3Options::default()
        };
        StorageUploader::new(options, Client::new())
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("report.pdf"), "application/pdf");
        assert_eq!(content_type_for("Photo.JPG"), "image/jpeg");
        assert_eq!(
            content_type_for("notes.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(content_type_for("archive.tar.gz"), "application/octet-stream");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }

    #[test]
    fn test_object_key_format() {
        let key = object_key("report.pdf", "cases");
        let rest = key.strip_prefix("cases/").expect("folder prefix");
        let (stem, ext) = rest.rsplit_once('.').expect("extension");
        assert_eq!(ext, "pdf");

        let (timestamp, random) = stem.split_once('-').expect("separator");
        assert!(timestamp.parse::<i64>().is_ok());
        assert_eq!(random.len(), 13);

        assert_ne!(object_key("report.pdf", "cases"), key);
    }

    #[test]
    fn test_object_key_without_folder_or_extension() {
        let key = object_key("README", "");
        assert!(!key.contains('/'));
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_public_url_uses_project_ref() {
        let uploader = uploader("https://abcdef.storage.supabase.co/storage/v1/s3");
        assert_eq!(
            uploader.public_url("courses/1-x.pdf"),
            "https://abcdef.supabase.co/storage/v1/object/public/materials/courses/1-x.pdf"
        );
    }

    #[test]
    fn test_key_from_public_url() {
        let uploader = uploader("https://abcdef.storage.supabase.co/storage/v1/s3");
        let url = uploader.public_url("cases/1-abc.pdf");
        assert_eq!(uploader.key_from_public_url(&url).unwrap(), "cases/1-abc.pdf");

        let result = uploader.key_from_public_url("https://example.com/files/1-abc.pdf");
        assert!(matches!(result, Err(StorageError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_upload_puts_object_and_returns_public_url() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path_regex(r"^/materials/cases/\d+-[0-9a-f]{13}\.pdf$"))
            .and(header("Content-Type", "application/pdf"))
            .and(header("Cache-Control", "3600"))
            .and(header_regex(
                "Authorization",
                r"^AWS4-HMAC-SHA256 Credential=access/\d{8}/auto/s3/aws4_request, SignedHeaders=\S+, Signature=[0-9a-f]{64}$",
            ))
            .and(header_exists("x-amz-date"))
            .and(header_exists("x-amz-content-sha256"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let uploader = uploader(&mock_server.uri());
        let url = uploader
            .upload(FileUpload::new("report.pdf", b"%PDF-1.4".to_vec()), Some("cases"))
            .await
            .unwrap();

        let key = uploader.key_from_public_url(&url).unwrap();
        assert!(key.starts_with("cases/"));
        assert!(key.ends_with(".pdf"));
        assert!(url.contains(&format!("/storage/v1/object/public/materials/{}", key)));
    }

    #[tokio::test]
    async fn test_requests_are_signed_without_exposing_secret() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let options = S3Options {
            access_key_id: "AKID".to_string(),
            secret_access_key: "SUPERSECRET".to_string(),
            region: Some("eu-central-1".to_string()),
            endpoint: mock_server.uri(),
            bucket: "materials".to_string(),
            ..S3Options::default()
        };
        let uploader = StorageUploader::new(options, Client::new());

        let url = uploader
            .upload(FileUpload::new("report.pdf", b"%PDF-1.4".to_vec()), Some("cases"))
            .await
            .unwrap();
        uploader.delete(&url).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            let headers = format!("{:?}", request.headers);
            assert!(!headers.contains("SUPERSECRET"), "secret leaked: {}", headers);
            assert!(!headers.contains("apikey"));
            assert!(headers.contains("AWS4-HMAC-SHA256 Credential=AKID/"));
            assert!(headers.contains("/eu-central-1/s3/aws4_request"));
            assert!(headers.contains("x-amz-date"));
        }
    }

    #[tokio::test]
    async fn test_read_local_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_local(&dir.path().join("missing.pdf")).await;
        assert!(matches!(result, Err(StorageError::IoError(_))));
    }

    #[tokio::test]
    async fn test_upload_defaults_to_courses_folder() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path_regex(r"^/materials/courses/.+\.txt$"))
            .and(header("Content-Type", "text/plain"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let uploader = uploader(&mock_server.uri());
        let url = uploader
            .upload(FileUpload::new("notes.txt", "hello"), None)
            .await
            .unwrap();
        assert!(url.contains("/materials/courses/"));
    }

    #[tokio::test]
    async fn test_upload_failure_is_generic() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
            .mount(&mock_server)
            .await;

        let uploader = uploader(&mock_server.uri());
        let result = uploader
            .upload(FileUpload::new("report.pdf", b"data".to_vec()), Some("cases"))
            .await;

        match result {
            Err(err @ StorageError::UploadFailed) => {
                assert_eq!(err.to_string(), "Failed to upload file. Please try again.");
            }
            other => panic!("Expected UploadFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_path_reads_local_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path_regex(r"^/materials/courses/.+\.png$"))
            .and(header("Content-Type", "image/png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("diagram.png");
        std::fs::write(&file_path, [0x89, 0x50, 0x4e, 0x47]).unwrap();

        let uploader = uploader(&mock_server.uri());
        let url = uploader.upload_path(&file_path, None).await.unwrap();
        assert!(url.ends_with(".png"));

        let missing = uploader
            .upload_path(&dir.path().join("missing.png"), None)
            .await;
        assert!(matches!(missing, Err(StorageError::UploadFailed)));
    }

    #[tokio::test]
    async fn test_delete_parses_key_from_url() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/materials/cases/1700000000000-abc.pdf"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let uploader = uploader(&mock_server.uri());
        let url = uploader.public_url("cases/1700000000000-abc.pdf");
        uploader.delete(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_rejects_foreign_url() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&mock_server)
            .await;

        let uploader = uploader(&mock_server.uri());
        let result = uploader.delete("https://example.com/uploads/file.pdf").await;
        assert!(matches!(result, Err(StorageError::DeleteFailed)));
    }
}
