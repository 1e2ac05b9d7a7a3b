use crate::asset::{CompressionResponse, SourceFile};
use crate::config::{ClientConfig, Parameters};
use crate::constants::{COMPRESS_ENDPOINT, IMAGE_FIELD, QUALITY_FIELD, SCALE_FIELD};
use crate::error::{Result, SessionError};
use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use url::Url;

/// One submission to the compression service. Built per selection and
/// consumed by the call.
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    pub source: SourceFile,
    pub scale_percent: i32,
    pub quality: i32,
}

impl CompressionRequest {
    pub fn new(source: SourceFile, parameters: Parameters) -> Self {
        Self {
            source,
            scale_percent: parameters.scale_percent,
            quality: parameters.quality,
        }
    }

    fn into_form(self) -> Result<Form> {
        let mut part =
            Part::bytes(self.source.bytes().to_vec()).file_name(self.source.name().to_string());
        if let Ok(format) = image::guess_format(self.source.bytes()) {
            part = part
                .mime_str(format.to_mime_type())
                .map_err(SessionError::from_reqwest)?;
        }

        Ok(Form::new()
            .part(IMAGE_FIELD, part)
            .text(SCALE_FIELD, self.scale_percent.to_string())
            .text(QUALITY_FIELD, self.quality.to_string()))
    }
}

/// Remote side of a compression session.
#[async_trait]
pub trait CompressionService: Send + Sync {
    async fn compress(&self, request: CompressionRequest) -> Result<CompressionResponse>;
}

/// Talks to the compression service over HTTP with a multipart upload.
#[derive(Debug, Clone)]
pub struct HttpCompressionService {
    client: Client,
    base_url: Url,
}

impl HttpCompressionService {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.backend_url)?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SessionError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn endpoint(&self) -> Result<Url> {
        // The endpoint hangs off the configured base path, not the host root
        join_url(&self.base_url, COMPRESS_ENDPOINT.trim_start_matches('/'))
    }

    /// Resolves a download link from the service, which may be relative.
    pub fn resolve(&self, link: &str) -> Result<Url> {
        join_url(&self.base_url, link)
    }

    /// Fetches the compressed file behind a returned download link.
    pub async fn download(&self, link: &str) -> Result<Bytes> {
        let url = self.resolve(link)?;
        debug!("Downloading compressed image from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SessionError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::ServiceStatus {
                status: status.as_u16(),
                body,
            });
        }

        response.bytes().await.map_err(SessionError::from_reqwest)
    }
}

#[async_trait]
impl CompressionService for HttpCompressionService {
    async fn compress(&self, request: CompressionRequest) -> Result<CompressionResponse> {
        let url = self.endpoint()?;
        debug!(
            "Submitting {} ({} bytes) to {} with scale={} quality={}",
            request.source.name(),
            request.source.len(),
            url,
            request.scale_percent,
            request.quality
        );

        let response = self
            .client
            .post(url)
            .multipart(request.into_form()?)
            .send()
            .await
            .map_err(SessionError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to get error details".to_string());
            return Err(SessionError::ServiceStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(SessionError::from_reqwest)?;
        serde_json::from_slice(&body).map_err(|e| SessionError::MalformedResponse(e.to_string()))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    // Without the trailing slash `join` would replace the last path segment
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };

    Url::parse(&normalized).map_err(|e| SessionError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

fn join_url(base: &Url, link: &str) -> Result<Url> {
    base.join(link).map_err(|e| SessionError::InvalidUrl {
        url: link.to_string(),
        reason: e.to_string(),
    })
}
