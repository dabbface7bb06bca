use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tessera_core::models::{FileDescriptor, Resource, ResourceStatus};
use tessera_core::{AppError, Config};

use super::ContentHandler;
use crate::content::{ContentData, ResolvedContent, UriReference, CONTENT_TYPE_URI};
use crate::ssrf::validate_outbound_uri;

/// How submitted http(s) URIs are checked before they are attached.
#[derive(Debug, Clone)]
pub struct UriCheckOptions {
    /// Send a HEAD request to confirm the URI is reachable.
    pub check_enabled: bool,
    pub timeout: Duration,
    pub allow_private_hosts: bool,
    pub allowlist: Option<Vec<String>>,
}

impl Default for UriCheckOptions {
    fn default() -> Self {
        Self {
            check_enabled: true,
            timeout: Duration::from_secs(10),
            allow_private_hosts: false,
            allowlist: None,
        }
    }
}

impl UriCheckOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            check_enabled: config.uri_check_enabled(),
            timeout: config.uri_check_timeout(),
            allow_private_hosts: config.uri_allow_private_hosts(),
            allowlist: config.url_upload_allowlist().map(<[String]>::to_vec),
        }
    }
}

/// What the availability check learned about a URI.
struct Probe {
    mime: Option<String>,
    bytes: Option<u64>,
}

fn guess_mime(uri: &UriReference) -> String {
    let path = reqwest::Url::parse(&uri.raw)
        .map(|u| u.path().to_string())
        .unwrap_or_default();
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Attaches a directly downloadable http(s) URI as the original representation.
pub struct HttpUriHandler {
    client: reqwest::Client,
    options: UriCheckOptions,
}

impl HttpUriHandler {
    pub fn new(options: UriCheckOptions) -> Result<Self, AppError> {
        // Redirects are not followed: their targets would skip the outbound checks.
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, options })
    }

    async fn probe(&self, uri: &UriReference) -> Result<Probe, AppError> {
        validate_outbound_uri(
            &uri.raw,
            self.options.allow_private_hosts,
            self.options.allowlist.as_deref(),
        )
        .await
        .map_err(|reason| {
            AppError::Unprocessable(format!("The uri {} is not allowed: {}", uri.raw, reason))
        })?;

        let response = self.client.head(&uri.raw).send().await.map_err(|e| {
            tracing::debug!(uri = %uri.raw, error = %e, "URI availability check failed");
            AppError::Unprocessable(format!("The uri {} is not reachable.", uri.raw))
        })?;

        let status = response.status();
        if !status.is_success() && !status.is_redirection() {
            return Err(AppError::Unprocessable(format!(
                "The uri {} responded with status {}.",
                uri.raw,
                status.as_u16()
            )));
        }

        let headers = response.headers();
        let mime = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty());
        // Read the header directly; HEAD responses have no body to size.
        let bytes = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        Ok(Probe { mime, bytes })
    }
}

#[async_trait]
impl ContentHandler for HttpUriHandler {
    fn name(&self) -> &'static str {
        "http_uri"
    }

    async fn try_handle(
        &self,
        resource: &mut Resource,
        content: &ResolvedContent,
    ) -> Result<bool, AppError> {
        let ContentData::Uri(uri) = &content.data else {
            return Ok(false);
        };
        if !content.is(CONTENT_TYPE_URI) || !uri.is_http() {
            return Ok(false);
        }

        let probe = if self.options.check_enabled {
            self.probe(uri).await?
        } else {
            Probe {
                mime: None,
                bytes: None,
            }
        };

        let mime = probe.mime.unwrap_or_else(|| guess_mime(uri));
        let mut descriptor = FileDescriptor::original(uri.raw.clone(), mime);
        descriptor.bytes = probe.bytes;

        resource.content_mut().files.push(descriptor);
        resource.status = ResourceStatus::Normal;

        tracing::debug!(resource_id = %resource.id, uri = %uri.raw, "Attached remote uri");

        Ok(true)
    }
}
