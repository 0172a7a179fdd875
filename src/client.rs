use std::path::Path;

use bytes::Bytes;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::{header, Client as ReqwestClient};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::error::Result;
use crate::models::{AuthResponse, Manifest};

/// Default token issuer for Docker Hub.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://auth.docker.io/token";

/// Service name presented to the default token issuer.
pub const DEFAULT_SERVICE: &str = "registry.docker.io";

/// Blob byte stream handed to and returned by the transform passed to
/// [`Session::download_layer`].
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// A pull session for a single repository in a Docker Registry v2.
///
/// The caller owns the session and drives it sequentially: [`authenticate`]
/// obtains a pull-scoped bearer token (the only mutation on the session),
/// [`fetch_layers`] lists the layer digests of the `latest` manifest, and
/// [`download_layer`] streams one blob to a file. An expired or empty token
/// is not detected here; it surfaces as an authorization failure on the next
/// registry request.
///
/// [`authenticate`]: Session::authenticate
/// [`fetch_layers`]: Session::fetch_layers
/// [`download_layer`]: Session::download_layer
pub struct Session {
    registry: String,
    repository: String,
    token: String,
    token_endpoint: String,
    service: String,
    client: ReqwestClient,
}

impl Session {
    /// Create a session that authenticates against Docker Hub's token issuer.
    ///
    /// `registry` is the base URL including the API prefix (for Docker Hub,
    /// `https://registry-1.docker.io/v2`); `repository` is the image path
    /// (e.g. `library/alpine`).
    pub fn new(registry: String, repository: String) -> Self {
        Self::with_token_endpoint(
            registry,
            repository,
            DEFAULT_TOKEN_ENDPOINT.to_string(),
            DEFAULT_SERVICE.to_string(),
        )
    }

    /// Create a session that gets its tokens from a non-default issuer.
    pub fn with_token_endpoint(
        registry: String,
        repository: String,
        token_endpoint: String,
        service: String,
    ) -> Self {
        Self {
            registry,
            repository,
            token: String::new(),
            token_endpoint,
            service,
            client: ReqwestClient::new(),
        }
    }

    /// The bearer token obtained by [`Session::authenticate`]; empty until
    /// the first successful call.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Exchange the repository's pull scope for a bearer token and store it
    /// on the session.
    ///
    /// The token endpoint reply is decoded regardless of HTTP status, and a
    /// reply without a `token` field leaves the session with an empty token
    /// rather than returning an error. Callers that need the distinction
    /// must check [`Session::token`] afterwards.
    pub async fn authenticate(&mut self) -> Result<()> {
        let scope = format!("repository:{}:pull", self.repository);
        debug!("requesting pull token for scope {}", scope);

        let response = self
            .client
            .get(&self.token_endpoint)
            .query(&[("service", self.service.as_str()), ("scope", scope.as_str())])
            .send()
            .await?;
        let contents = response.bytes().await?;

        let auth: AuthResponse = serde_json::from_slice(&contents)?;
        self.token = auth.token;
        Ok(())
    }

    /// Fetch the `latest` manifest and return its layer digests in manifest
    /// order (outer-most layer first).
    ///
    /// Only the legacy `fsLayers` manifest schema is understood; a manifest
    /// without that list yields an empty vector. Every call re-fetches the
    /// manifest, there is no caching.
    pub async fn fetch_layers(&self) -> Result<Vec<String>> {
        let url = format!("{}/{}/manifests/latest", self.registry, self.repository);
        let contents = self.fetch(&url).await?;

        let manifest: Manifest = serde_json::from_slice(&contents)?;
        let layers = manifest
            .fs_layers
            .into_iter()
            .map(|layer| layer.blob_sum)
            .collect();
        Ok(layers)
    }

    /// Download the blob identified by `digest` into the file at `target`,
    /// routing the byte stream through the caller-supplied `proxy`.
    ///
    /// The proxy receives the raw response stream as an [`AsyncRead`] and
    /// returns the reader to copy from, so callers can wrap it for progress
    /// metering, hashing, or on-the-fly decompression; pass `|reader| reader`
    /// for a plain copy.
    ///
    /// The target file is created if absent and written from the start
    /// without truncation. All failures are returned as recoverable errors;
    /// a failed copy leaves a partially written file at `target`, and there
    /// is no resume support. The downloaded bytes are not verified against
    /// `digest` — integrity checking, if needed, belongs in the proxy or the
    /// caller.
    pub async fn download_layer<P>(
        &self,
        digest: &str,
        target: impl AsRef<Path>,
        proxy: P,
    ) -> Result<()>
    where
        P: FnOnce(BlobReader) -> BlobReader,
    {
        let target = target.as_ref();
        let mut out = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(target)
            .await?;

        let url = format!("{}/{}/blobs/{}", self.registry, self.repository, digest);
        debug!("downloading blob {} to {}", digest, target.display());

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
            .boxed();
        let mut reader = proxy(Box::new(StreamReader::new(stream)));

        let written = tokio::io::copy(&mut reader, &mut out).await?;
        debug!("wrote {} bytes to {}", written, target.display());
        Ok(())
    }

    /// GET `url` with the session's bearer token, buffering the full body.
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;
        Ok(response.bytes().await?)
    }
}
