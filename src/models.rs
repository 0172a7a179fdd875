use serde::Deserialize;

/// Reply from the token endpoint.
///
/// A reply without a `token` field decodes to an empty string rather than an
/// error, so an empty token after a successful authentication is the caller's
/// signal that the issuer refused the scope.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent registry requests
    #[serde(default)]
    pub token: String,
}

/// Legacy (schema1) image manifest, reduced to its layer list.
///
/// The newer OCI / Docker schema2 manifest formats with typed layer
/// descriptors are out of scope for this client.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Layer entries, outer-most layer first. Absent in the wire form
    /// decodes as empty.
    #[serde(rename = "fsLayers", default)]
    pub fs_layers: Vec<FsLayer>,
}

/// A single layer entry of a legacy manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct FsLayer {
    /// Content digest identifying the layer blob
    #[serde(rename = "blobSum")]
    pub blob_sum: String,
}
