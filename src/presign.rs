use crate::basic::{open_bucket, CredentialResolver, SignerParams};
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Validity window of every generated URL.
pub const PRESIGNED_URL_EXPIRY_SECS: u32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Generates a presigned PUT url for `params.bucket`/`params.key`.
///
/// Credentials are resolved once through `resolver`; the signing itself is
/// local and does not contact the storage service.
///
/// # Errors
///
/// * `Error::MissingArgument` if bucket or key is empty
/// * `Error::Credentials` if the resolver fails
/// * `Error::Region` if the region is unknown and no endpoint is set
/// * `Error::Signing` if the bucket handle or the signature cannot be built
pub async fn presign_put(
    params: &SignerParams,
    resolver: &dyn CredentialResolver,
) -> Result<PresignedUrl> {
    params.validate()?;
    let credentials = resolver.resolve()?;
    let bucket = open_bucket(params, credentials)?;
    let signed_at = Utc::now();
    let url = bucket
        .presign_put(&params.key, PRESIGNED_URL_EXPIRY_SECS, None, None)
        .await?;
    let expires_at = signed_at + Duration::seconds(i64::from(PRESIGNED_URL_EXPIRY_SECS));
    info!("presigned put for {}/{}", params.bucket, params.key);
    debug!("presigned url expires at {}", expires_at);
    Ok(PresignedUrl { url, expires_at })
}
