use crate::error::{Error, Result};
use log::{debug, info, warn};
use reqwest::header::CONTENT_LENGTH;
use std::path::Path;
use url::Url;

#[derive(Debug)]
pub struct UploadResponse {
    pub status: u16,
    pub content_length: u64,
    pub body: String,
}

/// PUTs the file at `file_path` to `url`, streaming it from disk with an
/// exact `Content-Length`.
///
/// Any HTTP status is returned as a response; only local and transport
/// failures are errors. The file is checked before the url, so a missing
/// file never reaches the network.
pub async fn put_file(
    client: &reqwest::Client,
    file_path: &Path,
    url: &str,
) -> Result<UploadResponse> {
    let file = tokio::fs::File::open(file_path)
        .await
        .map_err(|err| Error::file(file_path, err))?;
    let content_length = file
        .metadata()
        .await
        .map_err(|err| Error::file(file_path, err))?
        .len();
    let url = Url::parse(url).map_err(|source| Error::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    debug!(
        "put {} ({} bytes) to {}",
        file_path.display(),
        content_length,
        url.host_str().unwrap_or_default()
    );

    let response = client
        .put(url)
        .header(CONTENT_LENGTH, content_length)
        .body(file)
        .send()
        .await
        .map_err(Error::Transport)?;
    let status = response.status();
    let body = response.text().await.map_err(Error::ResponseRead)?;
    if status.is_success() {
        info!("put {} finished: {}", file_path.display(), status);
    } else {
        warn!("put {} returned {}", file_path.display(), status);
    }
    Ok(UploadResponse {
        status: status.as_u16(),
        content_length,
        body,
    })
}
