//! presign an s3 PUT url and upload a local file through it
use flexi_logger::{FileSpec, Logger, LoggerHandle};
use log::info;
use std::path::{Path, PathBuf};

pub mod basic;
pub mod error;
pub mod presign;
pub mod upload;

pub use basic::{AmbientCredentials, CredentialResolver, SignerParams, StaticCredentials};
pub use error::{Error, Result};
pub use presign::{presign_put, PresignedUrl, PRESIGNED_URL_EXPIRY_SECS};
pub use upload::{put_file, UploadResponse};

/// Start the logger, run this before any other functions.
/// Logs go to stderr unless `log_path` is set; stdout is left to the command output.
/// The returned handle must be kept alive for the lifetime of the program.
pub fn init_logger(log_path: Option<&Path>, verbose: bool) -> Result<LoggerHandle> {
    let level = if verbose { "debug" } else { "warn" };
    let mut logger = Logger::try_with_env_or_str(level)?;
    if let Some(dir) = log_path {
        logger = logger.log_to_file(
            FileSpec::default()
                .directory(dir)
                .basename("s3-presign-put"),
        );
    }
    Ok(logger.start()?)
}

/// What a single invocation does.
#[derive(Debug, Clone)]
pub enum Operation {
    GenerateUrl { params: SignerParams },
    Upload { url: String, file: PathBuf },
    GenerateAndUpload { params: SignerParams, file: PathBuf },
}

#[derive(Debug)]
pub enum Outcome {
    Presigned(PresignedUrl),
    Uploaded(UploadResponse),
}

/// Runs `operation` to completion. The signed url of `GenerateAndUpload`
/// flows straight into the upload.
pub async fn execute(
    operation: Operation,
    resolver: &dyn CredentialResolver,
    client: &reqwest::Client,
) -> Result<Outcome> {
    match operation {
        Operation::GenerateUrl { params } => {
            let presigned = presign_put(&params, resolver).await?;
            Ok(Outcome::Presigned(presigned))
        }
        Operation::Upload { url, file } => {
            let response = put_file(client, &file, &url).await?;
            Ok(Outcome::Uploaded(response))
        }
        Operation::GenerateAndUpload { params, file } => {
            let presigned = presign_put(&params, resolver).await?;
            info!("uploading {} to {}/{}", file.display(), params.bucket, params.key);
            let response = put_file(client, &file, &presigned.url).await?;
            Ok(Outcome::Uploaded(response))
        }
    }
}
