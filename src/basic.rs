use crate::error::{Error, Result};
use log::debug;
use s3::{creds::Credentials, region::Region, Bucket};

pub const DEFAULT_REGION: &str = "us-east-1";

/// Resolves the credentials used to sign requests.
pub trait CredentialResolver {
    fn resolve(&self) -> Result<Credentials>;
}

/// Default provider chain: environment, shared profile, then instance metadata.
#[derive(Debug, Default)]
pub struct AmbientCredentials;

impl CredentialResolver for AmbientCredentials {
    fn resolve(&self) -> Result<Credentials> {
        let credentials = Credentials::default().map_err(|err| Error::Credentials(err.into()))?;
        debug!("resolved ambient credentials");
        Ok(credentials)
    }
}

#[derive(Debug)]
pub struct StaticCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl StaticCredentials {
    pub fn new(
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            session_token,
        }
    }
}

impl CredentialResolver for StaticCredentials {
    fn resolve(&self) -> Result<Credentials> {
        Credentials::new(
            Some(self.access_key_id.as_str()),
            Some(self.secret_access_key.as_str()),
            None,
            self.session_token.as_deref(),
            None,
        )
        .map_err(|err| Error::Credentials(err.into()))
    }
}

#[derive(Debug, Clone)]
pub struct SignerParams {
    pub bucket: String,
    pub key: String,
    pub region: String,
    /// Custom endpoint such as a MinIO server; overrides the AWS endpoint for `region`.
    pub endpoint: Option<String>,
    pub path_style: bool,
}

impl SignerParams {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            path_style: false,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(Error::MissingArgument("bucket"));
        }
        if self.key.is_empty() {
            return Err(Error::MissingArgument("key"));
        }
        Ok(())
    }

    fn region(&self) -> Result<Region> {
        match &self.endpoint {
            Some(endpoint) if !endpoint.is_empty() => Ok(Region::Custom {
                region: self.region.clone(),
                endpoint: endpoint.clone(),
            }),
            // unknown names parse as a custom endpoint named after the region
            _ => match self.region.parse::<Region>() {
                Ok(Region::Custom { .. }) => Err(Error::Region(format!(
                    "unknown region {}, pass --endpoint for non-aws storage",
                    self.region
                ))),
                Ok(region) => Ok(region),
                Err(err) => Err(Error::Region(format!("{}: {}", self.region, err))),
            },
        }
    }
}

pub fn open_bucket(params: &SignerParams, credentials: Credentials) -> Result<Box<Bucket>> {
    let region = params.region()?;
    debug!("opening bucket {} in region {}", params.bucket, region);
    let mut bucket = Bucket::new(&params.bucket, region, credentials)?;
    if params.path_style {
        bucket = bucket.with_path_style();
    }
    Ok(bucket)
}
