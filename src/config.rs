use std::str::FromStr;

use rusoto_core::{Client, HttpClient, Region};
use rusoto_credential::DefaultCredentialsProvider;
use rusoto_s3::S3Client;
use tracing::debug;

use crate::ecr::EcrAuth;
use crate::error::{Error, Result};

/// Overrides the service endpoint, e.g. for S3-compatible stores.
pub const ENDPOINT_ENV: &str = "AWS_ENDPOINT_URL";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub region: Region,
}

impl ClientConfig {
    /// Region from `region_override`, falling back to the environment, with the
    /// custom endpoint from `AWS_ENDPOINT_URL` if set.
    pub fn resolve(region_override: Option<&str>) -> Result<Self> {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|endpoint| !endpoint.is_empty());
        Self::with_endpoint(region_override, endpoint)
    }

    pub fn with_endpoint(region_override: Option<&str>, endpoint: Option<String>) -> Result<Self> {
        let region = match region_override {
            Some(name) => Region::from_str(name)
                .map_err(|e| Error::Config(format!("invalid region '{}': {}", name, e)))?,
            None => Region::default(),
        };

        let region = match endpoint {
            Some(endpoint) => Region::Custom {
                name: region.name().to_owned(),
                endpoint,
            },
            None => region,
        };

        debug!(region = region.name(), "resolved client region");
        Ok(Self { region })
    }

    pub fn s3_client(&self) -> Result<S3Client> {
        Ok(S3Client::new_with(
            http_client()?,
            credentials_provider()?,
            self.region.clone(),
        ))
    }

    pub fn ecr_auth(&self) -> Result<EcrAuth> {
        let client = Client::new_with(credentials_provider()?, http_client()?);
        Ok(EcrAuth::new(client, self.region.clone()))
    }
}

fn http_client() -> Result<HttpClient> {
    HttpClient::new().map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))
}

fn credentials_provider() -> Result<DefaultCredentialsProvider> {
    DefaultCredentialsProvider::new()
        .map_err(|e| Error::Config(format!("failed to load credentials: {}", e)))
}
