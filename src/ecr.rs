use std::fmt;
use std::io::Write;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rusoto_core::proto::json::ResponsePayload;
use rusoto_core::signature::SignedRequest;
use rusoto_core::{Client, Region, RusotoError};
use rusoto_ecr::{GetAuthorizationTokenError, GetAuthorizationTokenResponse};
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::options::{self, OptionSpec};

const GET_LOGIN_OPTIONS: [OptionSpec; 2] =
    [OptionSpec::one("region"), OptionSpec::many("registry-ids")];

const GET_AUTHORIZATION_TOKEN: &str = "GetAuthorizationToken";
const TARGET_PREFIX: &str = "AmazonEC2ContainerRegistry_V20150921";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationEntry {
    pub endpoint: String,
    pub token: String,
}

#[async_trait]
pub trait RegistryAuth: Send + Sync {
    /// One entry per requested registry, or for the default registry when
    /// `registry_ids` is empty.
    async fn authorization_tokens(&self, registry_ids: &[String])
        -> Result<Vec<AuthorizationEntry>>;
}

#[derive(Debug, Serialize)]
struct AuthorizationTokenBody {
    #[serde(rename = "registryIds", skip_serializing_if = "Vec::is_empty")]
    registry_ids: Vec<String>,
}

/// Signed `GetAuthorizationToken` call. rusoto_ecr's request type has no
/// `registryIds` member, so the body is built here and sent through the
/// core client.
pub struct EcrAuth {
    client: Client,
    region: Region,
}

impl EcrAuth {
    pub fn new(client: Client, region: Region) -> Self {
        Self { client, region }
    }
}

pub fn authorization_token_request(
    region: &Region,
    registry_ids: &[String],
) -> Result<SignedRequest> {
    let body = serde_json::to_vec(&AuthorizationTokenBody {
        registry_ids: registry_ids.to_vec(),
    })
    .map_err(|e| Error::remote(GET_AUTHORIZATION_TOKEN, e))?;

    let mut request = SignedRequest::new("POST", "ecr", region, "/");
    request.set_endpoint_prefix("api.ecr".to_string());
    request.set_content_type("application/x-amz-json-1.1".to_owned());
    request.add_header(
        "x-amz-target",
        &format!("{}.{}", TARGET_PREFIX, GET_AUTHORIZATION_TOKEN),
    );
    request.set_payload(Some(body));
    Ok(request)
}

fn authorization_entries(response: GetAuthorizationTokenResponse) -> Vec<AuthorizationEntry> {
    response
        .authorization_data
        .unwrap_or_default()
        .into_iter()
        .map(|data| AuthorizationEntry {
            endpoint: data.proxy_endpoint.unwrap_or_default(),
            token: data.authorization_token.unwrap_or_default(),
        })
        .collect()
}

#[async_trait]
impl RegistryAuth for EcrAuth {
    async fn authorization_tokens(
        &self,
        registry_ids: &[String],
    ) -> Result<Vec<AuthorizationEntry>> {
        let request = authorization_token_request(&self.region, registry_ids)?;
        debug!(registries = registry_ids.len(), "requesting authorization tokens");

        let mut response = self.client.sign_and_dispatch(request).await.map_err(|e| {
            Error::remote(
                GET_AUTHORIZATION_TOKEN,
                RusotoError::<GetAuthorizationTokenError>::from(e),
            )
        })?;
        let response = response
            .buffer()
            .await
            .map_err(|e| Error::remote(GET_AUTHORIZATION_TOKEN, e))?;

        if !response.status.is_success() {
            return Err(Error::remote(
                GET_AUTHORIZATION_TOKEN,
                GetAuthorizationTokenError::from_response(response),
            ));
        }

        let parsed = ResponsePayload::new(&response)
            .deserialize::<GetAuthorizationTokenResponse, GetAuthorizationTokenError>()
            .map_err(|e| Error::remote(GET_AUTHORIZATION_TOKEN, e))?;

        Ok(authorization_entries(parsed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub endpoint: String,
    pub username: String,
    pub password: String,
}

impl Credential {
    /// Decodes a base64 `user:password` token. Everything after the first
    /// colon belongs to the password.
    pub fn decode(entry: &AuthorizationEntry) -> Result<Self> {
        let decode_error = |reason: String| Error::Decode {
            endpoint: entry.endpoint.clone(),
            reason,
        };

        let bytes = STANDARD
            .decode(entry.token.as_bytes())
            .map_err(|e| decode_error(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| decode_error(e.to_string()))?;
        let (username, password) = text
            .split_once(':')
            .ok_or_else(|| decode_error("missing ':' between user and password".to_string()))?;

        Ok(Self {
            endpoint: entry.endpoint.clone(),
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "docker login -u {} -p {} {}",
            self.username, self.password, self.endpoint
        )
    }
}

#[derive(Debug, Default)]
pub struct LoginReport {
    pub printed: usize,
    pub failures: Vec<Error>,
}

/// Writes one `docker login` line per decodable credential, in service
/// order. Undecodable entries are collected in the report and do not stop
/// the remaining ones.
pub async fn emit_logins<A, W>(
    auth: &A,
    registry_ids: &[String],
    out: &mut W,
) -> Result<LoginReport>
where
    A: RegistryAuth + ?Sized,
    W: Write,
{
    let entries = auth.authorization_tokens(registry_ids).await?;
    debug!(count = entries.len(), "received authorization data");

    let mut report = LoginReport::default();
    for entry in &entries {
        match Credential::decode(entry) {
            Ok(credential) => {
                writeln!(out, "{}", credential).map_err(|e| Error::io("<stdout>", e))?;
                report.printed += 1;
            }
            Err(err) => {
                debug!(endpoint = %entry.endpoint, "skipping credential: {}", err);
                report.failures.push(err);
            }
        }
    }
    out.flush().map_err(|e| Error::io("<stdout>", e))?;

    Ok(report)
}

impl LoginReport {
    /// Ok when every credential was printed. A single failure is returned
    /// as is; several are folded into one error listing each of them.
    pub fn into_result(mut self) -> Result<()> {
        match self.failures.len() {
            0 => Ok(()),
            1 => Err(self.failures.remove(0)),
            failed => {
                let details = self
                    .failures
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(Error::Batch {
                    failed,
                    total: failed + self.printed,
                    details,
                })
            }
        }
    }
}

/// `ecr get-login [--region <name>] [--registry-ids <id>...]`
pub async fn ecr_get_login(args: &[String]) -> Result<()> {
    let parsed = options::parse(&GET_LOGIN_OPTIONS, args)?;
    let config = ClientConfig::resolve(parsed.single("region"))?;
    let auth = config.ecr_auth()?;

    let mut stdout = std::io::stdout();
    emit_logins(&auth, parsed.many("registry-ids"), &mut stdout)
        .await?
        .into_result()
}
