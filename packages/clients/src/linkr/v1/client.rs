use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use reqwest::{StatusCode, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use tracing::instrument;
use url::Url;

use super::{
    API_KEY_HEADER, ApiResponse, ClientCreated, CreateClientRequest, CreateLinkRequest,
    Credentials, DIGEST_HEADER, LinkCreated,
};

/// Client for the Linkr API.
///
/// Every request is signed with the credentials the client was created with.
#[derive(Clone, Debug)]
pub struct Client {
    base: Url,
    credentials: Credentials,
    http: reqwest::Client,
}

impl Client {
    /// Create a new client with the given base URL.
    pub fn new(base: impl Into<Url>, credentials: Credentials) -> Self {
        Self {
            base: base.into(),
            credentials,
            http: reqwest::Client::new(),
        }
    }

    /// Create a shortened link.
    #[instrument(skip(self))]
    pub async fn create_link(&self, request: &CreateLinkRequest) -> Result<LinkCreated> {
        self.post_signed("v1/api/create", request).await
    }

    /// Create a new API client. Requires admin credentials.
    #[instrument(skip(self))]
    pub async fn create_client(&self, request: &CreateClientRequest) -> Result<ClientCreated> {
        self.post_signed("v1/api/client/create", request).await
    }

    async fn post_signed<Req: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Res> {
        let url = self.base.join(path).with_context(|| format!("join {path}"))?;
        let body = serde_json::to_vec(request).context("serialize request")?;
        let signature = self.credentials.sign(&body).context("sign request")?;

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, signature.api_key)
            .header(DIGEST_HEADER, signature.digest)
            .body(body)
            .send()
            .await
            .context("send POST request")?;

        match response.status() {
            StatusCode::CREATED => response
                .json::<ApiResponse<Res>>()
                .await
                .map(|envelope| envelope.details)
                .context("parse response"),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(eyre!(
                    "unexpected status code from {path}: {status}\n{error_body}"
                ))
            }
        }
    }
}
