//! HTTP client for the provider middleware service.
//!
//! The middleware normalizes each learning platform's API. Every request is
//! scoped with `?id={provider_platform_id}` and carries the service key in the
//! `Authorization` header.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use domain::models::{
    ImportActivity, ImportMilestone, ImportProgram, ImportRecord, ImportUser, ProviderPlatform,
    SyncContext,
};
use domain::services::{GatewayError, ProviderGateway};

use crate::config::ProviderServiceConfig;

/// Registration body for `POST /add-provider`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProviderServiceDescriptor {
    pub id: i64,
    #[serde(rename = "type")]
    pub platform_type: String,
    pub account_id: String,
    pub base_url: String,
    pub api_key: String,
    pub username: String,
    pub password: String,
}

impl ProviderServiceDescriptor {
    /// Splits combined `username:password` keys for platforms that use them.
    pub fn from_platform(platform: &ProviderPlatform) -> Result<Self, GatewayError> {
        let (username, password) = if platform.platform_type.uses_combined_credentials() {
            let split = shared::credentials::split_access_key(&platform.access_key)
                .map_err(|e| GatewayError::Credentials(e.to_string()))?;
            (split.username, split.password)
        } else {
            (String::new(), String::new())
        };

        Ok(Self {
            id: platform.id,
            platform_type: platform.platform_type.as_str().to_string(),
            account_id: platform.account_id.clone(),
            base_url: platform.base_url.clone(),
            api_key: platform.access_key.clone(),
            username,
            password,
        })
    }
}

/// Gateway for one provider platform, backed by the middleware service.
pub struct ProviderServiceClient {
    client: Client,
    service_url: Url,
    service_key: String,
    descriptor: ProviderServiceDescriptor,
}

impl ProviderServiceClient {
    pub fn new(
        config: &ProviderServiceConfig,
        platform: &ProviderPlatform,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        let service_url = Url::parse(&config.base_url).map_err(|e| {
            GatewayError::Unreachable(format!("invalid provider service url {}: {}", config.base_url, e))
        })?;

        Ok(Self {
            client,
            service_url,
            service_key: config.service_key.clone(),
            descriptor: ProviderServiceDescriptor::from_platform(platform)?,
        })
    }

    /// Builds a client and makes sure the middleware knows this provider.
    pub async fn connect(
        config: &ProviderServiceConfig,
        platform: &ProviderPlatform,
    ) -> Result<Self, GatewayError> {
        let client = Self::new(config, platform)?;
        client.ensure_registered().await?;
        Ok(client)
    }

    /// Appends escaped path segments to the service URL.
    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.service_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::Unreachable(format!("{} cannot be a base url", self.service_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.client
            .get(url)
            .query(&[("id", self.descriptor.id)])
            .header(reqwest::header::AUTHORIZATION, &self.service_key)
    }

    /// Self-check at `GET /`; registers the provider when the check fails.
    pub async fn ensure_registered(&self) -> Result<(), GatewayError> {
        match self.get(self.url(&[""])?).send().await {
            Ok(response) if response.status().is_success() => return Ok(()),
            Ok(response) => debug!(
                provider_platform_id = self.descriptor.id,
                status = response.status().as_u16(),
                "Provider service self-check failed"
            ),
            Err(e) => debug!(
                provider_platform_id = self.descriptor.id,
                error = %e,
                "Provider service self-check failed"
            ),
        }

        info!(provider_platform_id = self.descriptor.id, "Registering provider with provider service");
        let response = self
            .client
            .post(self.url(&["add-provider"])?)
            .header(reqwest::header::AUTHORIZATION, &self.service_key)
            .json(&self.descriptor)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await.map(|_| ())
    }

    /// Fetches a record list. Only a body that is not a JSON array fails the
    /// call; elements are decoded one by one.
    async fn get_records<T: DeserializeOwned>(
        &self,
        ctx: &SyncContext,
        segments: &[&str],
    ) -> Result<Vec<ImportRecord<T>>, GatewayError> {
        let url = self.url(segments)?;
        debug!(request_id = %ctx.request_id, path = url.path(), "Provider service request");
        let response = self.get(url).send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        let values = response.json::<Vec<serde_json::Value>>().await.map_err(|e| {
            warn!(
                provider_platform_id = ctx.provider_platform_id,
                error = %e,
                "Undecodable provider service response"
            );
            GatewayError::Decode(e.to_string())
        })?;
        Ok(ImportRecord::decode_all(values))
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Unreachable(e.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ProviderGateway for ProviderServiceClient {
    fn provider_platform_id(&self) -> i64 {
        self.descriptor.id
    }

    async fn users(&self, ctx: &SyncContext) -> Result<Vec<ImportRecord<ImportUser>>, GatewayError> {
        self.get_records(ctx, &["users"]).await
    }

    async fn programs(
        &self,
        ctx: &SyncContext,
    ) -> Result<Vec<ImportRecord<ImportProgram>>, GatewayError> {
        self.get_records(ctx, &["programs"]).await
    }

    async fn milestones(
        &self,
        ctx: &SyncContext,
        external_user_id: &str,
        external_program_id: &str,
    ) -> Result<Vec<ImportRecord<ImportMilestone>>, GatewayError> {
        self.get_records(
            ctx,
            &["users", external_user_id, "programs", external_program_id, "milestones"],
        )
        .await
    }

    async fn activity(
        &self,
        ctx: &SyncContext,
        external_program_id: &str,
    ) -> Result<Vec<ImportRecord<ImportActivity>>, GatewayError> {
        self.get_records(ctx, &["programs", external_program_id, "activity"])
            .await
    }
}

/// Opens a gateway for a provider platform.
#[async_trait]
pub trait GatewayFactory: Send + Sync {
    async fn connect(
        &self,
        platform: &ProviderPlatform,
    ) -> Result<Arc<dyn ProviderGateway>, GatewayError>;
}

/// Factory producing [`ProviderServiceClient`]s from configuration.
pub struct HttpGatewayFactory {
    config: ProviderServiceConfig,
}

impl HttpGatewayFactory {
    pub fn new(config: ProviderServiceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl GatewayFactory for HttpGatewayFactory {
    async fn connect(
        &self,
        platform: &ProviderPlatform,
    ) -> Result<Arc<dyn ProviderGateway>, GatewayError> {
        let client = ProviderServiceClient::connect(&self.config, platform).await?;
        Ok(Arc::new(client))
    }
}
