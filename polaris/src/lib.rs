//! Terraform provider for Polaris tables and connections

pub mod api;
pub mod config;
pub mod provider_data;
pub mod resources;

pub use provider_data::PolarisProviderData;

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
    ValidateProviderConfigRequest, ValidateProviderConfigResponse,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic};
use tracing::Instrument;

use config::{ProviderConfig, API_KEY_ENV, BASE_URL_ENV};
use resources::{ConnectionResource, TableResource};

#[derive(Default)]
pub struct PolarisProvider;

impl PolarisProvider {
    pub fn new() -> Self {
        Self
    }

    fn provider_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages tables and connections through the Polaris REST API")
            .attribute(
                AttributeBuilder::new("base_url", AttributeType::String)
                    .description(&format!(
                        "Base URL of the Polaris API. Can also be set with {}",
                        BASE_URL_ENV
                    ))
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_key", AttributeType::String)
                    .description(&format!(
                        "API key for the Polaris API. Can also be set with {}",
                        API_KEY_ENV
                    ))
                    .optional()
                    .sensitive()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl Provider for PolarisProvider {
    fn type_name(&self) -> &str {
        "polaris"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        let mut diagnostics = Self::provider_schema().check_config(&request.config);

        // Only a literal value can be checked here; env fallback is resolved in configure
        let path = AttributePath::new("base_url");
        if let Ok(Some(url)) = request.config.get_optional_string(&path) {
            if !url.is_empty() {
                if let Err(e) = url::Url::parse(&url) {
                    diagnostics.push(
                        Diagnostic::error("Invalid base_url", format!("{:?}: {}", url, e))
                            .with_attribute(path),
                    );
                }
            }
        }

        ValidateProviderConfigResponse { diagnostics }
    }

    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let level = tfplug::logging::init_from_env();

        async move {
            tracing::debug!(
                "Configuring provider for Terraform {} (log level {:?})",
                request.terraform_version,
                level
            );

            let config = match ProviderConfig::from_config(&request.config) {
                Ok(config) => config,
                Err(e) => {
                    return ConfigureProviderResponse {
                        diagnostics: vec![Diagnostic::error(
                            "Invalid provider configuration",
                            e.to_string(),
                        )
                        .with_attribute(AttributePath::new(e.attribute()))],
                        provider_data: None,
                    };
                }
            };

            match config.client() {
                Ok(client) => {
                    tracing::info!("Polaris provider configured for {}", config.base_url);
                    let data = PolarisProviderData::new(client);
                    ConfigureProviderResponse {
                        diagnostics: vec![],
                        provider_data: Some(Arc::new(data) as Arc<dyn Any + Send + Sync>),
                    }
                }
                Err(e) => ConfigureProviderResponse {
                    diagnostics: vec![Diagnostic::error(
                        "Failed to create API client",
                        e.to_string(),
                    )],
                    provider_data: None,
                },
            }
        }
        .instrument(ctx.span())
        .await
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            "polaris_table".to_string(),
            Box::new(|| Box::new(TableResource::new()) as Box<dyn ResourceWithConfigure>),
        );
        factories.insert(
            "polaris_connection".to_string(),
            Box::new(|| Box::new(ConnectionResource::new()) as Box<dyn ResourceWithConfigure>),
        );
        factories
    }
}
