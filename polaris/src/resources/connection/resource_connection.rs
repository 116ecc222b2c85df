//! Connection resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tracing::Instrument;

use super::connection_schema;
use super::mapping::{
    attributes_for, expand_connection, flatten_connection, prior_password, VARIANT_ATTRIBUTES,
};
use crate::api::{Client, Connection, ConnectionSpec, ProjectResource};
use crate::resources::fields::Fields;
use crate::resources::{api_diagnostic, not_configured, project_id};
use crate::PolarisProviderData;

#[derive(Default)]
pub struct ConnectionResource {
    provider_data: Option<PolarisProviderData>,
}

impl ConnectionResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> Result<&Client, Diagnostic> {
        self.provider_data
            .as_ref()
            .map(|data| &data.client)
            .ok_or_else(not_configured)
    }

    /// Reads the connection back and flattens it; `prior` supplies what the API
    /// does not return
    async fn read_back(
        &self,
        client: &Client,
        project_id: &str,
        name: &str,
        prior: &DynamicValue,
        summary: &str,
    ) -> Result<DynamicValue, Diagnostic> {
        let connection = client
            .get_connection(project_id, name)
            .await
            .map_err(|e| api_diagnostic(summary, &e))?;
        let password = prior_password(prior);
        Ok(flatten_connection(
            &connection,
            project_id,
            password.as_deref(),
        ))
    }

    async fn create_connection(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let client = self.client()?;
        let project_id = project_id(config)
            .map_err(|e| e.to_diagnostic("Invalid connection configuration"))?;
        let connection = expand_connection(config)
            .map_err(|e| e.to_diagnostic("Invalid connection configuration"))?;

        client
            .create_connection(&project_id, &connection)
            .await
            .map_err(|e| api_diagnostic("Failed to create connection", &e))?;

        self.read_back(
            client,
            &project_id,
            &connection.name,
            config,
            "Failed to read connection after create",
        )
        .await
    }

    /// A missing connection is an error, not an empty state
    async fn read_connection(&self, state: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let client = self.client()?;
        let project_id =
            project_id(state).map_err(|e| e.to_diagnostic("Invalid connection state"))?;
        let fields = Fields::new(state);
        let name = fields
            .string("id")
            .or_else(|_| fields.string("name"))
            .map_err(|e| e.to_diagnostic("Invalid connection state"))?;

        self.read_back(client, &project_id, &name, state, "Failed to read connection")
            .await
    }

    async fn update_connection(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let client = self.client()?;
        let project_id = project_id(config)
            .map_err(|e| e.to_diagnostic("Invalid connection configuration"))?;
        let connection = expand_connection(config)
            .map_err(|e| e.to_diagnostic("Invalid connection configuration"))?;

        let path = Connection::item_path(&project_id, &connection.name);
        client
            .update_connection(&path, &connection)
            .await
            .map_err(|e| api_diagnostic("Failed to update connection", &e))?;
        tracing::debug!("Updated connection {}", connection.name);

        self.read_back(
            client,
            &project_id,
            &connection.name,
            config,
            "Failed to read connection after update",
        )
        .await
    }

    /// Warns about attributes that the configured type does not send
    fn variant_warnings(config: &DynamicValue, kind: &str) -> Vec<Diagnostic> {
        let Some(allowed) = attributes_for(kind) else {
            return vec![Diagnostic::error(
                "Invalid connection type",
                format!(
                    "Connection type must be one of: {:?}, got {:?}",
                    ConnectionSpec::TYPES,
                    kind
                ),
            )
            .with_attribute(AttributePath::new("type"))];
        };

        let fields = Fields::new(config);
        VARIANT_ATTRIBUTES
            .iter()
            .copied()
            .filter(|name| !allowed.contains(name) && fields.is_set(name))
            .map(|name| {
                Diagnostic::warning(
                    "Attribute ignored for connection type",
                    format!(
                        "{} is not used by {} connections and will not be sent",
                        name, kind
                    ),
                )
                .with_attribute(AttributePath::new(name))
            })
            .collect()
    }
}

#[async_trait]
impl Resource for ConnectionResource {
    fn type_name(&self) -> &str {
        "polaris_connection"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: connection_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = connection_schema().check_config(&request.config);

        // Unknown during planning when it comes from another resource
        if let Ok(kind) = request.config.get_string(&AttributePath::new("type")) {
            diagnostics.extend(Self::variant_warnings(&request.config, &kind));
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        async move {
            match self.create_connection(&request.config).await {
                Ok(new_state) => CreateResourceResponse {
                    new_state,
                    diagnostics: vec![],
                },
                Err(diag) => CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                },
            }
        }
        .instrument(ctx.span())
        .await
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        async move {
            match self.read_connection(&request.current_state).await {
                Ok(new_state) => ReadResourceResponse {
                    new_state: Some(new_state),
                    diagnostics: vec![],
                },
                Err(diag) => ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diag],
                },
            }
        }
        .instrument(ctx.span())
        .await
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        async move {
            match self.update_connection(&request.config).await {
                Ok(new_state) => UpdateResourceResponse {
                    new_state,
                    diagnostics: vec![],
                },
                Err(diag) => UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![diag],
                },
            }
        }
        .instrument(ctx.span())
        .await
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        async move {
            let mut diagnostics = vec![];

            let client = match self.client() {
                Ok(client) => client,
                Err(diag) => {
                    diagnostics.push(diag);
                    return DeleteResourceResponse { diagnostics };
                }
            };

            let fields = Fields::new(&request.prior_state);
            let (project_id, name) = match (fields.string("project_id"), fields.string("name")) {
                (Ok(project_id), Ok(name)) => (project_id, name),
                // Never created, nothing to delete
                _ => return DeleteResourceResponse { diagnostics },
            };

            let path = Connection::item_path(&project_id, &name);
            match client.delete_connection(&path).await {
                Ok(()) => tracing::debug!("Deleted connection {}", name),
                Err(e) => diagnostics.push(api_diagnostic("Failed to delete connection", &e)),
            }
            DeleteResourceResponse { diagnostics }
        }
        .instrument(ctx.span())
        .await
    }
}

#[async_trait]
impl ResourceWithConfigure for ConnectionResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<PolarisProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract PolarisProviderData from provider data",
                ));
            }
        } else {
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            ));
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[cfg(test)]
#[path = "./resource_connection_test.rs"]
mod resource_connection_test;
