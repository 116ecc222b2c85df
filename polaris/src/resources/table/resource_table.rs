//! Table resource implementation

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

use super::mapping::{expand_table, flatten_table};
use super::table_schema;
use crate::api::{ApiError, Client};
use crate::resources::{api_diagnostic, not_configured, project_id};
use crate::PolarisProviderData;

#[derive(Default)]
pub struct TableResource {
    provider_data: Option<PolarisProviderData>,
}

impl TableResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> Result<&Client, Diagnostic> {
        self.provider_data
            .as_ref()
            .map(|data| &data.client)
            .ok_or_else(not_configured)
    }

    /// Duplicate check, POST, then a read by name to pick up computed fields
    async fn create_table(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let client = self.client()?;
        let project_id =
            project_id(config).map_err(|e| e.to_diagnostic("Invalid table configuration"))?;
        let mut table =
            expand_table(config).map_err(|e| e.to_diagnostic("Invalid table configuration"))?;

        let exists = client
            .table_exists(&project_id, &table.name)
            .await
            .map_err(|e| api_diagnostic("Failed to check for existing table", &e))?;
        if exists {
            let err = ApiError::TableAlreadyExists {
                project_id,
                name: table.name,
            };
            return Err(api_diagnostic("Failed to create table", &err)
                .with_attribute(AttributePath::new("name")));
        }

        client
            .create_table(&project_id, &mut table)
            .await
            .map_err(|e| api_diagnostic("Failed to create table", &e))?;
        tracing::debug!("Created table {} with ID {}", table.name, table.id);

        let mut created = client
            .get_table(&project_id, &table.name)
            .await
            .map_err(|e| api_diagnostic("Failed to read table after create", &e))?
            .ok_or_else(|| {
                Diagnostic::error(
                    "Failed to read table after create",
                    format!("Table {:?} was not found after it was created", table.name),
                )
            })?;
        if created.id.is_empty() {
            created.id = table.id;
        }

        Ok(flatten_table(&created, &project_id))
    }

    /// `Ok(None)` when the table no longer exists
    async fn read_table(&self, state: &DynamicValue) -> Result<Option<DynamicValue>, Diagnostic> {
        let client = self.client()?;
        let project_id =
            project_id(state).map_err(|e| e.to_diagnostic("Invalid table state"))?;
        let name = state
            .get_string(&AttributePath::new("name"))
            .map_err(|e| Diagnostic::error("Invalid table state", e.to_string()))?;

        match client.get_table(&project_id, &name).await {
            Ok(Some(table)) => Ok(Some(flatten_table(&table, &project_id))),
            Ok(None) => {
                tracing::warn!("Table {} not found, removing from state", name);
                Ok(None)
            }
            Err(e) => Err(api_diagnostic("Failed to read table", &e)),
        }
    }

    /// Full replace by ID, then a read by name
    async fn update_table(
        &self,
        prior_state: &DynamicValue,
        config: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let client = self.client()?;
        let project_id =
            project_id(config).map_err(|e| e.to_diagnostic("Invalid table configuration"))?;
        let id = prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| Diagnostic::error("Invalid table state", e.to_string()))?;
        let table =
            expand_table(config).map_err(|e| e.to_diagnostic("Invalid table configuration"))?;

        client
            .update_table(&project_id, &id, &table)
            .await
            .map_err(|e| api_diagnostic("Failed to update table", &e))?;
        tracing::debug!("Updated table {} ({})", table.name, id);

        client
            .get_table(&project_id, &table.name)
            .await
            .map_err(|e| api_diagnostic("Failed to read table after update", &e))?
            .map(|updated| flatten_table(&updated, &project_id))
            .ok_or_else(|| {
                Diagnostic::error(
                    "Failed to read table after update",
                    format!("Table {:?} was not found after it was updated", table.name),
                )
            })
    }
}

#[async_trait]
impl Resource for TableResource {
    fn type_name(&self) -> &str {
        "polaris_table"
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
            schema: table_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = table_schema().check_config(&request.config);

        if let Ok(granularity) = request
            .config
            .get_map(&AttributePath::new("query_granularity"))
        {
            for key in granularity.keys().filter(|k| k.as_str() != "type") {
                diagnostics.push(
                    Diagnostic::warning(
                        "Unsupported query_granularity key",
                        format!("Only \"type\" is sent to the API; {:?} is ignored", key),
                    )
                    .with_attribute(AttributePath::new("query_granularity").key(key)),
                );
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        async move {
            match self.create_table(&request.config).await {
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
            match self.read_table(&request.current_state).await {
                Ok(new_state) => ReadResourceResponse {
                    new_state,
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
            match self
                .update_table(&request.prior_state, &request.config)
                .await
            {
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

            let (project_id, id) = match (
                project_id(&request.prior_state),
                request.prior_state.get_string(&AttributePath::new("id")),
            ) {
                (Ok(project_id), Ok(id)) => (project_id, id),
                // Never created, nothing to delete
                _ => return DeleteResourceResponse { diagnostics },
            };

            match client.delete_table(&project_id, &id).await {
                Ok(()) => tracing::debug!("Deleted table {}", id),
                Err(e) => diagnostics.push(api_diagnostic("Failed to delete table", &e)),
            }
            DeleteResourceResponse { diagnostics }
        }
        .instrument(ctx.span())
        .await
    }
}

#[async_trait]
impl ResourceWithConfigure for TableResource {
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
#[path = "./resource_table_test.rs"]
mod resource_table_test;
