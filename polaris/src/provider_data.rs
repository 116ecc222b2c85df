//! Provider data structure passed to resources

use crate::api::Client;

/// Handed to every resource through `ConfigureResourceRequest`. Clones share
/// one underlying HTTP client.
#[derive(Clone, Debug)]
pub struct PolarisProviderData {
    pub client: Client,
}

impl PolarisProviderData {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}
