//! Client construction for the `DynamoDB` adapter.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Region;
use tablegate_app::settings::ServiceSettings;

/// `DynamoDB` table configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbConfig {
    /// Table holding the items.
    pub table_name: String,
    /// Region override; the shared SDK config decides when unset.
    pub region: Option<String>,
    /// Endpoint override (e.g. a local `DynamoDB` emulator).
    pub endpoint: Option<String>,
}

impl DynamoDbConfig {
    /// Table and region taken from the service settings.
    #[must_use]
    pub fn from_settings(settings: &ServiceSettings) -> Self {
        Self {
            table_name: settings.table_name.clone(),
            region: Some(settings.region.clone()),
            endpoint: None,
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint.filter(|value| !value.is_empty());
        self
    }

    /// Build a client inheriting everything else from `sdk_config`.
    #[must_use]
    pub fn client(&self, sdk_config: &aws_config::SdkConfig) -> Client {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);
        if let Some(region) = &self.region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Client::from_conf(builder.build())
    }
}
