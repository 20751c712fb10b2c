//! # tablegate-lambda: Lambda entry point
//!
//! Composition root for the serverless deployment.
//!
//! ## Responsibilities
//! - Install the JSON `tracing` subscriber (CloudWatch adds timestamps)
//! - Resolve [`ServiceSettings`] from the environment once per cold start
//! - Build the `DynamoDB` client, honouring `DYNAMODB_ENDPOINT`
//! - Hand every proxy event to the shared gateway router
//!
//! ## Dependency rule
//! This crate only wires adapters together. No domain logic belongs here.

#![recursion_limit = "256"]

use anyhow::Context;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use tablegate_adapter_http_gateway::{GatewayRequest, GatewayResponse, Router};
use tablegate_adapter_storage_dynamodb::{DynamoDbConfig, DynamoDbItemStore};
use tablegate_app::services::ItemService;
use tablegate_app::settings::ServiceSettings;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

/// Endpoint override for the `DynamoDB` client (e.g. LocalStack).
const ENDPOINT_VAR: &str = "DYNAMODB_ENDPOINT";

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_current_span(true)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    let router = build_router().await?;
    let settings = router.service().settings();
    let root = tracing::info_span!(
        "tablegate",
        environment = %settings.environment,
        variant = %settings.variant,
    );

    lambda_runtime::run(service_fn(move |event: LambdaEvent<GatewayRequest>| {
        let router = router.clone();
        async move { Ok::<GatewayResponse, Error>(invoke(&router, event).await) }
            .instrument(root.clone())
    }))
    .await
}

async fn build_router() -> anyhow::Result<Router<DynamoDbItemStore>> {
    let settings = ServiceSettings::from_env().context("failed to resolve service settings")?;

    let sdk_config = aws_config::load_from_env().await;
    let config = DynamoDbConfig::from_settings(&settings)
        .with_endpoint(std::env::var(ENDPOINT_VAR).ok());
    let store = DynamoDbItemStore::from_config(&sdk_config, &config, settings.key_schema());

    tracing::info!(
        table_name = %settings.table_name,
        region = %settings.region,
        endpoint = config.endpoint.as_deref().unwrap_or("default"),
        "handler initialised"
    );

    Ok(Router::new(ItemService::new(store, settings)))
}

async fn invoke(
    router: &Router<DynamoDbItemStore>,
    event: LambdaEvent<GatewayRequest>,
) -> GatewayResponse {
    let (request, context) = event.into_parts();
    router.handle(with_invocation_id(request, context.request_id)).await
}

/// Fall back to the runtime's invocation id when the event carries none.
fn with_invocation_id(request: GatewayRequest, invocation_id: String) -> GatewayRequest {
    if request.request_id().is_some() || invocation_id.is_empty() {
        request
    } else {
        request.with_request_id(invocation_id)
    }
}
