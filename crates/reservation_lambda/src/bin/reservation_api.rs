use lambda_runtime::{service_fn, Error, LambdaEvent};
use reservation_lambda::adapters::clock::{SystemClock, UuidGenerator};
use reservation_lambda::adapters::kv_store::KvStore;
use reservation_lambda::adapters::line_notifier::LineNotifier;
use reservation_lambda::adapters::memory_store::MemoryKvStore;
use reservation_lambda::adapters::notifier::{NoopNotifier, Notifier};
use reservation_lambda::adapters::s3_store::S3KvStore;
use reservation_lambda::config::{KvBackend, RuntimeConfig};
use reservation_lambda::handlers::router::route;
use reservation_lambda::handlers::{ApiGatewayResponse, AppContext};
use reservation_lambda::logging::{init_tracing, log_info};
use reservation_lambda::runtime::slots::DailySchedule;
use serde_json::{json, Value};

struct Services {
    store: Box<dyn KvStore>,
    notifier: Box<dyn Notifier>,
    schedule: DailySchedule,
}

async fn build_services(config: RuntimeConfig) -> Services {
    let store: Box<dyn KvStore> = match config.backend {
        KvBackend::S3 { bucket, prefix } => {
            let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            Box::new(S3KvStore::new(
                bucket,
                prefix,
                aws_sdk_s3::Client::new(&aws_config),
            ))
        }
        KvBackend::Memory => Box::new(MemoryKvStore::new()),
    };

    let notifier: Box<dyn Notifier> = match config.line {
        Some(line) => Box::new(LineNotifier::new(line.channel_access_token, line.to)),
        None => Box::new(NoopNotifier),
    };

    Services {
        store,
        notifier,
        schedule: config.schedule,
    }
}

async fn handle_request(
    services: &Services,
    event: LambdaEvent<Value>,
) -> Result<ApiGatewayResponse, Error> {
    let ctx = AppContext {
        store: services.store.as_ref(),
        notifier: services.notifier.as_ref(),
        clock: &SystemClock,
        ids: &UuidGenerator,
        schedule: &services.schedule,
    };
    Ok(route(event.payload, &ctx))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = RuntimeConfig::from_env()?;
    log_info(
        "reservation_api",
        "cold_start",
        json!({
            "backend": match &config.backend {
                KvBackend::S3 { .. } => "s3",
                KvBackend::Memory => "memory",
            },
            "notifier": if config.line.is_some() { "line" } else { "noop" },
        }),
    );

    let services = build_services(config).await;
    let services = &services;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(services, event).await
    }))
    .await
}
