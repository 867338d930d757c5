use std::env;

use anyhow::Result;
use opentelemetry::global;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

const SERVICE_NAME: &str = "desec-webhook";

pub fn init_tracing() -> Result<()> {
    let jaeger_layer = match env::var("JAEGER_AGENT") {
        Err(_) => None,

        Ok(agent_addr) => {
            global::set_text_map_propagator(opentelemetry_jaeger::Propagator::new());

            let tracer = opentelemetry_jaeger::new_pipeline()
                .with_service_name(SERVICE_NAME)
                .with_agent_endpoint(agent_addr)
                .install_simple()?;

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().pretty().with_target(true);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(jaeger_layer)
        .with(stderr_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

pub fn stop_tracing() {
    global::shutdown_tracer_provider();
}
