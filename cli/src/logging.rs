use shardload::utils::env_utils::LoaderEnvVar;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs a stderr subscriber filtered by `SHARDLOAD_LOG`, then `RUST_LOG`,
/// then `default_level`.
pub fn init_logging(default_level: &str) -> anyhow::Result<()> {
    let env_filter = match LoaderEnvVar::Log.non_empty_value() {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_line_number(false),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
