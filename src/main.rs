use std::sync::Arc;

use action_selector::{
    cli::parse_args,
    config::Config,
    logging::init_tracing,
    selection::{DefaultActionSelector, StaticActionDescriptorProvider},
    server,
};
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let config = Config::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path.display()))?;

    let catalog = StaticActionDescriptorProvider::from_specs(&config.actions)
        .context("failed to build action catalog from config")?;

    if args.check_only {
        println!(
            "config ok: {} actions, {} value sources",
            catalog.len(),
            config.value_sources.len()
        );
        return Ok(());
    }

    let logging_guard = init_tracing(&config.logging).context("failed to initialize logging")?;
    tracing::info!(
        target: "selector",
        run_id = logging_guard.run_id(),
        actions = catalog.len(),
        value_sources = ?config.value_sources,
        "action_catalog_loaded"
    );

    let selector = Arc::new(DefaultActionSelector::new(
        Arc::new(catalog),
        config.value_provider_factories(),
    ));

    server::run(&config.server, selector).await
}
