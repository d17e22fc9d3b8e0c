//! AWS OTel Collector
//!
//! Resolves the collector configuration from the command line and
//! `AOT_CONFIG_CONTENT`, then hands it to the service.

use anyhow::Result;
use aot_collector::cli::Cli;
use aot_collector::components::default_components;
use aot_collector::config::{ProcessEnv, ResolvedConfig, build_config_provider};
use aot_collector::logging::{init_tracing, log_error, logging_hook, setup_error_logger};
use aot_collector::service::{ApplicationStartInfo, Service, ServiceParameters};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};

/// Log a fatal error to the error log and exit.
fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    log_error(format_args!("{context}: {err}"));
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_error_logger(&cli.log_file);
    let hook = logging_hook(&cli.log_file);
    if let Err(e) = init_tracing(cli.verbose, vec![hook.clone()]) {
        log_error(format_args!("failed to install log subscriber: {e}"));
    }

    let factories = match default_components() {
        Ok(factories) => factories,
        Err(e) => fail("failed to build components", e),
    };

    let config_provider = match build_config_provider(&cli.config_flags(), Arc::new(ProcessEnv)) {
        Ok(provider) => provider,
        Err(e) => fail("failed to create config provider", e),
    };

    let service = Service::new(ServiceParameters {
        factories,
        start_info: ApplicationStartInfo::collector(),
        config_provider,
        logging_hooks: vec![hook],
    });

    if cli.print {
        let config = match service.resolve_initial().await {
            Ok(config) => config,
            Err(e) => fail("failed to resolve configuration", e),
        };
        match config.to_yaml() {
            Ok(yaml) => print!("{yaml}"),
            Err(e) => fail("failed to render configuration", e),
        }
        service.config_provider().close();
        return Ok(());
    }

    let apply = |config: Arc<ResolvedConfig>| -> Result<()> {
        let sections: Vec<&str> = config.keys().collect();
        info!(sections = ?sections, "Applying configuration");
        debug!(locations = config.locations().len(), "Configuration sources");
        Ok(())
    };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(format_args!("failed to listen for shutdown signal: {e}"));
        }
    };

    if let Err(e) = service.run(cli.watch, apply, shutdown).await {
        fail("collector server run finished with error", e);
    }
    Ok(())
}
