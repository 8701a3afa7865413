use clap::Parser;
use listing_scout::config::toml_config::load_env_file;
use listing_scout::domain::ports::ConfigProvider;
use listing_scout::utils::error::ErrorSeverity;
use listing_scout::utils::{logger, validation::Validate};
use listing_scout::{run_pipeline, AgentServices, CliConfig, LocalSessionStore, PipelineRun, ScoutError};

async fn run(cli: &CliConfig) -> Result<PipelineRun, ScoutError> {
    let config = cli.load_config()?;
    config.validate()?;
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    let query = cli.pipeline.resolve_query(cli.query.as_deref())?;
    let session_id = cli
        .session_id
        .clone()
        .unwrap_or_else(|| cli.pipeline.default_session_id(&query));

    let services = AgentServices::from_config(&config).await?;
    let store = LocalSessionStore::new(config.session_dir());

    run_pipeline(cli.pipeline, &query, &session_id, &services, &config, &store).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // loaded before the logger so RUST_LOG from .env applies
    let env_file = load_env_file(None);

    let cli = CliConfig::parse();
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    match env_file {
        Ok(Some(path)) => tracing::debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("⚠️ {}", e),
    }

    tracing::info!("Starting listing-scout ({})", cli.pipeline.name());

    match run(&cli).await {
        Ok(result) => {
            if cli.json {
                println!("{}", result.to_json()?);
            } else {
                print!("{}", result.render());
            }
            if !result.is_found() {
                tracing::info!("Workflow completed without a result");
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
