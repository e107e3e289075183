use domain_namer::{app, config::AppConfig, state::AppState, workspace::reset_workspace};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Leftovers from a crashed session go before any upload is accepted.
    let report = reset_workspace(&config.data_dir).await?;
    for warning in &report.warnings {
        log::warn!("{}", warning);
    }

    let bind_addr = config.bind_addr;
    let state = AppState::new(config);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
