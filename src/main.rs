use anyhow::Result;
use balance_tracker::{cli, config, db, openapi, routes, state};
use clap::Parser;
use tokio::net::TcpListener;

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|err| {
        let hint = match err.kind() {
            std::io::ErrorKind::AddrInUse => {
                "another process already listens there; pick a free one with --port"
            }
            std::io::ErrorKind::PermissionDenied => "binding there needs more privileges",
            _ => "check --host and --port",
        };
        anyhow::Error::new(err).context(format!("cannot listen on {addr}: {hint}"))
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!(
            "{}",
            serde_json::to_string_pretty(&openapi::openapi_json())?
        );
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::BalanceTrackerConfig::from_env()?;
    let pool = db::connect_lazy(&config)?;
    tracing::info!(
        app_schema = %config.app_schema,
        hive_schema = %config.hive_schema,
        target_points = config.target_points,
        "balance tracker configured"
    );

    let app = routes::router(state::AppState::new(config, pool)).layer(routes::cors_layer());

    let addr = args.listen_addr();
    let listener = bind_listener(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
