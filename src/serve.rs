use super::config::AppConfig;
use super::db::establish_pool;
pub use super::error::Error;
use anyhow::Context as _;
use axum::{Router, extract::FromRef};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity, log::LevelFilter};
use figment::{Figment, providers::Format as _};
use sqlx::SqlitePool;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

/// The application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
/// The database connection pool.
pub type Db = SqlitePool;

#[derive(Parser, Debug, Clone)]
/// Command line arguments.
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "default.toml")]
    pub config: PathBuf,
    /// The verbosity level.
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

#[derive(Clone, FromRef)]
/// The application state, shared across all routes.
pub(crate) struct AppState {
    /// The application configuration.
    pub(crate) config: AppConfig,
    /// The catalog database.
    pub(crate) db: Db,
}

/// Build the application router: public pages, the admin backend and static media.
pub(crate) fn router(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media.path);

    Router::new()
        .merge(super::endpoints::routes())
        .nest("/admin", super::admin::routes())
        .nest_service("/media", media)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load the configuration file, overridden by `MOVIES_` environment variables.
pub(crate) fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    if !path.exists() {
        // Throw up a warning if the config file does not exist.
        //
        // This is not fatal because users can specify all configuration settings via
        // the environment.
        warn!("configuration file {} does not exist", path.display());
    }

    Figment::new()
        .admerge(figment::providers::Toml::file(path))
        .admerge(figment::providers::Env::prefixed("MOVIES_").split("__"))
        .extract()
        .context("failed to load configuration")
}

/// The main application entry point.
pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up trace logging to console and account for the user-provided verbosity flag.
    if args.verbosity.log_level_filter() != LevelFilter::Off {
        let lvl = match args.verbosity.log_level_filter() {
            LevelFilter::Error => tracing::Level::ERROR,
            LevelFilter::Warn => tracing::Level::WARN,
            LevelFilter::Info | LevelFilter::Off => tracing::Level::INFO,
            LevelFilter::Debug => tracing::Level::DEBUG,
            LevelFilter::Trace => tracing::Level::TRACE,
        };
        tracing_subscriber::fmt().with_max_level(lvl).init();
    }

    let config = load_config(&args.config)?;

    if config.test {
        warn!("movie catalog starting up in TEST mode.");
    }
    if config.admin.token.is_none() {
        warn!("no admin token configured; the admin backend is disabled");
    }

    // Initialize metrics reporting.
    super::metrics::setup(config.metrics.as_ref()).context("failed to set up metrics exporter")?;

    tokio::fs::create_dir_all(&config.media.path)
        .await
        .context("failed to create media directory")?;

    let db = establish_pool(&config.db)
        .await
        .context("failed to establish database connection pool")?;

    let addr = config
        .listen_address
        .unwrap_or(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000));

    let app = router(AppState {
        config: config.clone(),
        db,
    });

    let listener = TcpListener::bind(&addr)
        .await
        .context("failed to bind address")?;

    info!("listening on {addr}");
    info!("connect to: http://127.0.0.1:{}", addr.port());

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("failed to serve app")
}
