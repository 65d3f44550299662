use clap::Parser;
use tollgate::cli::{
    Args, build_config, handle_create_user, init_logging, load_signing_secrets, open_database,
};
use tollgate::run_server;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(secrets) = load_signing_secrets(
        args.access_secret_file.as_deref(),
        args.refresh_secret_file.as_deref(),
    ) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database, args.bcrypt_cost).await else {
        std::process::exit(1);
    };

    if let Some(username) = args.create_user.as_deref() {
        if !handle_create_user(&db, username).await {
            std::process::exit(1);
        }
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to read local address");
        std::process::exit(1);
    });

    let config = build_config(db, secrets, args.token_settings());

    info!(
        address = %local_addr,
        access_ttl = config.token_settings.access_ttl_secs,
        refresh_ttl = config.token_settings.refresh_ttl_secs,
        "Listening"
    );

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
