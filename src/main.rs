use clap::Parser;
use club_ledger::{cli, config, errors::Result};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Parse arguments after .env so env-backed flags see its values
    let cli = cli::Cli::parse();

    // 4. Connect and make sure the schema exists
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Run the command
    let output = cli::run(cli, &db)
        .await
        .inspect_err(|e| error!("Command failed: {}", e))?;
    println!("{output}");

    Ok(())
}
