mod cli;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use tradex::TradexError;
use tradex::config::fetch_config;
use tradex::credentials::SessionContext;
use tradex::gateway::GatewayClient;

#[tokio::main]
async fn main() -> Result<ExitCode, TradexError> {
    // Logs go to stderr so command output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = cli::new().get_matches();
    let action = cli::handler(&matches)?;

    let app_config = fetch_config()?;
    let session = SessionContext::from_backend(&app_config.credentials);
    let gateway = GatewayClient::new(&app_config.api, session.clone())?;

    cli::execute(action, gateway, session).await
}
