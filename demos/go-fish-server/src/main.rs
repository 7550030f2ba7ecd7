//! Standalone Go Fish server.
//!
//! Configured entirely from the environment (see
//! [`ServerConfig`](fishbowl::ServerConfig)); stops on Ctrl-C.

use fishbowl::prelude::*;

#[tokio::main]
async fn main() -> Result<(), FishbowlError> {
    fishbowl::init_tracing();

    let config = ServerConfig::from_env()?;
    if config.enable_auth && config.tokens.is_empty() {
        tracing::warn!("ENABLE_AUTH is set but AUTH_TOKENS is empty; every handshake will be refused");
    }

    let server = FishbowlServerBuilder::from_config(&config)
        .build(config.authenticator())
        .await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
