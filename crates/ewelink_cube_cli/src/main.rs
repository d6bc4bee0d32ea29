mod token_store;

use anyhow::Context;
use ewelink_cube_client::ops::{self, AccessTokenOptions};
use ewelink_cube_client::{CubeClient, CubeConfig, EventHandlers, EventKind, Transport};

use token_store::TokenStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut config = CubeConfig::from_env();
    let store = TokenStore::for_host(&config.host)?;
    if config.access_token.is_none() {
        config.access_token = store.load()?;
    }

    tracing::info!("Connecting to eWeLink CUBE bridge at {}", config.host);
    let client = CubeClient::new(config).context("Failed to build bridge client")?;

    if !client.credentials().has_access_token() {
        let options = AccessTokenOptions::default();
        println!(
            "Press the link button on the bridge within {} seconds...",
            options.timeout.as_secs()
        );
        let token = ops::acquire_access_token(&client, options)
            .await
            .context("Access token handshake failed")?;
        store.save(&token)?;
        println!("Access token saved to {}", store.path().display());
    }

    let info = ops::bridge::get_bridge_info(&client).await?;
    println!("{}", serde_json::to_string_pretty(info.data())?);

    let mut handlers = EventHandlers::new()
        .on_open(|| async { tracing::info!("Event stream connected") })
        .on_error(|err| async move { tracing::warn!("Event stream: {}", err) });
    for kind in EventKind::ALL {
        handlers = handlers.on(kind, move |payload| async move {
            println!("{} {}", kind, payload);
        });
    }

    let stream = client.event_stream()?;
    stream.mount(handlers);
    stream.start()?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutting down");
    stream.unmount().await;

    Ok(())
}
