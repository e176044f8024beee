use kinesis_lifecycle::{Config, Harness, KinesisClient};
use std::io;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::new();
    if let Err(err) = config.validate() {
        error!("{err}");
        process::exit(1);
    }

    let client = KinesisClient::builder()
        .await
        .endpoint_url(config.endpoint_url())
        .build();
    let harness = Harness::new(Arc::new(client), &config);

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending waits");
            canceller.cancel();
        }
    });

    info!("Running against stream {}", config.stream_name());
    let mut stdout = io::stdout();
    if let Err(err) = harness.run(config.stream_name(), &token, &mut stdout).await {
        error!("{err}");
        if err.is_transient() {
            info!("The service throttled or was unreachable, a later run may succeed");
        }
        process::exit(1);
    }
}
