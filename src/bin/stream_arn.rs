use kinesis_lifecycle::{Client, Config, KinesisClient};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::new();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::new();
    let client = KinesisClient::builder()
        .await
        .endpoint_url(config.endpoint_url())
        .build();

    match client.describe_stream(config.stream_name()).await {
        Ok(output) => info!("Stream ARN: {} ({:?})", output.stream_arn, output.status),
        Err(err) => error!("{err}"),
    }
}
