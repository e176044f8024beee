use kinesis_lifecycle::{stream::StreamProvisioner, Config, KinesisClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
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
    let provisioner = StreamProvisioner::new(Arc::new(client), config.poll_policy());

    match provisioner
        .ensure(config.stream_name(), &CancellationToken::new())
        .await
    {
        Ok(arn) => info!("Stream ARN: {arn}"),
        Err(err) => error!("{err}"),
    }
}
