use kinesis_lifecycle::{Client, Config, KinesisClient};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;
use ulid::Ulid;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::new();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::new();
    let client = KinesisClient::builder()
        .await
        .endpoint_url(config.endpoint_url())
        .build();
    let stream_name = config.stream_name();

    let arn = match client.describe_stream(stream_name).await {
        Ok(output) => output.stream_arn,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let key = Ulid::new().to_string();
    match client
        .put_record(stream_name, &arn, &key, key.clone().into_bytes())
        .await
    {
        Ok(output) => info!(
            "Put {key} into {} at {}",
            output.shard_id, output.sequence_number
        ),
        Err(err) => error!("{err}"),
    }
}
