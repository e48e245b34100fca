//! Create an IAM stream, write a message into it and read it back.
//!
//! Run:
//! `QLITE_NODE_URL=http://localhost:4000 cargo run --example async_iam_roundtrip`

use qlite_client::QliteClient;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(node_url) = std::env::var("QLITE_NODE_URL") else {
        eprintln!("Set QLITE_NODE_URL before running this example.");
        std::process::exit(2);
    };

    let client = QliteClient::new(node_url)?;

    let created = client.iam_create().await?;
    let Some(stream) = created.get("iam_id").and_then(|id| id.as_str()) else {
        return Err("ql-node did not return an iam_id".into());
    };
    println!("Created IAM stream {stream}");

    client
        .iam_write(stream, 0, &json!({"habit": "antarctica", "name": "penguin"}), Some("ANIMALS"))
        .await?;
    let read = client.iam_read(stream, 0, Some("ANIMALS")).await?;
    println!("{}", serde_json::to_string_pretty(&read)?);

    client.iam_delete(stream).await?;
    Ok(())
}
