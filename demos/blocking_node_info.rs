//! Ask a ql-node for its status (`node_info`).
//!
//! Run:
//! `QLITE_NODE_URL=http://localhost:4000 cargo run --example blocking_node_info`

use qlite_client::BlockingQliteClient;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(node_url) = std::env::var("QLITE_NODE_URL") else {
        eprintln!("Set QLITE_NODE_URL before running this example.");
        std::process::exit(2);
    };

    let client = BlockingQliteClient::new(node_url)?;
    let info = client.node_info()?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
