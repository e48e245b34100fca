//! List the ql-node command catalog without contacting a node.
//!
//! Run:
//! `cargo run --example blocking_list_commands`

use qlite_client::{API_VERSION, CommandKind};

fn main() {
    println!("ql-node API version: {API_VERSION}");
    println!("Loaded {} commands", CommandKind::ALL.len());

    for kind in CommandKind::ALL {
        let params: Vec<&str> = kind.params().iter().map(|spec| spec.name).collect();
        println!("- {:<24} ({})", kind.name(), params.join(", "));
    }
}
