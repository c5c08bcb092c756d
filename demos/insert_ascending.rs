//! Inserts `1..=21` into an order-5 tree and prints it.
//!
//! Run with `RUST_LOG=bplus_tree=trace` to also see every split.

use bplus_tree::BPlusTree;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), bplus_tree::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bplus_tree=info")))
        .with_target(false)
        .init();

    println!("B+ tree test utility");
    println!("--------------------");

    let mut tree = BPlusTree::new(5)?;
    for key in 1..22 {
        tree.insert(key);
    }

    tree.print();
    Ok(())
}
