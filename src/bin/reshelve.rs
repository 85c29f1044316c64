//! reshelve CLI - operate a replicated index catalog
//!
//! # Examples
//!
//! ```bash
//! # Make an index from a text file, one document per line
//! reshelve create shop --documents products.txt
//!
//! # Replace its content with a newer build, reusing unchanged files
//! reshelve push /builds/shop-v2 --index shop
//!
//! # Apply an incremental update instead
//! reshelve push /builds/shop-delta --index shop --merge
//!
//! # Clean up after a crash
//! reshelve recover --repair
//! ```

use clap::Parser;
use reshelve::cli::{run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
