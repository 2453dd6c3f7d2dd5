//! Terminal chat client.
//!
//! ```bash
//! cargo run --bin select-chat-client -- localhost 9000
//! ```
//!
//! Type a line and press Enter to send it; `quit` (or Ctrl-C) leaves.

use anyhow::Result;

use select_chat::{
    cli::{self, ClientArgs},
    client, telemetry,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args: ClientArgs = cli::parse_or_exit();
    if let Some(path) = &args.log_file {
        telemetry::init_file(path)?;
    }

    client::run(args).await
}
