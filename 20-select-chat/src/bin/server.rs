//! Broadcast chat server.
//!
//! ```bash
//! cargo run --bin select-chat-server -- 9000
//! ```
//!
//! Every connection gets whatever any other connection sends, one message per read. Ctrl+C
//! closes the listening socket and exits.

use anyhow::Result;
use tracing::info;

use select_chat::{
    cli::{self, ServerArgs},
    server::Server,
    telemetry,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args: ServerArgs = cli::parse_or_exit();
    telemetry::init_stderr();

    let server = Server::bind(&args.port).await?;
    let addr = server.local_addr()?;
    info!(%addr, "server is listening, press Ctrl+C to quit");

    server.run_until_ctrl_c().await?;
    info!("socket is closed, exited successfully");

    Ok(())
}
