use std::path::PathBuf;

use clap::{Parser, ValueHint};

/// Run the broadcast server, relaying every message to all other connected clients.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerArgs {
    /// Port to listen on, on every interface. Use 0 for an ephemeral port.
    pub port: String,
}

/// Connect to a chat server and open the chat screen.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ClientArgs {
    /// Host name or address of the server.
    #[arg(value_hint = ValueHint::Hostname)]
    pub host: String,

    /// Port the server listens on.
    pub port: String,

    /// Write logs to this file; the terminal belongs to the chat screen.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,
}

/// Parses the command line, exiting with status 1 on usage errors.
///
/// `--help` and `--version` still exit 0.
pub fn parse_or_exit<T: Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}
