//! Chat lobby server - Entry Point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use log::info;

use chat_lobby::error::handlers::{error_to_exit_code, handle_error};
use chat_lobby::utils::logging::setup_logging;
use chat_lobby::{Server, ServerConfig, ServerError};

#[derive(Parser, Debug)]
#[command(name = "chat-lobby", about = "Bounded TCP lobby with a name handshake")]
struct Args {
    /// Port to listen on
    port: u16,

    /// TOML configuration file (defaults to ./lobby.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    info!("Launching lobby server...");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            handle_error(&e);
            ExitCode::from(error_to_exit_code(&e))
        }
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    let config = ServerConfig::load(args.config.as_deref(), Some(args.port))?;
    let server = Server::bind(config).await?;
    server.start().await;
    Ok(())
}
