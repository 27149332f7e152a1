use std::process::ExitCode;

use clap::Parser;
use parley::prelude::*;
use tracing_subscriber::EnvFilter;

/// Terminal client for the chat server.
#[derive(Debug, Parser)]
#[command(name = "parley", version, about)]
struct Args {
    /// Server URL.
    #[arg(short, long, env = "PARLEY_ADDRESS", default_value = DEFAULT_ADDRESS)]
    address: String,

    /// Log filter used when RUST_LOG is not set (logs go to stderr).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig {
        address: args.address,
        ..ClientConfig::default()
    };
    let (output, printer) = spawn_printer();
    let result = chat(config, &output).await;

    // ConnectionLost has already been reported by the client itself.
    if let Err(e) = &result {
        if !matches!(e, ClientError::ConnectionLost(_)) {
            let _ = output.send(Notification::Line(e.to_string()));
        }
    }

    // Let the printer drain before the process exits.
    drop(output);
    let _ = printer.await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn chat(
    config: ClientConfig,
    output: &tokio::sync::mpsc::UnboundedSender<Notification>,
) -> Result<(), ClientError> {
    let input_buffer = config.input_buffer;
    let mut client = ChatClient::builder()
        .config(config)
        .connect(&WebSocketConnector)
        .await?;
    let input = spawn_stdin_reader(input_buffer)
        .map_err(ClientError::Input)?;
    client.run(input, output).await
}
