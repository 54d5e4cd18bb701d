//! Keytag terminal emulator binary.
//!
//! Runs the access terminal on the console: the LCD is printed to stdout,
//! stdin drives the tag reader and the keypad, logs go to stderr.

mod cli;
mod console;

use std::sync::atomic::Ordering;

use anyhow::Context;
use keytag_hardware::mock::{MockInput, MockTagReader};
use keytag_storage::{FileStorage, UserRegistry};
use keytag_terminal::{StateController, VirtualDisplay};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::console::{ConsoleDisplay, ConsoleInput, route_stdin};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::info!("Keytag terminal v{}", keytag_core::VERSION);

    let config = cli.terminal_config();
    config.validate().context("Invalid terminal configuration")?;

    let storage = FileStorage::new(&cli.data_dir);
    let registry = UserRegistry::open(storage, &config.registry_path).with_context(|| {
        format!(
            "Failed to open registry {} under {}",
            config.registry_path.display(),
            cli.data_dir.display()
        )
    })?;

    if cli.list {
        for user in registry.list() {
            println!("{user}");
        }
        return Ok(());
    }

    let (reader, reader_handle) = MockTagReader::new();
    let (input, input_handle) = MockInput::new();
    let (input, input_closed) = ConsoleInput::new(input);
    let display = ConsoleDisplay::new(
        VirtualDisplay::builder()
            .with_size(config.display_rows, config.display_columns)
            .build(),
    );

    // Keep the reader connected after stdin ends so only the keypad reports EOF
    let _reader_keepalive = reader_handle.clone();
    let router = tokio::spawn(route_stdin(reader_handle, input_handle));

    let mut controller = StateController::new(display, reader, input, registry, config);
    controller
        .start()
        .await
        .context("Failed to start terminal")?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
            () = controller.step() => {}
        }

        if input_closed.load(Ordering::SeqCst) {
            tracing::info!("Input closed, shutting down");
            break;
        }
    }

    router.abort();
    match router.await {
        Ok(Err(e)) => tracing::warn!(error = %e, "Input routing stopped"),
        Ok(Ok(())) | Err(_) => {}
    }

    Ok(())
}
