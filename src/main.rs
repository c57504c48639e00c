use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use otpgen::ticker::Ticker;
use otpgen::totp::{OtpError, Session, is_valid_secret};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `config.yaml` file.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    Serve,
    /// Print the code of a secret once.
    Code {
        #[arg(env = "OTPGEN_SECRET", hide_env_values = true)]
        secret: String,
        /// Shift the step by -1, 0 or 1.
        #[arg(long, short, default_value_t = 0, allow_negative_numbers = true,
            value_parser = clap::value_parser!(i64).range(-1..=1))]
        offset: i64,
        /// Print previous, current and next codes.
        #[arg(long, short, conflicts_with = "offset")]
        window: bool,
    },
    /// Print a fresh code at every step boundary.
    Watch {
        #[arg(env = "OTPGEN_SECRET", hide_env_values = true)]
        secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    otpgen::telemetry::setup_logging()
        .map_err(|err| err as Box<dyn std::error::Error>)?;

    let args = Args::parse();
    let state = otpgen::initialize_state(args.config)?;

    match args.cmd {
        Commands::Serve => {
            let address = state.config.address.clone();
            let listener = tokio::net::TcpListener::bind(&address).await?;
            tracing::info!(%address, "server started");

            axum::serve(listener, otpgen::app(state))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        },
        Commands::Code {
            secret,
            offset,
            window,
        } => {
            let secret = Zeroizing::new(secret);
            if !is_valid_secret(&secret) {
                return Err(OtpError::ValidationFailure.into());
            }

            let remaining =
                state.totp.remaining_seconds(state.totp_config.period());
            if window {
                let window = state
                    .totp
                    .generate_window(&secret, &state.totp_config)
                    .await?;
                println!(
                    "{} {} {} ({remaining}s)",
                    window.previous, window.current, window.next
                );
            } else {
                let code = state
                    .totp
                    .generate(&secret, offset, &state.totp_config)
                    .await?;
                println!("{code} ({remaining}s)");
            }
        },
        Commands::Watch { secret } => {
            let secret = Zeroizing::new(secret);
            let session = Session::open(&secret, state.totp_config)?;

            let mut ticker =
                Ticker::start(Arc::clone(&state.totp), session).await?;
            loop {
                let tick = ticker.current();
                println!("{} (until {})", tick.code, tick.expires_at);

                let stopped = tokio::select! {
                    alive = ticker.changed() => !alive,
                    _ = shutdown_signal() => true,
                };
                if stopped {
                    break;
                }
            }
            ticker.stop();
        },
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
