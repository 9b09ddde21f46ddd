//! Credit-card fraud detection - entry point

use clap::Parser;
use creditcard_fraud::cli::{cmd_predict, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "creditcard_fraud=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Predict { model, data, format }) => {
            cmd_predict(&model, &data, format)?;
        }
        None => {
            cmd_train(&cli.train)?;
        }
    }

    Ok(())
}
