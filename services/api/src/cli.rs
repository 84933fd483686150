use crate::server;
use clap::{Args, Parser, Subcommand};
use immigratecabo::config::{AppConfig, ConfigError};
use immigratecabo::error::AppError;
use immigratecabo::mail::{MailTransport, Outbox};
use immigratecabo::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "ImmigrateCabo Site",
    about = "Serve the ImmigrateCabo site and its form endpoints",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the outbound mail setup
    Mail {
        #[command(subcommand)]
        command: MailCommand,
    },
}

#[derive(Subcommand, Debug)]
enum MailCommand {
    /// Connect to the relay and authenticate with the configured credentials
    Check,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Mail {
            command: MailCommand::Check,
        } => check_mail().await,
    }
}

async fn check_mail() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let outbox =
        Outbox::from_config(&config.mail)?.ok_or(ConfigError::MissingMailCredentials)?;
    outbox.transport().verify().await?;

    info!(relay = %outbox.transport().relay(), "mail relay accepted credentials");
    println!(
        "{} accepted credentials for {}",
        outbox.transport().relay(),
        outbox.office()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["immigratecabo-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "immigratecabo-api",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(args.port, Some(8080));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn mail_check_parses() {
        let cli = Cli::try_parse_from(["immigratecabo-api", "mail", "check"]).expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Mail {
                command: MailCommand::Check
            })
        ));
    }
}
