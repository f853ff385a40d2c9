use std::process::ExitCode;
use std::time::Duration;

use batterytender::{BatteryTender, Config, Tz};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "batterytender", version, about = "Read Battery Tender monitors and chargers")]
struct Cli {
    #[arg(long, env = "BATTERYTENDER_EMAIL")]
    email: String,

    #[arg(long, env = "BATTERYTENDER_PASSWORD", hide_env_values = true)]
    password: String,

    /// Cache lifetime in seconds
    #[arg(long, default_value_t = 600)]
    cache_ttl: u64,

    /// Time zone for timestamps sent without an offset
    #[arg(long, default_value = "UTC")]
    timezone: Tz,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List monitors with their latest reading
    Monitors,
    /// Print the status of one monitor
    Monitor { id: String },
    /// Print the status history of one monitor
    History { id: String },
    /// List chargers
    Chargers,
    /// Print the status of one charger
    Charger { id: String },
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "batterytender=warn".into()),
    );
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<S: Serialize>(value: &S) -> batterytender::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn show(value: Option<impl std::fmt::Display>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn run(cli: Cli) -> batterytender::Result<()> {
    let config = Config::new(cli.email, cli.password)?
        .with_cache_ttl(Duration::from_secs(cli.cache_ttl))
        .with_timezone(cli.timezone);
    let client = BatteryTender::new(config)?;

    match cli.command {
        Command::Monitors => {
            for monitor in client.monitors()? {
                let status = monitor.status()?;
                println!(
                    "{}\tname={}\tsoc={}\tvoltage={}\tdate={}",
                    monitor.device_id(),
                    show(status.device.as_ref().and_then(|d| d.name.as_deref())),
                    show(status.soc),
                    show(status.voltage),
                    show(status.date.map(|d| d.to_rfc3339())),
                );
            }
        }
        Command::Monitor { id } => print_json(&client.monitor(&id)?)?,
        Command::History { id } => print_json(&client.monitor_history(&id)?)?,
        Command::Chargers => {
            for charger in client.chargers()? {
                println!("{}", charger.device_id());
            }
        }
        Command::Charger { id } => print_json(&client.charger(&id)?)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
