use anyhow::Context;
use catalog_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Book and author catalog service
#[derive(Debug, Parser)]
#[command(name = "catalog", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the effective configuration without secrets
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load catalog settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Config => {
            print_config(&settings);
            Ok(())
        }
        Command::Serve => {
            catalog_telemetry::init(&settings.telemetry)?;
            runtime()?.block_on(catalog_app::run(settings))
        }
        Command::Migrate => {
            catalog_telemetry::init(&settings.telemetry)?;
            let applied = runtime()?.block_on(catalog_app::migrate(&settings))?;
            tracing::info!(applied, "migrate finished");
            Ok(())
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")
}

fn print_config(settings: &Settings) {
    println!("environment        = {:?}", settings.environment);
    println!("server.host        = {}", settings.server.host);
    println!("server.port        = {}", settings.server.port);
    println!("server.timeout_ms  = {}", settings.server.request_timeout_ms);
    println!("database.backend   = {:?}", settings.database.backend);
    println!("database.url       = {}", redact_url(&settings.database.url));
    println!(
        "database.pool      = {}..{}",
        settings.database.min_connections, settings.database.max_connections
    );
    println!("database.migrate   = {}", settings.database.run_migrations);
    println!("telemetry.format   = {:?}", settings.telemetry.log_format);
    println!("telemetry.level    = {}", settings.telemetry.log_level);
}

fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
