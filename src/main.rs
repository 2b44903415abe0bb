//! Compal CH7465LG modem control CLI

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use compal::client::Completion;
use compal::scanner::{EnumerateSink, FileSink, FunctionScanner, ScanSink};
use compal::settings::{BackupRestore, Diagnostics, PingOptions, TracerouteOptions};
use compal::{logging, Modem, ModemConfig, DEFAULT_CONFIG_FILE};
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(name = "compal")]
#[command(about = "Control client for the Compal CH7465LG cable modem")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Modem address, overrides the configuration file
    #[arg(long)]
    host: Option<String>,

    /// Admin password, overrides the configuration file
    #[arg(long)]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and out again to verify the credentials
    Login,
    /// Close the modem's single admin session
    Logout,
    /// Complete the first-installation wizard of a factory-fresh modem
    Setup {
        /// Admin password to set
        #[arg(long)]
        new_password: Option<String>,
    },
    /// Reboot the modem
    Reboot,
    /// Reset the modem to factory defaults
    FactoryReset {
        /// File receiving the default-value snapshot taken before the reset
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Download the configuration file
    Backup {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Upload a configuration file
    Restore {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Ping a host from the modem
    Ping {
        target: String,
        #[arg(long, default_value_t = 3)]
        count: u32,
        /// Seconds to wait before reading the result
        #[arg(long, default_value_t = 5)]
        wait: u64,
    },
    /// Traceroute to a host from the modem
    Traceroute {
        target: String,
        #[arg(long, default_value_t = 30)]
        max_hops: u32,
        /// Seconds to wait before reading the result
        #[arg(long, default_value_t = 15)]
        wait: u64,
    },
    /// Dump every getter function to func_<n>.xml until interrupted
    Scan {
        #[arg(long)]
        start: Option<u32>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Log the root element of every getter function until interrupted
    Enumerate {
        #[arg(long)]
        start: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = load_config(&cli)?;
    if let Command::Setup {
        new_password: Some(password),
    } = &cli.command
    {
        config.password = Some(password.clone());
    }

    info!("Connecting to {}", config.base_url());
    let mut modem = Modem::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.host))?;

    match cli.command {
        Command::Login => {
            login(&mut modem).await?;
            info!("Credentials accepted");
            modem.logout().await?;
        }
        Command::Logout => {
            modem.logout().await?;
        }
        Command::Setup { .. } => {
            if modem.performed_initial_setup() {
                info!("Modem is set up");
            } else {
                warn!("Modem was not on the first-installation page, nothing to do");
            }
        }
        Command::Reboot => {
            login(&mut modem).await?;
            match modem.reboot().await? {
                Completion::Acknowledged(_) => info!("Reboot acknowledged"),
                Completion::NoResponse => info!("Modem stopped responding, rebooting"),
            }
        }
        Command::FactoryReset { output } => {
            login(&mut modem).await?;
            let defaults = modem.factory_reset().await?;
            write_file(&output, &defaults.body).await?;
        }
        Command::Backup { output } => {
            login(&mut modem).await?;
            let data = BackupRestore::new(&mut modem).backup().await?;
            modem.logout().await?;
            match data {
                Some(data) => write_file(&output, &data).await?,
                None => bail!("Modem refused the configuration download"),
            }
        }
        Command::Restore { input } => {
            let data = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            login(&mut modem).await?;
            let response = BackupRestore::new(&mut modem)
                .restore(Bytes::from(data))
                .await?;
            if !response.is_success() {
                bail!("Modem rejected the restore with HTTP {}", response.status_code);
            }
            info!(status = response.status_code, "Restore uploaded");
        }
        Command::Ping { target, count, wait } => {
            login(&mut modem).await?;
            let options = PingOptions {
                count,
                ..Default::default()
            };
            let mut diagnostics = Diagnostics::new(&mut modem);
            diagnostics.ping(&target, options).await?;
            tokio::time::sleep(Duration::from_secs(wait)).await;
            println!("{}", diagnostics.ping_result().await?);
            modem.logout().await?;
        }
        Command::Traceroute {
            target,
            max_hops,
            wait,
        } => {
            login(&mut modem).await?;
            let options = TracerouteOptions {
                max_hops,
                ..Default::default()
            };
            let mut diagnostics = Diagnostics::new(&mut modem);
            diagnostics.traceroute(&target, options).await?;
            tokio::time::sleep(Duration::from_secs(wait)).await;
            println!("{}", diagnostics.traceroute_result().await?);
            modem.logout().await?;
        }
        Command::Scan { start, output_dir } => {
            let dir = output_dir.unwrap_or_else(|| config.scan.output_dir.clone());
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let mut sink = FileSink::new(dir);
            scan(&mut modem, start.unwrap_or(config.scan.start), &mut sink, false).await?;
        }
        Command::Enumerate { start } => {
            let mut sink = EnumerateSink::new();
            scan(&mut modem, start.unwrap_or(config.scan.start), &mut sink, true).await?;
            info!("Found {} functions", sink.found().len());
        }
    }

    debug!(exchanges = modem.session().state().exchanges(), "Done");
    Ok(())
}

/// Log in with the configured password.
async fn login(modem: &mut Modem) -> Result<()> {
    match modem.login(None).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_login_failure() => {
            error!("Login rejected: {}", e);
            Err(e).context("Login failed")
        }
        Err(e) => Err(e).context("Could not log in"),
    }
}

/// Configuration file if present, with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<ModemConfig> {
    let mut config = if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        ModemConfig::from_file(&cli.config)
            .with_context(|| format!("Failed to load configuration from: {}", cli.config.display()))?
    } else {
        ModemConfig::default()
    };

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

/// Scan from `start` into `sink` until interrupted, then log out.
async fn scan<S: ScanSink>(modem: &mut Modem, start: u32, sink: &mut S, quiet: bool) -> Result<()> {
    login(modem).await?;

    let outcome = {
        let mut scanner = FunctionScanner::new(modem, start, None).quiet(quiet);
        tokio::select! {
            result = scanner.run(sink, None) => result.map(Some),
            signal = shutdown_signal() => signal.map(|_| None).map_err(Into::into),
        }
    };

    let hits = match outcome {
        Ok(hits) => hits,
        Err(e) => {
            if modem.state().is_authenticated() {
                if let Err(logout) = modem.logout().await {
                    warn!("Logout after failed scan: {}", logout);
                }
            }
            return Err(e).context("Scan stopped");
        }
    };
    match hits {
        Some(hits) => info!("Scan finished with {} hits", hits),
        None => info!("Scan interrupted"),
    }
    modem.logout().await?;
    Ok(())
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT, stopping..."),
            _ = sigterm.recv() => info!("Received SIGTERM, stopping..."),
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, stopping...");
    }

    Ok(())
}
