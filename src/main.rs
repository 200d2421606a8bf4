// Hostprov - host provisioning helper
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use hostprov::app::App;
use hostprov::config::Settings;
use hostprov::logging;
use hostprov::menu::MenuAction;
use hostprov::shell::SystemShell;
use hostprov::version::build_info;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "hostprov")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Append log output to this file instead of stdout
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Show version information
    #[arg(short = 'V', long)]
    version: bool,

    /// Show detailed build information
    #[arg(long)]
    build_info: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Interactive menu (default)
    Menu,
    /// Re-create and install the managed units
    Install,
    /// Stop, disable and remove the managed units
    Uninstall,
    /// Rewrite the resolver file with the configured DNS servers
    Dns,
    /// Ping the ping host and every DNS server
    CheckConnection,
    /// Kill stuck apt processes and remove apt lock files
    ClearLocks,
    /// Synchronize timezone and clock (run by the installed service)
    DateSync,
    /// Print the unit files without touching the system
    Render,
    /// Write the default settings file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Command {
    fn menu_action(self) -> Option<MenuAction> {
        match self {
            Command::Install => Some(MenuAction::InstallAll),
            Command::Uninstall => Some(MenuAction::UninstallAll),
            Command::Dns => Some(MenuAction::ConfigureDns),
            Command::CheckConnection => Some(MenuAction::CheckConnection),
            Command::ClearLocks => Some(MenuAction::CheckAptLock),
            _ => None,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Handle version flag
    if cli.version {
        println!("{}", build_info().format_display());
        return Ok(ExitCode::SUCCESS);
    }

    // Handle build info flag
    if cli.build_info {
        println!("{}", build_info().format_display());
        println!("\n{}", build_info().format_build_info());
        return Ok(ExitCode::SUCCESS);
    }

    logging::init(cli.debug, cli.log_file.as_deref())?;

    let command = cli.command.unwrap_or(Command::Menu);
    if let Command::InitConfig { force } = command {
        return init_config(cli.config, force);
    }

    let settings = Settings::load(cli.config)?;
    tracing::debug!("{} starting", build_info().format_detailed());
    let runner = SystemShell::new(settings.use_sudo);
    let app = App::new(settings, runner)?;
    let mut stdout = io::stdout();

    match command {
        Command::Menu => app.run_menu(&mut io::stdin().lock(), &mut stdout).await?,
        Command::DateSync => {
            if let Err(e) = app.date_sync().await {
                tracing::error!("{}", e);
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Render => print!("{}", app.render_units()),
        other => {
            if let Some(action) = other.menu_action() {
                app.handle(action, &mut stdout).await?;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<ExitCode> {
    let path = match path {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Settings::default().save(&path)?;
    println!("[SUCCESS] Settings written to {}", path.display());
    Ok(ExitCode::SUCCESS)
}
