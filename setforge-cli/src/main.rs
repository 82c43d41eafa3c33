use clap::Parser;
use log::LevelFilter;

use setforge_core::config::Settings;
use setforge_core::context::CoreContext;
use setforge_core::library::Library;
use setforge_core::logger::init_logger;

mod handlers;

use handlers::CommandHandler;

/// Options configurable via the CLI.
#[derive(Debug, Parser)]
#[command(name = "setforge", version = env!("CARGO_PKG_VERSION"), about)]
struct Flags {
    /// Path to `Setforge.toml`; defaults to the platform config directory.
    #[clap(long)]
    config: Option<std::path::PathBuf>,
    /// Set the log level.
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
    /// subcommand to run
    #[clap(subcommand)]
    subcommand: handlers::Command,
}

fn main() -> anyhow::Result<()> {
    let flags = Flags::parse();

    init_logger(flags.log_level);

    let config_path = match flags.config {
        Some(path) => path,
        None => Settings::get_config_path()?,
    };
    let settings = Settings::init(config_path)?;
    let ctx = CoreContext::new(settings)?;
    let library = Library::new(&ctx);

    flags.subcommand.handle(&library)
}
