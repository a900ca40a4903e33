use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// pm - versioned tarball publisher
///
/// Pack files into `<name>-<version>.tar.gz`, publish them to a remote store,
/// and install the best matching versions elsewhere.
///
/// Examples:
///   pm create pack.yaml       # Build tool-1.2.0.tar.gz and upload it
///   pm update packages.yaml   # Install the newest matching versions into ./dist
///   pm list packages.yaml     # Show what the remote store has
#[derive(Parser, Debug)]
#[command(author, version = env!("PM_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show progress details (sets the default log level to info)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create a package archive from a publish spec and upload it
    Create(ConfigArgs),

    /// Download and extract the packages listed in an update spec
    Update(ConfigArgs),

    /// List packages published in the remote store of an update spec
    List(ConfigArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Config file (.json, .yaml or .yml)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    let runtime = pm::runtime::RealRuntime;

    match cli.command {
        Commands::Create(args) => pm::commands::create(runtime, &args.config)?,
        Commands::Update(args) => pm::commands::update(runtime, &args.config)?,
        Commands::List(args) => pm::commands::list(runtime, &args.config)?,
    }
    Ok(())
}
