use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "furnace")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Create and delete cloud stacks from declarative templates", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding furnace.toml, templates and ec2_conf.json
    #[arg(long, global = true, env = crate::paths::ENV_CONFIG_DIR, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Provider to talk to (overrides furnace.toml)
    #[arg(long, global = true, value_enum)]
    pub provider: Option<ProviderArg>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate the template, ask for parameters and create the stack
    Create(StackArgs),

    /// Delete the stack and wait until it is gone
    Delete(StackArgs),

    /// Show the current status of the stack
    Status(StackArgs),

    /// Show resolved configuration paths and settings
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
pub struct StackArgs {
    /// Stack name (defaults to the configured stack name)
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// AWS CloudFormation
    Aws,
    /// Google Cloud Deployment Manager
    Gcp,
}

impl From<ProviderArg> for stackkit::Provider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Aws => stackkit::Provider::Aws,
            ProviderArg::Gcp => stackkit::Provider::Gcp,
        }
    }
}
