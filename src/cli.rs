use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kojinstall")]
#[command(about = "Find a Koji build, pick it, and install its RPM with dnf", long_about = None)]
pub struct Cli {
    /// Package name to search for (glob patterns are passed through to Koji)
    pub package: Option<String>,

    /// Override the Koji web interface URL
    #[arg(long)]
    pub koji_url: Option<String>,

    /// Override the host used for relative package links
    #[arg(long)]
    pub pkgs_url: Option<String>,

    /// Target architecture of the RPM to install
    #[arg(long)]
    pub arch: Option<String>,

    /// Directory for the temporary RPM download
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
