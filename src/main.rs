pub mod cli;
pub mod config;
pub mod flow;
pub mod html;
pub mod installer;
pub mod koji;
pub mod logger;
pub mod prompt;
pub mod rpm;
pub mod selector;

#[cfg(test)]
mod test_support;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // A missing argument is reported before the config file is even read.
    let package = match flow::read_input(cli.package.clone()) {
        Ok(package) => package,
        Err(outcome) => std::process::exit(outcome.exit_code()),
    };

    let config = config::Config::resolve(&cli)?;
    log::debug!("Using config: {:?}", config);

    let packages = rpm::Dnf::new(config.commands.clone());
    let mut workflow = flow::Workflow::new(config, prompt::InquirePrompter, packages)?;
    let outcome = workflow.run(Some(package)).await?;

    let code = outcome.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
