use crate::config::Config;
use crate::html::BuildCandidate;
use crate::installer;
use crate::koji::KojiClient;
use crate::logger::Logger;
use crate::prompt::Prompter;
use crate::rpm::{self, PackageManager};
use crate::selector;
use anyhow::Result;

/// Where a run currently is. Each step consumes one state and yields the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    ReadInput(Option<String>),
    Search(String),
    Select(Vec<BuildCandidate>),
    CheckInstalled(BuildCandidate),
    OfferRemoval {
        chosen: BuildCandidate,
        base_name: String,
    },
    ResolveArtifact(BuildCandidate),
    Download(String),
    Finished(Outcome),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    MissingArgument,
    SearchFailed,
    NoResults,
    Quit,
    Removed(String),
    RemovalFailed(String),
    ResolutionFailed,
    DownloadFailed,
    Installed,
    InstallFailed,
}

impl Outcome {
    /// Only a missing argument and failed package operations are non-zero;
    /// everything else reports through the terminal and exits cleanly.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::MissingArgument
            | Outcome::RemovalFailed(_)
            | Outcome::DownloadFailed
            | Outcome::InstallFailed => 1,
            _ => 0,
        }
    }
}

/// The package argument, or the usage error when it is missing.
/// Runs before anything else touches configuration or the network.
pub fn read_input(package: Option<String>) -> Result<String, Outcome> {
    match package {
        Some(name) => Ok(name),
        None => {
            Logger::error("A package name is required");
            println!("Usage: kojinstall <package-name>");
            Err(Outcome::MissingArgument)
        }
    }
}

pub struct Workflow<P, M> {
    config: Config,
    koji: KojiClient,
    prompt: P,
    packages: M,
}

impl<P: Prompter, M: PackageManager> Workflow<P, M> {
    pub fn new(config: Config, prompt: P, packages: M) -> Result<Self> {
        let koji = KojiClient::new(&config)?;
        Ok(Self {
            config,
            koji,
            prompt,
            packages,
        })
    }

    /// Drives the state machine from the raw argument to a terminal outcome.
    pub async fn run(&mut self, package: Option<String>) -> Result<Outcome> {
        let mut state = State::ReadInput(package);
        loop {
            state = match self.step(state).await? {
                State::Finished(outcome) => return Ok(outcome),
                next => next,
            };
        }
    }

    pub async fn step(&mut self, state: State) -> Result<State> {
        let next = match state {
            State::ReadInput(package) => match read_input(package) {
                Ok(name) => State::Search(name),
                Err(outcome) => State::Finished(outcome),
            },

            State::Search(term) => {
                match self.koji.search(&term).await {
                    Err(e) => {
                        Logger::error(e);
                        Logger::error("No matching packages found.");
                        State::Finished(Outcome::SearchFailed)
                    }
                    Ok(found) if found.is_empty() => {
                        Logger::warn("No matching packages found.");
                        State::Finished(Outcome::NoResults)
                    }
                    Ok(found) => State::Select(found),
                }
            }

            State::Select(candidates) => match selector::choose(&candidates, &mut self.prompt)? {
                Some(chosen) => {
                    Logger::info(format!("Selected {}", Logger::brand_text(&chosen.name)));
                    State::CheckInstalled(chosen)
                }
                None => State::Finished(Outcome::Quit),
            },

            State::CheckInstalled(chosen) => {
                let base_name = rpm::base_name(&chosen.name).to_string();
                match self.packages.is_installed(&base_name) {
                    Ok(true) => State::OfferRemoval { chosen, base_name },
                    Ok(false) => State::ResolveArtifact(chosen),
                    Err(e) => {
                        log::warn!("Could not query installed packages: {:#}", e);
                        State::ResolveArtifact(chosen)
                    }
                }
            }

            State::OfferRemoval { chosen, base_name } => {
                let question = format!("{} is already installed. Remove it?", base_name);
                if self.prompt.confirm(&question)?.unwrap_or(false) {
                    Logger::info(format!("Removing {}", Logger::brand_text(&base_name)));
                    match self.packages.remove(&base_name) {
                        Ok(true) => {
                            Logger::success(format!("Removed {}", base_name));
                            State::Finished(Outcome::Removed(base_name))
                        }
                        Ok(false) => {
                            Logger::error(format!("Failed to remove {}", base_name));
                            State::Finished(Outcome::RemovalFailed(base_name))
                        }
                        Err(e) => {
                            Logger::error(format!("{:#}", e));
                            State::Finished(Outcome::RemovalFailed(base_name))
                        }
                    }
                } else {
                    State::ResolveArtifact(chosen)
                }
            }

            State::ResolveArtifact(chosen) => {
                let resolved = match self.koji.resolve_artifact(&chosen.build_id).await {
                    Ok(href) => self.config.qualify(&href),
                    Err(e) => Err(e.into()),
                };
                match resolved {
                    Ok(url) => {
                        Logger::info(format!("RPM URL: {}", Logger::dim(&url)));
                        State::Download(url)
                    }
                    Err(e) => {
                        Logger::error(format!("{:#}", e));
                        State::Finished(Outcome::ResolutionFailed)
                    }
                }
            }

            State::Download(url) => {
                let dir = self.config.download_dir();
                match installer::install_from_url(self.koji.http(), &url, &dir, &mut self.packages)
                    .await
                {
                    Ok(true) => State::Finished(Outcome::Installed),
                    Ok(false) => State::Finished(Outcome::InstallFailed),
                    Err(e) => {
                        Logger::error(format!("{:#}", e));
                        State::Finished(Outcome::DownloadFailed)
                    }
                }
            }

            State::Finished(outcome) => State::Finished(outcome),
        };
        Ok(next)
    }
}
