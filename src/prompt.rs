use anyhow::Result;
use inquire::{Confirm, InquireError, Text};

/// Terminal input. `None` means the user cancelled (Esc or Ctrl-C).
pub trait Prompter {
    fn ask(&mut self, message: &str) -> Result<Option<String>>;
    fn confirm(&mut self, message: &str) -> Result<Option<bool>>;
}

pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn ask(&mut self, message: &str) -> Result<Option<String>> {
        cancelled_as_none(Text::new(message).prompt())
    }

    fn confirm(&mut self, message: &str) -> Result<Option<bool>> {
        cancelled_as_none(Confirm::new(message).with_default(false).prompt())
    }
}

fn cancelled_as_none<T>(answer: Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replays canned answers; runs out as a cancellation.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedPrompter {
    pub answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn ask(&mut self, message: &str) -> Result<Option<String>> {
        self.asked.push(message.to_string());
        Ok(self.answers.pop_front())
    }

    fn confirm(&mut self, message: &str) -> Result<Option<bool>> {
        self.asked.push(message.to_string());
        Ok(self
            .answers
            .pop_front()
            .map(|a| a.trim().eq_ignore_ascii_case("y")))
    }
}
