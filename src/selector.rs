use crate::html::BuildCandidate;
use crate::logger::Logger;
use crate::prompt::Prompter;
use anyhow::Result;
use comfy_table::Table;
use std::ops::Range;

pub const PAGE_SIZE: usize = 20;

/// Paging state over the search results. Pure, so it can be driven without a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    len: usize,
    page: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Page changed; draw again.
    Redraw,
    Quit,
    /// Zero-based index into the full candidate list.
    Select(usize),
    OutOfRange,
    Unknown,
}

impl Pager {
    pub fn new(len: usize) -> Self {
        Self { len, page: 0 }
    }

    pub fn total_pages(&self) -> usize {
        self.len.div_ceil(PAGE_SIZE)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn range(&self) -> Range<usize> {
        let start = self.page * PAGE_SIZE;
        start..(start + PAGE_SIZE).min(self.len)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.range().end < self.len
    }

    /// Applies one line of user input. Numbers are 1-based and global,
    /// so any listed build can be picked from any page.
    pub fn apply(&mut self, input: &str) -> Action {
        let input = input.trim().to_lowercase();
        match input.as_str() {
            "n" if self.has_next() => {
                self.page += 1;
                Action::Redraw
            }
            "p" if self.has_prev() => {
                self.page -= 1;
                Action::Redraw
            }
            "q" => Action::Quit,
            digits if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                match digits.parse::<usize>() {
                    Ok(k) if (1..=self.len).contains(&k) => Action::Select(k - 1),
                    _ => Action::OutOfRange,
                }
            }
            _ => Action::Unknown,
        }
    }
}

/// Lets the user page through `candidates` and pick one. `None` on quit.
pub fn choose<P: Prompter>(
    candidates: &[BuildCandidate],
    prompt: &mut P,
) -> Result<Option<BuildCandidate>> {
    if candidates.is_empty() {
        return Ok(None);
    }

    let mut pager = Pager::new(candidates.len());

    loop {
        render(candidates, &pager);

        let Some(input) = prompt.ask("Pick a build number or a navigation key:")? else {
            return Ok(None);
        };

        match pager.apply(&input) {
            Action::Redraw => {}
            Action::Quit => return Ok(None),
            Action::Select(index) => return Ok(Some(candidates[index].clone())),
            Action::OutOfRange => {
                Logger::error("Invalid choice. Enter a number from the list.");
            }
            Action::Unknown => {
                Logger::error("Unknown command. Enter a build number or a navigation key.");
            }
        }
    }
}

fn render(candidates: &[BuildCandidate], pager: &Pager) {
    Logger::header(format!(
        "Available builds (page {}/{})",
        pager.page() + 1,
        pager.total_pages()
    ));

    let range = pager.range();
    let mut table = Table::new();
    table.set_header(vec!["#", "Build"]);
    for (offset, candidate) in candidates[range.clone()].iter().enumerate() {
        table.add_row(vec![
            (range.start + offset + 1).to_string(),
            candidate.name.clone(),
        ]);
    }
    println!("{}", table);

    if pager.has_prev() {
        Logger::command("[P]", "previous page");
    }
    if pager.has_next() {
        Logger::command("[N]", "next page");
    }
    Logger::command("[Q]", "quit");
}
