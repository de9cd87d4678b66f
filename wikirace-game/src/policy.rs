//! Choosing the next page.
//!
//! Rules, in priority order:
//! 1. the current title contains the target: the run is won;
//! 2. nothing left after filtering: dead end;
//! 3. an anchor text contains the target: take the first such link;
//! 4. otherwise show the first `candidate_limit` links to the oracle and
//!    take the number it answers with, or the first link if the answer
//!    has no usable number.
//!
//! Rule 1 is evaluated by the game loop before the page is marked visited;
//! rules 2-4 live in [`SelectionPolicy::select`].

use crate::oracle::RankingOracle;
use crate::page::Candidate;
use serde::Serialize;
use std::fmt::Write;
use tracing::{debug, warn};
use wikirace_error::Result;

/// Case-insensitive containment of the target phrase.
pub fn contains_phrase(text: &str, target: &str) -> bool {
    text.to_lowercase().contains(&target.to_lowercase())
}

/// Rule 1: has the run reached the target?
pub fn title_matches(title: &str, target: &str) -> bool {
    contains_phrase(title, target)
}

/// How the next page was picked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Selection {
    /// Anchor text already names the target
    Direct { candidate: Candidate },
    /// Oracle answered with a valid 1-based choice
    Ranked {
        choice: usize,
        candidate: Candidate,
        response: String,
    },
    /// Oracle answer was unusable; first shortlisted link taken
    Fallback {
        reason: FallbackReason,
        candidate: Candidate,
        response: String,
    },
}

impl Selection {
    pub fn candidate(&self) -> &Candidate {
        match self {
            Selection::Direct { candidate }
            | Selection::Ranked { candidate, .. }
            | Selection::Fallback { candidate, .. } => candidate,
        }
    }

    /// Raw oracle reply, when the oracle was consulted
    pub fn response(&self) -> Option<&str> {
        match self {
            Selection::Direct { .. } => None,
            Selection::Ranked { response, .. } | Selection::Fallback { response, .. } => {
                Some(response)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    NoNumber,
    OutOfRange { digits: String },
}

/// Result of reading a number out of an oracle reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleChoice {
    /// 1-based index within range
    Valid(usize),
    NoNumber,
    /// Digits present but not in `1..=n` (or too long to be an index)
    OutOfRange(String),
}

/// Read the oracle's pick out of `response`.
///
/// All digits in the text are concatenated and read as one base-10
/// number, so "option 7, because" is 7 but "between 3 and 14" is 314.
pub fn parse_choice(response: &str, n: usize) -> OracleChoice {
    let digits: String = response.chars().filter_map(decimal_digit).collect();
    if digits.is_empty() {
        return OracleChoice::NoNumber;
    }
    match digits.parse::<usize>() {
        Ok(num) if (1..=n).contains(&num) => OracleChoice::Valid(num),
        _ => OracleChoice::OutOfRange(digits),
    }
}

/// ASCII or fullwidth (`０`-`９`) digit as its ASCII form. Decimal digits
/// of other scripts are not recognised.
fn decimal_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        '\u{FF10}'..='\u{FF19}' => char::from_u32(c as u32 - 0xFF10 + '0' as u32),
        _ => None,
    }
}

/// Next-page selection (rules 2-4)
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    candidate_limit: usize,
}

impl SelectionPolicy {
    pub fn new(candidate_limit: usize) -> Self {
        Self {
            candidate_limit: candidate_limit.max(1),
        }
    }

    /// First candidate whose anchor text contains the target
    pub fn direct_match<'a>(&self, candidates: &'a [Candidate], target: &str) -> Option<&'a Candidate> {
        candidates.iter().find(|c| contains_phrase(&c.text, target))
    }

    /// The leading slice of candidates the oracle gets to see
    pub fn shortlist<'a>(&self, candidates: &'a [Candidate]) -> &'a [Candidate] {
        &candidates[..candidates.len().min(self.candidate_limit)]
    }

    pub fn build_prompt(&self, title: &str, target: &str, shortlist: &[Candidate]) -> String {
        let n = shortlist.len();
        let mut prompt = format!(
            "You are playing the Wikipedia Game - a popular educational puzzle where the goal is \
             to navigate from one Wikipedia article to another by clicking links. This is a \
             legitimate game played by millions to learn about connections between topics.\n\n\
             Current article: '{title}'\n\
             Target article: '{target}'\n\n\
             Choose the NUMBER (1-{n}) of the link that would best help reach the target article. \
             Consider semantic connections, geographical proximity, or categorical relationships.\n\n\
             Available links:\n"
        );
        for (i, candidate) in shortlist.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {}", i + 1, candidate.text);
        }
        let _ = write!(
            prompt,
            "\nRespond with ONLY the number (1-{n}). If no link seems related, choose the most \
             general or geographical one."
        );
        prompt
    }

    /// Pick the next page from the filtered candidates.
    ///
    /// `Ok(None)` is a dead end. Oracle errors are returned as-is; an
    /// unusable oracle answer never is.
    pub async fn select<O: RankingOracle>(
        &self,
        title: &str,
        target: &str,
        candidates: &[Candidate],
        oracle: &mut O,
    ) -> Result<Option<Selection>> {
        if candidates.is_empty() {
            return Ok(None);
        }

        if let Some(candidate) = self.direct_match(candidates, target) {
            debug!(text = %candidate.text, "direct match");
            return Ok(Some(Selection::Direct {
                candidate: candidate.clone(),
            }));
        }

        let shortlist = self.shortlist(candidates);
        let prompt = self.build_prompt(title, target, shortlist);
        let response = oracle.rank(&prompt).await?;

        let selection = match parse_choice(&response, shortlist.len()) {
            OracleChoice::Valid(choice) => Selection::Ranked {
                choice,
                candidate: shortlist[choice - 1].clone(),
                response,
            },
            OracleChoice::NoNumber => {
                warn!(%response, "no number in oracle reply, taking the first link");
                Selection::Fallback {
                    reason: FallbackReason::NoNumber,
                    candidate: shortlist[0].clone(),
                    response,
                }
            }
            OracleChoice::OutOfRange(digits) => {
                warn!(%digits, n = shortlist.len(), "oracle choice out of range, taking the first link");
                Selection::Fallback {
                    reason: FallbackReason::OutOfRange { digits },
                    candidate: shortlist[0].clone(),
                    response,
                }
            }
        };
        Ok(Some(selection))
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::new(50)
    }
}
