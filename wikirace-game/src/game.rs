//! The navigation loop.
//!
//! Per step: pace, fetch, extract, check the title, mark the page visited,
//! filter, select. The run ends in exactly one [`Outcome`]; only oracle
//! errors escape as `Err`.

use crate::config::GameConfig;
use crate::extract::LinkExtractor;
use crate::fetch::PageFetcher;
use crate::filter::filter_unvisited;
use crate::oracle::RankingOracle;
use crate::page::{normalize_url, Candidate};
use crate::policy::{title_matches, Selection, SelectionPolicy};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};
use wikirace_error::{Error, Result};
use wikirace_llm::UsageTracker;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// A fetched title contained the target
    Success { title: String },
    /// No unvisited links left on the current page
    DeadEnd,
    /// The current page could not be retrieved
    FetchFailed { url: String, reason: String },
    /// `max_steps` pages fetched without reaching the target
    StepCap,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            Outcome::Success { title } => format!("reached target page: {}", title),
            Outcome::DeadEnd => "no further links".to_string(),
            Outcome::FetchFailed { url, .. } => format!("could not fetch {}", url),
            Outcome::StepCap => "step cap reached".to_string(),
        }
    }
}

/// One fetched page and what was done with it
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub url: String,
    pub title: String,
    /// Unvisited candidates left after filtering
    pub candidates: usize,
    pub selection: Option<Selection>,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub target: String,
    pub start_url: String,
    pub outcome: Outcome,
    /// Titles in visiting order
    pub path: Vec<String>,
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_usage: Option<UsageTracker>,
}

/// Progress callbacks, invoked in order as the run advances
pub trait GameObserver {
    fn on_page(&mut self, _step: usize, _title: &str, _url: &str) {}
    fn on_candidates(&mut self, _count: usize) {}
    fn on_selection(&mut self, _selection: &Selection) {}
    fn on_finish(&mut self, _outcome: &Outcome) {}
}

impl GameObserver for () {}

/// Mutable state of a single run
#[derive(Debug)]
pub struct GameState {
    current: String,
    visited: HashSet<String>,
    path: Vec<String>,
    step: usize,
    target: String,
}

impl GameState {
    pub fn new(start_url: &str, target: &str) -> Self {
        Self {
            current: normalize_url(start_url),
            visited: HashSet::new(),
            path: Vec::new(),
            step: 0,
            target: target.to_string(),
        }
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// Mark the current page visited, then drop visited pages from
    /// `candidates`. The order matters: the page being left can never be
    /// picked as its own successor.
    pub fn leave(&mut self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        self.visited.insert(self.current.clone());
        filter_unvisited(candidates, &self.visited)
    }
}

/// Plays one game at a time over a fetcher and an oracle
pub struct Game<F, O> {
    config: GameConfig,
    extractor: LinkExtractor,
    policy: SelectionPolicy,
    fetcher: F,
    oracle: O,
}

impl<F: PageFetcher, O: RankingOracle> Game<F, O> {
    pub fn new(config: GameConfig, extractor: LinkExtractor, fetcher: F, oracle: O) -> Self {
        let policy = SelectionPolicy::new(config.candidate_limit);
        Self {
            config,
            extractor,
            policy,
            fetcher,
            oracle,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Play from `start_url` towards `target`.
    pub async fn run<Obs: GameObserver>(
        &mut self,
        start_url: &str,
        target: &str,
        observer: &mut Obs,
    ) -> Result<RunReport> {
        let target = target.trim();
        if target.is_empty() {
            return Err(Error::invalid_argument("target phrase is empty").with_operation("game::run"));
        }

        let mut state = GameState::new(start_url, target);
        let mut steps = Vec::new();
        let outcome = self.play(&mut state, &mut steps, observer).await?;

        info!(outcome = ?outcome, steps = state.step, "run finished");
        observer.on_finish(&outcome);

        Ok(RunReport {
            target: state.target,
            start_url: normalize_url(start_url),
            outcome,
            path: state.path,
            steps,
            oracle_usage: self.oracle.usage().cloned(),
        })
    }

    async fn play<Obs: GameObserver>(
        &mut self,
        state: &mut GameState,
        steps: &mut Vec<StepRecord>,
        observer: &mut Obs,
    ) -> Result<Outcome> {
        while state.step < self.config.max_steps {
            state.step += 1;

            if !self.config.pace.is_zero() {
                tokio::time::sleep(self.config.pace).await;
            }

            let html = match self.fetcher.fetch(&state.current).await {
                Ok(html) => html,
                Err(err) => {
                    warn!(url = %state.current, error = %err, "fetch failed, ending run");
                    return Ok(Outcome::FetchFailed {
                        url: state.current.clone(),
                        reason: err.to_string(),
                    });
                }
            };

            let page = self.extractor.extract(&html, &state.current);
            info!(step = state.step, title = %page.title, url = %state.current, "visiting");
            observer.on_page(state.step, &page.title, &state.current);
            state.path.push(page.title.clone());

            let mut record = StepRecord {
                step: state.step,
                url: state.current.clone(),
                title: page.title.clone(),
                candidates: 0,
                selection: None,
            };

            if title_matches(&page.title, &state.target) {
                steps.push(record);
                return Ok(Outcome::Success { title: page.title });
            }

            let candidates = state.leave(page.candidates);
            record.candidates = candidates.len();
            observer.on_candidates(candidates.len());

            let selection = self
                .policy
                .select(&page.title, &state.target, &candidates, &mut self.oracle)
                .await
                .map_err(|e| e.with_context("step", state.step.to_string()).persist())?;

            let Some(selection) = selection else {
                steps.push(record);
                return Ok(Outcome::DeadEnd);
            };

            observer.on_selection(&selection);
            state.current = selection.candidate().url.clone();
            record.selection = Some(selection);
            steps.push(record);
        }

        Ok(Outcome::StepCap)
    }
}
