//! # wikirace-game
//!
//! Plays the Wikipedia Game: start on an article, follow links until a
//! page title contains the target phrase.
//!
//! - [`fetch`]: page retrieval, one attempt per page
//! - [`extract`]: title and article links from page markup
//! - [`filter`]: drops links to pages already visited
//! - [`policy`]: direct-match shortcut, otherwise the ranking oracle
//! - [`oracle`]: LLM-backed ranking
//! - [`game`]: the bounded navigation loop

pub mod config;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod game;
pub mod oracle;
pub mod page;
pub mod policy;

pub use config::{provider_config, FetchConfig, GameConfig, OracleConfig};
pub use extract::LinkExtractor;
pub use fetch::{HttpFetcher, PageFetcher};
pub use filter::filter_unvisited;
pub use game::{Game, GameObserver, GameState, Outcome, RunReport, StepRecord};
pub use oracle::{LlmOracle, RankingOracle};
pub use page::{normalize_url, Candidate, Page, UNKNOWN_TITLE};
pub use policy::{parse_choice, title_matches, FallbackReason, OracleChoice, Selection, SelectionPolicy};
