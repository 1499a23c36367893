use serde::{Deserialize, Serialize};

use crate::matcher::MatcherConfig;
use crate::search::SearchConfig;

/// Tunables for matching and search. Every section falls back to its defaults
/// when absent, so an empty document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matcher: MatcherConfig,
    pub search: SearchConfig,
}
