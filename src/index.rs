//! # Index Partitioner
//!
//! $$
//! g(s)=\min_{\text{priority}}\{\,G : s\in G\,\}\ \text{ or }\ G_{\text{broad}}
//! $$
//!
//! Resolves every symbol to exactly one index group and splits an available universe
//! into per-group member lists, so pairs are only ever formed inside one market.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

use crate::config::IndexesConfig;

/// Known index groups, declared in configuration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKey {
  /// Broad US market, also the fallback group.
  Sp500,
  /// Tech-heavy US equities.
  Nasdaq,
  /// Russian equities.
  Imoex,
  /// Russian corporate bonds.
  Rucbitr,
  /// Russian sovereign bonds.
  Rgbi,
}

impl IndexKey {
  /// All groups in configuration order.
  pub const ALL: [IndexKey; 5] = [
    IndexKey::Sp500,
    IndexKey::Nasdaq,
    IndexKey::Imoex,
    IndexKey::Rucbitr,
    IndexKey::Rgbi,
  ];

  /// Resolution order: the most specific group wins.
  pub const PRIORITY: [IndexKey; 5] = [
    IndexKey::Rgbi,
    IndexKey::Rucbitr,
    IndexKey::Imoex,
    IndexKey::Nasdaq,
    IndexKey::Sp500,
  ];

  /// Group assigned to unrecognized symbols.
  pub const FALLBACK: IndexKey = IndexKey::Sp500;

  /// Name used when the configuration does not provide one.
  pub fn default_name(self) -> &'static str {
    match self {
      IndexKey::Sp500 => "S&P500",
      IndexKey::Nasdaq => "NASDAQ",
      IndexKey::Imoex => "IMOEX",
      IndexKey::Rucbitr => "RUCBITR",
      IndexKey::Rgbi => "RGBI",
    }
  }

  /// Lowercase identifier, as used for configuration keys.
  pub fn as_str(self) -> &'static str {
    match self {
      IndexKey::Sp500 => "sp500",
      IndexKey::Nasdaq => "nasdaq",
      IndexKey::Imoex => "imoex",
      IndexKey::Rucbitr => "rucbitr",
      IndexKey::Rgbi => "rgbi",
    }
  }
}

impl Display for IndexKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Members of one enabled index group present in the available universe.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexGroup {
  /// Group identifier.
  pub key: IndexKey,
  /// Display name.
  pub name: String,
  /// Threshold applied when selecting top pairs.
  pub correlation_threshold: f64,
  /// Whether the group is enabled.
  pub enabled: bool,
  /// Member symbols, in the order of the available universe.
  pub symbols: Vec<String>,
}

/// Symbol to index resolution built from configured member lists.
#[derive(Clone, Debug)]
pub struct IndexPartitioner {
  config: IndexesConfig,
  membership: HashMap<String, IndexKey>,
}

impl IndexPartitioner {
  /// Build the symbol lookup from the member lists of `config`.
  ///
  /// A symbol listed under several groups resolves to the one earliest in
  /// [`IndexKey::PRIORITY`].
  pub fn new(config: IndexesConfig) -> Self {
    let mut membership = HashMap::new();

    for key in IndexKey::PRIORITY.iter().rev() {
      if let Some(index) = config.index(*key) {
        for symbol in &index.members {
          membership.insert(symbol.clone(), *key);
        }
      }
    }

    Self { config, membership }
  }

  /// Borrow the configuration.
  pub fn config(&self) -> &IndexesConfig {
    &self.config
  }

  /// Group `symbol` belongs to; unknown symbols land in [`IndexKey::FALLBACK`].
  pub fn resolve(&self, symbol: &str) -> IndexKey {
    self
      .membership
      .get(symbol)
      .copied()
      .unwrap_or(IndexKey::FALLBACK)
  }

  /// Members of `key` present in `available`, deduplicated, in `available` order.
  ///
  /// Disabled groups yield an empty member list.
  pub fn group(&self, key: IndexKey, available: &[String]) -> IndexGroup {
    let enabled = self.config.is_enabled(key);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut symbols = Vec::new();
    if enabled {
      for symbol in available {
        if self.resolve(symbol) == key && seen.insert(symbol.as_str()) {
          symbols.push(symbol.clone());
        }
      }
    }

    IndexGroup {
      key,
      name: self.config.index_name(key),
      correlation_threshold: self.config.correlation_threshold(key),
      enabled,
      symbols,
    }
  }

  /// One [`IndexGroup`] per enabled index, in configuration order.
  pub fn partition(&self, available: &[String]) -> Vec<IndexGroup> {
    self
      .config
      .enabled_indexes()
      .into_iter()
      .map(|key| self.group(key, available))
      .collect()
  }
}
