//! # Pairs Engine
//!
//! $$
//! \text{top}_K(g)=\operatorname{take}_K\big(\operatorname{sort}_\downarrow\{p\in\mathcal P_g: |\rho_p|\ge\theta_g\}\big)
//! $$
//!
//! Per-group enumeration of every unordered pair, long/short assignment by
//! prospectivity, threshold cut and top-K ranking. Groups share nothing and may be
//! evaluated on the rayon pool.

use std::cmp::Reverse;

use chrono::DateTime;
use chrono::Utc;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::types::CorrelationPair;
use super::types::CorrelationSummary;
use super::types::IndexPairCount;
use super::types::IndexPairsAnalysis;
use super::types::PairsAnalysis;
use crate::config::IndexesConfig;
use crate::config::PairsConfig;
use crate::error::Result;
use crate::index::IndexGroup;
use crate::index::IndexPartitioner;
use crate::market::PriceSource;
use crate::series::InstrumentStats;
use crate::series::correlation;
use crate::series::prospectivity;
use crate::series::recent;
use crate::series::volatility;

/// Absolute correlations at or above this are treated as duplicate series.
const DEGENERATE_CORRELATION: f64 = 1.0 - 1e-12;

fn is_falsy(x: f64) -> bool {
  x == 0.0 || x.is_nan()
}

/// Correlation analysis across configured index groups.
#[derive(Clone, Debug)]
pub struct PairsEngine {
  config: PairsConfig,
  partitioner: IndexPartitioner,
}

impl PairsEngine {
  /// Validate both configurations and build the symbol partitioner.
  pub fn new(indexes: IndexesConfig, config: PairsConfig) -> Result<Self> {
    indexes.validate()?;
    config.validate()?;

    Ok(Self {
      config,
      partitioner: IndexPartitioner::new(indexes),
    })
  }

  /// Borrow the runtime options.
  pub fn config(&self) -> &PairsConfig {
    &self.config
  }

  /// Borrow the partitioner.
  pub fn partitioner(&self) -> &IndexPartitioner {
    &self.partitioner
  }

  /// Number of top pairs reported per group.
  pub fn top_pairs_count(&self) -> usize {
    self.partitioner.config().default_top_pairs_count
  }

  /// Load the last `horizon_days` bars of each symbol and derive its stats.
  ///
  /// Symbols whose history cannot be fetched or yields no returns are dropped.
  pub fn load_instruments<S>(&self, symbols: &[String], source: &S) -> Vec<InstrumentStats>
  where
    S: PriceSource + ?Sized,
  {
    let mut instruments = Vec::with_capacity(symbols.len());

    for symbol in symbols {
      let bars = match source.price_history(symbol) {
        Ok(bars) => bars,
        Err(err) => {
          warn!(symbol = %symbol, source = source.name(), error = %err, "price history unavailable, symbol excluded");
          continue;
        }
      };

      let bars = recent(&bars, self.config.horizon_days);
      let stats = InstrumentStats::from_bars(symbol.as_str(), bars, self.config.return_scale);
      if !stats.has_returns() {
        warn!(symbol = %symbol, bars = bars.len(), "not enough valid closes, symbol excluded");
        continue;
      }

      instruments.push(stats);
    }

    instruments
  }

  /// Build the pair record for `a` and `b`, or `None` if the pair is degenerate.
  pub fn evaluate_pair(
    a: &InstrumentStats,
    b: &InstrumentStats,
    index_name: &str,
  ) -> Option<CorrelationPair> {
    if a.symbol == b.symbol {
      return None;
    }

    let rho = correlation(&a.returns, &b.returns);
    let vol1 = volatility(&a.returns);
    let vol2 = volatility(&b.returns);

    if is_falsy(rho) || is_falsy(vol1) || is_falsy(vol2) {
      return None;
    }

    if rho.abs() >= DEGENERATE_CORRELATION {
      return None;
    }

    let p1 = prospectivity(&a.returns, vol1);
    let p2 = prospectivity(&b.returns, vol2);

    let (long, short, long_p, short_p) = if p1 > p2 {
      (&a.symbol, &b.symbol, p1, p2)
    } else {
      (&b.symbol, &a.symbol, p2, p1)
    };

    Some(CorrelationPair {
      asset1: a.symbol.clone(),
      asset2: b.symbol.clone(),
      correlation: rho.abs(),
      long_asset: long.clone(),
      short_asset: short.clone(),
      long_prospectivity: long_p,
      short_prospectivity: short_p,
      volatility1: vol1,
      volatility2: vol2,
      avg_return1: a.mean_return,
      avg_return2: b.mean_return,
      strategy: CorrelationPair::strategy_label(long, short),
      index_name: index_name.to_string(),
    })
  }

  /// Every qualifying unordered pair of `instruments`, in enumeration order.
  pub fn analyze_pairs(&self, group: &IndexGroup, instruments: &[InstrumentStats]) -> Vec<CorrelationPair> {
    let n = instruments.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);

    for i in 0..n {
      for j in (i + 1)..n {
        if let Some(pair) = Self::evaluate_pair(&instruments[i], &instruments[j], &group.name) {
          pairs.push(pair);
        }
      }
    }

    pairs
  }

  /// Summarize `pairs`, then keep the strongest `top_pairs_count` at or above the
  /// group threshold.
  pub fn rank(
    &self,
    group: &IndexGroup,
    mut pairs: Vec<CorrelationPair>,
    analysis_date: DateTime<Utc>,
  ) -> IndexPairsAnalysis {
    let summary = CorrelationSummary::from_pairs(&pairs);

    pairs.retain(|p| p.correlation >= group.correlation_threshold);
    pairs.sort_by_key(|p| Reverse(OrderedFloat(p.correlation)));
    pairs.truncate(self.top_pairs_count());

    info!(
      index = %group.key,
      total_pairs = summary.count,
      top_pairs = pairs.len(),
      threshold = group.correlation_threshold,
      "index pairs ranked"
    );

    IndexPairsAnalysis {
      index_key: group.key,
      index_name: group.name.clone(),
      total_pairs: summary.count,
      average_correlation: summary.average,
      max_correlation: summary.max,
      min_correlation: summary.min,
      correlation_threshold: group.correlation_threshold,
      top_pairs: pairs,
      analysis_date,
    }
  }

  /// Load, enumerate and rank one group.
  pub fn analyze_group<S>(
    &self,
    group: &IndexGroup,
    source: &S,
    analysis_date: DateTime<Utc>,
  ) -> IndexPairsAnalysis
  where
    S: PriceSource + ?Sized,
  {
    let instruments = self.load_instruments(&group.symbols, source);
    debug!(index = %group.key, requested = group.symbols.len(), loaded = instruments.len(), "instruments loaded");
    let pairs = self.analyze_pairs(group, &instruments);
    self.rank(group, pairs, analysis_date)
  }

  /// Run the analysis over every enabled group with members in `available`.
  pub fn analyze<S>(&self, available: &[String], source: &S) -> PairsAnalysis
  where
    S: PriceSource + ?Sized,
  {
    let analysis_date = Utc::now();
    let groups: Vec<IndexGroup> = self
      .partitioner
      .partition(available)
      .into_iter()
      .filter(|group| {
        if group.symbols.is_empty() {
          debug!(index = %group.key, "no members available, index skipped");
          return false;
        }
        true
      })
      .collect();

    let indexes: Vec<IndexPairsAnalysis> = if self.config.parallel {
      groups
        .par_iter()
        .map(|group| self.analyze_group(group, source, analysis_date))
        .collect()
    } else {
      groups
        .iter()
        .map(|group| self.analyze_group(group, source, analysis_date))
        .collect()
    };

    let analysis = Self::aggregate(indexes, analysis_date);
    info!(
      indexes = analysis.indexes.len(),
      total_pairs = analysis.total_pairs,
      total_top_pairs = analysis.total_top_pairs,
      "pairs analysis complete"
    );
    analysis
  }

  fn aggregate(indexes: Vec<IndexPairsAnalysis>, analysis_date: DateTime<Utc>) -> PairsAnalysis {
    let total_pairs: usize = indexes.iter().map(|a| a.total_pairs).sum();

    let (average, max, min) = if total_pairs == 0 {
      (0.0, 0.0, 0.0)
    } else {
      let populated = indexes.iter().filter(|a| a.total_pairs > 0);
      let weighted: f64 = populated
        .clone()
        .map(|a| a.average_correlation * a.total_pairs as f64)
        .sum();
      let max = populated
        .clone()
        .map(|a| a.max_correlation)
        .fold(f64::NEG_INFINITY, f64::max);
      let min = populated
        .map(|a| a.min_correlation)
        .fold(f64::INFINITY, f64::min);
      (weighted / total_pairs as f64, max, min)
    };

    let pairs_per_index = indexes
      .iter()
      .map(|a| IndexPairCount {
        index_key: a.index_key,
        index_name: a.index_name.clone(),
        pairs: a.total_pairs,
        top_pairs: a.top_pairs.len(),
      })
      .collect();

    let top_pairs: Vec<CorrelationPair> = indexes
      .iter()
      .flat_map(|a| a.top_pairs.iter().cloned())
      .collect();

    PairsAnalysis {
      total_pairs,
      total_top_pairs: top_pairs.len(),
      pairs_per_index,
      average_correlation: average,
      max_correlation: max,
      min_correlation: min,
      top_pairs,
      indexes,
      analysis_date,
    }
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::NaiveDate;
  use tracing_test::traced_test;

  use super::*;
  use crate::config::ReturnScale;
  use crate::index::IndexKey;
  use crate::market::InMemoryPriceSource;

  const BARS: usize = 80;

  fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
  }

  fn prices_from(r: impl Fn(f64) -> f64) -> Vec<f64> {
    let mut prices = vec![100.0];
    for t in 1..BARS {
      let last = prices[t - 1];
      prices.push(last * (1.0 + r(t as f64)));
    }
    prices
  }

  fn base(t: f64) -> f64 {
    0.01 * (0.9 * t).sin() + 0.004 * (2.3 * t).cos()
  }

  fn source() -> InMemoryPriceSource {
    let mut source = InMemoryPriceSource::new("memory");
    source.insert_closes("AAA", start(), &prices_from(base));
    source.insert_closes("BBB", start(), &prices_from(|t| base(t) + 0.002 * (5.1 * t).sin()));
    source.insert_closes("CCC", start(), &prices_from(|t| 0.01 * (1.7 * t + 0.3).cos()));
    source.insert_closes(
      "DDD",
      start(),
      &prices_from(|t| 0.012 * (0.9 * t + 0.15).sin() + 0.003 * (2.3 * t).cos()),
    );

    let aaa = prices_from(base);
    let dup: Vec<f64> = aaa
      .iter()
      .enumerate()
      .map(|(t, p)| p * 1.01_f64.powi(t as i32))
      .collect();
    source.insert_closes("DUP", start(), &dup);
    source.insert_closes("FLAT", start(), &[50.0; BARS]);
    source
  }

  fn universe(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
  }

  fn sequential() -> PairsConfig {
    PairsConfig {
      parallel: false,
      ..PairsConfig::default()
    }
  }

  fn engine() -> PairsEngine {
    PairsEngine::new(IndexesConfig::default(), sequential()).unwrap()
  }

  #[test]
  fn drifted_duplicate_is_excluded() {
    let analysis = engine().analyze(&universe(&["AAA", "DUP"]), &source());
    assert_eq!(analysis.total_pairs, 0);
    assert!(analysis.top_pairs.is_empty());
  }

  #[test]
  fn flat_series_yields_no_pairs() {
    let analysis = engine().analyze(&universe(&["AAA", "FLAT"]), &source());
    let sp500 = analysis.index(IndexKey::Sp500).unwrap();
    assert_eq!(sp500.total_pairs, 0);
    assert_eq!(sp500.average_correlation, 0.0);
    assert_eq!(analysis.total_pairs, 0);
  }

  #[test]
  fn pairs_respect_invariants() {
    let engine = engine();
    let source = source();
    let group = engine
      .partitioner()
      .group(IndexKey::Sp500, &universe(&["AAA", "BBB", "CCC", "DDD"]));
    let instruments = engine.load_instruments(&group.symbols, &source);
    let pairs = engine.analyze_pairs(&group, &instruments);

    assert_eq!(pairs.len(), 6);
    for pair in &pairs {
      assert_ne!(pair.asset1, pair.asset2);
      assert!(pair.correlation >= 0.0 && pair.correlation < 1.0);
      assert!(pair.long_prospectivity >= pair.short_prospectivity);
      assert_eq!(
        pair.strategy,
        format!("LONG {} / SHORT {}", pair.long_asset, pair.short_asset)
      );
      assert_eq!(pair.index_name, "S&P500");
    }
  }

  #[test]
  fn threshold_and_ranking() {
    let analysis = engine().analyze(&universe(&["AAA", "BBB", "CCC", "DDD"]), &source());

    assert_eq!(analysis.total_pairs, 6);
    assert_eq!(analysis.total_top_pairs, 3);

    let legs: Vec<(&str, &str)> = analysis
      .top_pairs
      .iter()
      .map(|p| (p.asset1.as_str(), p.asset2.as_str()))
      .collect();
    assert_eq!(legs, vec![("AAA", "BBB"), ("AAA", "DDD"), ("BBB", "DDD")]);

    for w in analysis.top_pairs.windows(2) {
      assert!(w[0].correlation >= w[1].correlation);
    }
    assert!(analysis.top_pairs.iter().all(|p| p.correlation >= 0.7));
    assert!(analysis.min_correlation < 0.7);
    assert!(analysis.max_correlation > 0.95);
  }

  #[test]
  fn top_pairs_are_capped() {
    let mut indexes = IndexesConfig::default();
    indexes.default_top_pairs_count = 2;
    let engine = PairsEngine::new(indexes, sequential()).unwrap();
    let analysis = engine.analyze(&universe(&["AAA", "BBB", "CCC", "DDD"]), &source());

    assert_eq!(analysis.total_pairs, 6);
    assert_eq!(analysis.top_pairs.len(), 2);
    assert_eq!(analysis.top_pairs[0].asset2, "BBB");
  }

  #[test]
  #[traced_test]
  fn missing_symbol_is_excluded() {
    let analysis = engine().analyze(&universe(&["AAA", "BBB", "GONE"]), &source());
    assert_eq!(analysis.total_pairs, 1);
    assert!(logs_contain("price history unavailable"));
  }

  #[test]
  fn groups_are_analyzed_separately() {
    let mut indexes = IndexesConfig::default();
    indexes.set_members(IndexKey::Nasdaq, ["CCC", "DDD"]);
    let engine = PairsEngine::new(indexes, sequential()).unwrap();
    let analysis = engine.analyze(&universe(&["AAA", "BBB", "CCC", "DDD"]), &source());

    assert_eq!(analysis.indexes.len(), 2);
    let counts: Vec<(IndexKey, usize)> = analysis
      .pairs_per_index
      .iter()
      .map(|c| (c.index_key, c.pairs))
      .collect();
    assert_eq!(counts, vec![(IndexKey::Sp500, 1), (IndexKey::Nasdaq, 1)]);
    assert_eq!(analysis.total_pairs, 2);

    let nasdaq = analysis.index(IndexKey::Nasdaq).unwrap();
    assert!(nasdaq.top_pairs.is_empty());
  }

  #[test]
  fn disabled_groups_are_skipped() {
    let mut indexes = IndexesConfig::default();
    indexes.set_members(IndexKey::Rgbi, ["CCC", "DDD"]);
    let engine = PairsEngine::new(indexes, sequential()).unwrap();
    let analysis = engine.analyze(&universe(&["AAA", "BBB", "CCC", "DDD"]), &source());

    assert_eq!(analysis.indexes.len(), 1);
    assert_eq!(analysis.total_pairs, 1);
    assert!(analysis.index(IndexKey::Rgbi).is_none());
  }

  #[test]
  fn aggregate_averages_over_all_pairs() {
    let analysis = engine().analyze(&universe(&["AAA", "BBB", "CCC", "DDD"]), &source());
    let sp500 = analysis.index(IndexKey::Sp500).unwrap();
    assert_abs_diff_eq!(analysis.average_correlation, sp500.average_correlation, epsilon = 1e-12);
  }

  #[test]
  fn parallel_matches_sequential() {
    let mut indexes = IndexesConfig::default();
    indexes.set_members(IndexKey::Nasdaq, ["CCC", "DDD"]);
    let symbols = universe(&["AAA", "BBB", "CCC", "DDD"]);
    let source = source();

    let seq = PairsEngine::new(indexes.clone(), sequential())
      .unwrap()
      .analyze(&symbols, &source);
    let par = PairsEngine::new(indexes, PairsConfig::default())
      .unwrap()
      .analyze(&symbols, &source);

    assert_eq!(seq.total_pairs, par.total_pairs);
    assert_eq!(seq.top_pairs, par.top_pairs);
    assert_eq!(seq.pairs_per_index, par.pairs_per_index);
  }

  #[test]
  fn fractional_scale_keeps_correlations() {
    let source = source();
    let percent = engine().analyze(&universe(&["AAA", "BBB"]), &source);
    let fraction = PairsEngine::new(
      IndexesConfig::default(),
      PairsConfig {
        return_scale: ReturnScale::Fraction,
        ..sequential()
      },
    )
    .unwrap()
    .analyze(&universe(&["AAA", "BBB"]), &source);

    assert_abs_diff_eq!(
      percent.top_pairs[0].correlation,
      fraction.top_pairs[0].correlation,
      epsilon = 1e-9
    );
  }

  #[test]
  fn invalid_horizon_is_rejected() {
    let config = PairsConfig {
      horizon_days: 0,
      ..PairsConfig::default()
    };
    assert!(PairsEngine::new(IndexesConfig::default(), config).is_err());
  }
}
