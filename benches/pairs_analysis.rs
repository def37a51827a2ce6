use chrono::NaiveDate;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use pairfolio::FrontierConfig;
use pairfolio::IndexesConfig;
use pairfolio::PairsConfig;
use pairfolio::PairsEngine;
use pairfolio::market::InMemoryPriceSource;
use pairfolio::portfolio::covariance_matrix;
use pairfolio::portfolio::efficient_frontier;
use pairfolio::portfolio::optimize_min_risk;

fn synthetic_returns(asset: usize, n: usize) -> Vec<f64> {
  let phase = asset as f64 * 0.37;
  (1..=n)
    .map(|t| {
      let t = t as f64;
      0.01 * (0.9 * t + phase).sin() + 0.004 * (2.3 * t + 1.7 * phase).cos()
    })
    .collect()
}

fn synthetic_prices(asset: usize, n: usize) -> Vec<f64> {
  let mut prices = Vec::with_capacity(n + 1);
  prices.push(100.0);
  for r in synthetic_returns(asset, n) {
    let last = prices[prices.len() - 1];
    prices.push(last * (1.0 + r));
  }
  prices
}

fn universe(size: usize) -> (Vec<String>, InMemoryPriceSource) {
  let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
  let mut source = InMemoryPriceSource::new("bench");
  for i in 0..size {
    source.insert_closes(format!("S{i:03}"), start, &synthetic_prices(i, 252));
  }
  (source.symbols(), source)
}

fn bench_pairs_by_universe(c: &mut Criterion) {
  let mut group = c.benchmark_group("pairs_by_universe");

  for &n in &[10, 50, 100, 200] {
    let (symbols, source) = universe(n);

    group.bench_with_input(BenchmarkId::new("sequential", n), &n, |b, _| {
      let config = PairsConfig {
        parallel: false,
        ..PairsConfig::default()
      };
      let engine = PairsEngine::new(IndexesConfig::default(), config).unwrap();
      b.iter(|| black_box(engine.analyze(&symbols, &source)));
    });
  }

  group.finish();
}

fn bench_portfolio(c: &mut Criterion) {
  let mut group = c.benchmark_group("portfolio");

  for &k in &[3, 10, 30] {
    let returns: Vec<Vec<f64>> = (0..k).map(|i| synthetic_returns(i, 252)).collect();
    let mu: Vec<f64> = returns
      .iter()
      .map(|r| r.iter().sum::<f64>() / r.len() as f64)
      .collect();
    let cov = covariance_matrix(&returns).unwrap();

    group.bench_with_input(BenchmarkId::new("covariance", k), &k, |b, _| {
      b.iter(|| black_box(covariance_matrix(&returns).unwrap()));
    });

    group.bench_with_input(BenchmarkId::new("optimize_min_risk", k), &k, |b, _| {
      b.iter(|| black_box(optimize_min_risk(&cov, &mu).unwrap()));
    });

    group.bench_with_input(BenchmarkId::new("efficient_frontier", k), &k, |b, _| {
      let config = FrontierConfig::default();
      b.iter(|| black_box(efficient_frontier(&cov, &mu, &config).unwrap()));
    });
  }

  group.finish();
}

criterion_group!(benches, bench_pairs_by_universe, bench_portfolio);
criterion_main!(benches);
