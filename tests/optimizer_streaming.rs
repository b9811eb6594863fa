use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use smartdca::application::market_data::MarketDataService;
use smartdca::application::optimization::genetic::GeneticConfig;
use smartdca::application::optimization::optimizer::ParameterGrid;
use smartdca::application::optimization::{EngineError, EngineSettings, OptimizeEngine, StrategyRequest};
use smartdca::application::streaming::StreamOutcome;
use smartdca::domain::errors::ValidationError;
use smartdca::domain::market::{Frequency, MarketDay};
use smartdca::domain::optimization::OptimizerEvent;
use smartdca::infrastructure::observability::Metrics;
use smartdca::infrastructure::persistence::InMemoryMarketDataRepository;
use std::sync::Arc;
use std::time::Duration;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
}

/// A year of daily rows where greed peaks coincide with price peaks
fn market() -> Vec<MarketDay> {
    (0..365u64)
        .map(|i| {
            let wave = (i % 60) as i64 - 30;
            let fgi = (50 + wave * 3 / 2).clamp(0, 100) as u8;
            MarketDay::new(
                start() + Days::new(i),
                dec!(9000) + Decimal::from(wave * 40) + Decimal::from(i * 3),
                fgi,
            )
        })
        .collect()
}

fn small_grid() -> ParameterGrid {
    ParameterGrid {
        fg_threshold_high: vec![60, 70, 80],
        fg_threshold_low: vec![20, 30, 40],
        bag_bonus_pct: vec![dec!(25), dec!(50)],
        bag_bonus_max_multiplier: vec![dec!(1), dec!(2)],
        ..ParameterGrid::default()
    }
}

fn engine(grid: ParameterGrid, stream_capacity: usize) -> OptimizeEngine {
    let repository = Arc::new(InMemoryMarketDataRepository::new(market()));
    let market_data = Arc::new(MarketDataService::new(repository));
    let settings = EngineSettings {
        grid,
        threads: Some(2),
        stream_capacity,
        ..EngineSettings::default()
    };
    OptimizeEngine::new(market_data, Metrics::new().unwrap(), settings).unwrap()
}

fn request() -> StrategyRequest {
    StrategyRequest::new(dec!(100), start(), Frequency::Weekly)
}

fn phase_rank(event: &OptimizerEvent) -> u8 {
    match event {
        OptimizerEvent::PrimaryStart { .. } => 0,
        OptimizerEvent::PrimaryProgress { .. } => 1,
        OptimizerEvent::PrimaryEnd { .. } => 2,
        OptimizerEvent::RefineProgress { .. } => 3,
        OptimizerEvent::Finish { .. } => 4,
    }
}

#[tokio::test]
async fn test_stream_emits_phases_in_order() {
    let engine = engine(small_grid(), 4);

    let mut stream = engine.stream_grid(request()).await.unwrap();
    let mut events = Vec::new();
    while let Some(event) = stream.recv().await {
        events.push(event);
    }
    assert_eq!(stream.close().await.unwrap(), StreamOutcome::Completed);

    assert!(matches!(events[0], OptimizerEvent::PrimaryStart { total: 36 }));
    assert!(events.last().unwrap().is_terminal());
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, OptimizerEvent::PrimaryEnd { .. }))
            .count(),
        1
    );
    for pair in events.windows(2) {
        assert!(phase_rank(&pair[0]) <= phase_rank(&pair[1]), "{:?}", pair);
    }
    let counts = |phase: u8| -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                OptimizerEvent::PrimaryProgress { count, .. } if phase == 1 => Some(*count),
                OptimizerEvent::RefineProgress { count, .. } if phase == 3 => Some(*count),
                _ => None,
            })
            .collect()
    };
    for phase in [1, 3] {
        let counts = counts(phase);
        assert!(!counts.is_empty());
        assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{:?}", counts);
    }

    let OptimizerEvent::Finish {
        best,
        tested_phase1,
        tested_phase2,
    } = events.last().unwrap()
    else {
        unreachable!();
    };
    assert_eq!(*tested_phase1, 36);
    assert!(*tested_phase2 > 0);
    assert!(best.is_some());
    assert_eq!(engine.metrics().runs_count("completed"), 1);
    assert_eq!(engine.metrics().evaluations_count() as usize, 36 + tested_phase2);
}

#[tokio::test]
async fn test_streamed_best_matches_one_shot_run() {
    let engine = engine(small_grid(), 8);

    let mut stream = engine.stream_grid(request()).await.unwrap();
    let mut finish = None;
    while let Some(event) = stream.recv().await {
        if let OptimizerEvent::Finish { best, .. } = event {
            finish = best;
        }
    }

    let one_shot = engine.optimize_grid(request()).await.unwrap();
    let again = engine.optimize_grid(request()).await.unwrap();

    assert_eq!(one_shot, again);
    assert_eq!(finish, Some(one_shot.best));
    assert!(
        one_shot.second_best.is_none_or(|second| second.performance_pct <= one_shot.best.performance_pct)
    );

    // Replaying the winning parameters reproduces the reported score
    let replay = engine
        .smart_dca(request(), one_shot.best.params)
        .await
        .unwrap();
    assert_eq!(replay.performance_pct, one_shot.best.performance_pct);

    let phases = one_shot.phase_breakdown.unwrap();
    assert_eq!(phases.phase1_tests, 36);
    assert!(phases.phase1_performance.unwrap() <= one_shot.best.performance_pct);
    assert_eq!(one_shot.tested_count, phases.phase1_tests + phases.phase2_tests);
}

#[tokio::test]
async fn test_disconnect_cancels_run() {
    let engine = engine(ParameterGrid::default(), 2);

    let mut stream = engine.stream_grid(request()).await.unwrap();
    for _ in 0..3 {
        assert!(stream.recv().await.is_some());
    }

    let outcome = tokio::time::timeout(Duration::from_secs(30), stream.close())
        .await
        .expect("producer did not stop after disconnect")
        .unwrap();

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(engine.metrics().runs_count("cancelled"), 1);
    assert_eq!(engine.metrics().runs_count("completed"), 0);
    assert_eq!(engine.metrics().active_streams.get(), 0.0);
}

#[tokio::test]
async fn test_genetic_is_reproducible_with_seed() {
    let engine = engine(small_grid(), 4);
    let config = GeneticConfig {
        population_size: 12,
        generations: 5,
        seed: Some(7),
        ..GeneticConfig::default()
    };

    let first = engine
        .optimize_genetic(request(), Some(config.clone()))
        .await
        .unwrap();
    let second = engine.optimize_genetic(request(), Some(config)).await.unwrap();

    assert_eq!(first.best, second.best);
    assert_eq!(first.tested_count, second.tested_count);
    assert!(first.phase_breakdown.is_none());

    let params = first.best.params;
    assert!((60..=80).contains(&params.fg_threshold_high));
    assert!((20..=40).contains(&params.fg_threshold_low));
    assert!(params.fg_threshold_low < params.fg_threshold_high);
    assert!(params.bag_bonus_max_usd <= dec!(200));
}

async fn collect_events(engine: &OptimizeEngine) -> Vec<OptimizerEvent> {
    let mut stream = engine.stream_grid(request()).await.unwrap();
    let mut events = Vec::new();
    while let Some(event) = stream.recv().await {
        events.push(event);
    }
    stream.close().await.unwrap();
    events
}

#[tokio::test]
async fn test_stream_is_deterministic() {
    let engine = engine(small_grid(), 4);

    let first = collect_events(&engine).await;
    let second = collect_events(&engine).await;

    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test]
async fn test_oversized_amount_is_rejected_before_streaming() {
    let engine = engine(small_grid(), 4);
    let request = StrategyRequest::new(
        Decimal::from_scientific("1e27").unwrap(),
        start(),
        Frequency::Daily,
    );

    let err = engine.stream_grid(request).await.err().unwrap();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::AmountTooLarge { .. })
    ));
    assert!(matches!(
        engine.optimize_grid(request).await,
        Err(EngineError::Validation(ValidationError::AmountTooLarge { .. }))
    ));
    assert_eq!(engine.metrics().active_streams.get(), 0.0);
    assert_eq!(engine.metrics().runs_count("failed"), 0);
}
