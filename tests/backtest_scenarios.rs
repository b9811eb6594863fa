use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use smartdca::application::market_data::MarketDataService;
use smartdca::application::optimization::simulator::{BacktestRequest, Simulator};
use smartdca::application::optimization::{EngineError, EngineSettings, OptimizeEngine};
use smartdca::domain::errors::ValidationError;
use smartdca::domain::market::{Frequency, MarketDay, MarketSnapshot};
use smartdca::infrastructure::observability::Metrics;
use smartdca::infrastructure::persistence::InMemoryMarketDataRepository;
use std::sync::Arc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// One row on the 1st of every month, price rising linearly from 10 000
/// on the first month to 50 000 on the 24th
fn monthly_days(count: u32) -> Vec<MarketDay> {
    (0..count)
        .map(|i| {
            MarketDay::new(
                d(2018, 1, 1) + Months::new(i),
                dec!(10000) + dec!(40000) * Decimal::from(i) / dec!(23),
                50,
            )
        })
        .collect()
}

/// Daily rows with a drifting sawtooth price
fn daily_days(start: NaiveDate, count: u64) -> Vec<MarketDay> {
    (0..count)
        .map(|i| {
            MarketDay::new(
                start + Days::new(i),
                dec!(8000) + Decimal::from(i * 13 % 997) + Decimal::from(i * 5),
                (i % 101) as u8,
            )
        })
        .collect()
}

fn engine(days: Vec<MarketDay>) -> OptimizeEngine {
    let repository = Arc::new(InMemoryMarketDataRepository::new(days));
    let market_data = Arc::new(MarketDataService::new(repository));
    OptimizeEngine::new(market_data, Metrics::new().unwrap(), EngineSettings::default()).unwrap()
}

#[tokio::test]
async fn test_monthly_plan_buys_every_stored_month() {
    let engine = engine(monthly_days(24));

    let report = engine
        .backtest(BacktestRequest::new(dec!(100), d(2018, 1, 1), Frequency::Monthly))
        .await
        .unwrap();

    assert!(!report.data_unavailable);
    assert_eq!(report.num_purchases, 24);
    assert_eq!(report.purchases.len(), 24);
    assert_eq!(report.total_invested, dec!(2400));
    assert_eq!(report.progress.len(), 24);

    let last_price = dec!(50000);
    assert_eq!(report.purchases[23].price_usd, last_price);
    let expected_btc: Decimal = report.purchases.iter().map(|p| p.btc_acquired).sum();
    assert_eq!(report.total_btc, expected_btc);
    assert_eq!(report.final_value, report.total_btc * last_price);
    assert_eq!(report.lump_value, dec!(12000));

    // Steadily rising market: profitable, but behind a lump sum at the start
    assert!(report.performance_pct > Decimal::ZERO);
    assert!(report.final_value < report.lump_value);
}

#[tokio::test]
async fn test_progress_is_cumulative() {
    let engine = engine(monthly_days(6));

    let report = engine
        .backtest(BacktestRequest::new(dec!(50), d(2018, 1, 1), Frequency::Monthly))
        .await
        .unwrap();

    for pair in report.progress.windows(2) {
        assert!(pair[1].btc_cumulative >= pair[0].btc_cumulative);
        assert!(pair[0].date < pair[1].date);
    }
    assert!(report.progress.iter().all(|p| p.buy));
}

#[tokio::test]
async fn test_start_after_last_row_reports_unavailable() {
    let engine = engine(monthly_days(3));

    let report = engine
        .backtest(BacktestRequest::new(dec!(100), d(2030, 1, 1), Frequency::Weekly))
        .await
        .unwrap();

    assert!(report.data_unavailable);
    assert_eq!(report.num_purchases, 0);
    assert!(report.progress.is_empty());
}

#[tokio::test]
async fn test_weekly_plan_on_fixed_weekday() {
    // 2024-01-01 is a Monday
    let engine = engine(daily_days(d(2024, 1, 1), 28));

    let report = engine
        .backtest(BacktestRequest::new(dec!(25), d(2024, 1, 1), Frequency::Weekly).on_day(3))
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = report.purchases.iter().map(|p| p.date).collect();
    assert_eq!(
        dates,
        vec![d(2024, 1, 3), d(2024, 1, 10), d(2024, 1, 17), d(2024, 1, 24)]
    );
    assert_eq!(report.total_invested, dec!(100));
}

#[tokio::test]
async fn test_best_schedules_match_individual_backtests() {
    let days = daily_days(d(2020, 1, 1), 731);
    let snapshot = Arc::new(MarketSnapshot::new(days.clone()));
    let engine = engine(days);

    let outcomes = engine.best_schedules(dec!(100), d(2020, 1, 1)).await.unwrap();
    assert_eq!(outcomes.len(), 39);
    assert_eq!(
        outcomes.iter().filter(|o| o.frequency == Frequency::Weekly).count(),
        7
    );
    assert_eq!(
        outcomes.iter().filter(|o| o.frequency == Frequency::Monthly).count(),
        31
    );

    let simulator = Simulator::new(snapshot);
    for outcome in &outcomes {
        let request = match outcome.frequency {
            Frequency::Daily => BacktestRequest::new(dec!(100), d(2020, 1, 1), Frequency::Daily),
            frequency => BacktestRequest::new(dec!(100), d(2020, 1, 1), frequency).on_day(outcome.day),
        };
        let report = simulator.run(&request).unwrap();
        assert_eq!(outcome.num_purchases, report.num_purchases, "{:?}", outcome);
        assert_eq!(outcome.total_invested, report.total_invested);
        assert_eq!(outcome.final_value, report.final_value);
        assert_eq!(outcome.performance_pct, report.performance_pct);
    }

    let daily = outcomes
        .iter()
        .find(|o| o.frequency == Frequency::Daily)
        .unwrap();
    assert_eq!(daily.num_purchases, 731);
    assert_eq!(engine.metrics().simulations_count(), 39);
}

#[tokio::test]
async fn test_invalid_day_is_rejected() {
    let engine = engine(monthly_days(3));

    let err = engine
        .backtest(BacktestRequest::new(dec!(100), d(2018, 1, 1), Frequency::Weekly).on_day(8))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Invalid day 8"));
}

#[test]
fn test_backtest_is_deterministic() {
    let simulator = Simulator::new(Arc::new(MarketSnapshot::new(daily_days(d(2020, 1, 1), 400))));
    let request = BacktestRequest::new(dec!(33.33), d(2020, 1, 15), Frequency::Weekly).on_day(5);

    let first = simulator.run(&request).unwrap();
    let second = simulator.run(&request).unwrap();

    assert_eq!(
        serde_json::to_vec(&first.purchases).unwrap(),
        serde_json::to_vec(&second.purchases).unwrap()
    );
    assert_eq!(serde_json::to_vec(&first).unwrap(), serde_json::to_vec(&second).unwrap());
}

#[tokio::test]
async fn test_oversized_amount_is_a_validation_error() {
    let engine = engine(daily_days(d(2020, 1, 1), 730));
    let amount = Decimal::from_scientific("1e27").unwrap();

    let err = engine
        .backtest(BacktestRequest::new(amount, d(2020, 1, 1), Frequency::Daily))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::AmountTooLarge { .. })
    ));

    let err = engine.best_schedules(amount, d(2020, 1, 1)).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::AmountTooLarge { .. })
    ));
}
