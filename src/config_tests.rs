use crate::config::Config;
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const VARS: [&str; 13] = [
    "DATABASE_URL",
    "MARKET_DATA_CSV",
    "SERVER_BIND_ADDRESS",
    "SERVER_PORT",
    "STREAM_QUEUE_CAPACITY",
    "OPTIMIZER_THREADS",
    "GRID_CONFIG",
    "GENETIC_POPULATION",
    "GENETIC_GENERATIONS",
    "GENETIC_MUTATION_RATE",
    "GENETIC_ELITISM",
    "GENETIC_SEED",
    "OBSERVABILITY_INTERVAL",
];

fn clear_vars() {
    for var in VARS {
        // SAFETY: tests touching the environment hold ENV_LOCK
        unsafe { env::remove_var(var) };
    }
}

fn set_var(key: &str, value: &str) {
    // SAFETY: tests touching the environment hold ENV_LOCK
    unsafe { env::set_var(key, value) };
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_vars();

    let config = Config::from_env().unwrap();

    assert_eq!(config.server.socket_address(), "127.0.0.1:5000");
    assert_eq!(config.server.stream_queue_capacity, 32);
    assert_eq!(config.optimizer.threads, None);
    assert_eq!(config.optimizer.genetic.population_size, 40);
    assert_eq!(config.optimizer.genetic.seed, None);
    assert_eq!(config.storage.database_url, "sqlite://data/smartdca.db");
    assert_eq!(config.observability.interval_seconds, 60);

    let settings = config.engine_settings().unwrap();
    assert_eq!(settings.grid.primary_size(), 8000);
}

#[test]
fn test_config_overrides() {
    let _guard = get_env_lock().lock().unwrap();
    clear_vars();
    set_var("SERVER_PORT", "8080");
    set_var("STREAM_QUEUE_CAPACITY", "4");
    set_var("OPTIMIZER_THREADS", "2");
    set_var("GENETIC_POPULATION", "16");
    set_var("GENETIC_SEED", "42");
    set_var("DATABASE_URL", "sqlite::memory:");

    let config = Config::from_env().unwrap();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.stream_queue_capacity, 4);
    assert_eq!(config.optimizer.threads, Some(2));
    assert_eq!(config.optimizer.genetic.population_size, 16);
    assert_eq!(config.optimizer.genetic.seed, Some(42));
    assert_eq!(config.storage.database_url, "sqlite::memory:");

    clear_vars();
}

#[test]
fn test_invalid_values_are_rejected() {
    let _guard = get_env_lock().lock().unwrap();
    clear_vars();

    set_var("SERVER_PORT", "not-a-port");
    assert!(Config::from_env().is_err());
    clear_vars();

    set_var("STREAM_QUEUE_CAPACITY", "0");
    assert!(Config::from_env().is_err());
    clear_vars();

    // Elitism must stay below the population
    set_var("GENETIC_POPULATION", "4");
    set_var("GENETIC_ELITISM", "4");
    assert!(Config::from_env().is_err());
    clear_vars();
}

#[test]
fn test_grid_config_file() {
    let _guard = get_env_lock().lock().unwrap();
    clear_vars();

    let path = env::temp_dir().join(format!("smartdca-grid-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"
fg_threshold_high = [70, 80]
fg_threshold_low = [20, 30]
bag_bonus_pct = [50]
bag_bonus_max_multiplier = [1.0, 2.0]
"#,
    )
    .unwrap();
    set_var("GRID_CONFIG", path.to_str().unwrap());

    let settings = Config::from_env().unwrap().engine_settings().unwrap();
    assert_eq!(settings.grid.primary_size(), 8);

    clear_vars();
    std::fs::remove_file(&path).unwrap();
}
