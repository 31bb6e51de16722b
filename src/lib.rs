pub mod analytical;
pub mod config;
pub mod error;
pub mod formulas;
pub mod logger;
pub mod metrics;
pub mod radio;
pub mod report;
pub mod simulation;
pub mod sweep;

pub mod constants {
    /// Half-width of the sensing window used for neighbour counts, in metres.
    pub const SENSING_WINDOW_M: i64 = 2000;
    pub const SHADOWING_STD_DEV_DB: f64 = 3.0;
    pub const SENSING_STEP_DB: f64 = 3.0;
    pub const MAX_NUMEROLOGY: u8 = 6;
    pub const NR_SUBFRAME_S: f64 = 0.001;

    pub const DEFAULT_PRR_THRESHOLD: f64 = 0.98;
    pub const BETA_TOLERANCE: f64 = 1e-3;
    pub const LANE_DENSITY_DIVISOR: f64 = 40.0;

    pub const ACTIVE_LOGGER: bool = true;
    pub const LOGGER_PRINTLN: bool = true;

    pub const RUN_LOG_PATH: &str = "analysis_log.txt";
    pub const DEFAULT_OUTPUT_DIR: &str = "analysis_output";
    pub const METRICS_CSV: &str = "analytical_simulation_metrics.csv";
    pub const COMPARISON_CSV: &str = "analytical_vs_simulation.csv";
    pub const RANGE_CSV: &str = "communication_range.csv";
    pub const SUMMARY_JSON: &str = "run_summary.json";
}
