use serde::{Deserialize, Serialize};

/// Main configuration structure for Mender.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Learning-session parameters (cycle budget, epsilon schedule)
    #[serde(default)]
    pub learning: LearningConfig,

    /// Guardrail thresholds
    #[serde(default)]
    pub guardrails: GuardrailConfig,

    /// Reward-formula coefficients
    #[serde(default)]
    pub reward: RewardConfig,

    /// Judgment-oracle configuration
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Learning-session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LearningConfig {
    /// Number of incident cycles to run per session
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,

    /// Starting exploration rate
    #[serde(default = "default_epsilon_initial")]
    pub epsilon_initial: f64,

    /// Exploration-rate floor
    #[serde(default = "default_epsilon_min")]
    pub epsilon_min: f64,

    /// Multiplicative decay applied once per completed cycle
    #[serde(default = "default_epsilon_decay")]
    pub epsilon_decay: f64,

    /// RNG seed for reproducible sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

const fn default_max_cycles() -> u32 {
    10
}

const fn default_epsilon_initial() -> f64 {
    0.2
}

const fn default_epsilon_min() -> f64 {
    0.05
}

const fn default_epsilon_decay() -> f64 {
    0.95
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            max_cycles: default_max_cycles(),
            epsilon_initial: default_epsilon_initial(),
            epsilon_min: default_epsilon_min(),
            epsilon_decay: default_epsilon_decay(),
            seed: None,
        }
    }
}

/// Guardrail thresholds. All limits are per incident cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GuardrailConfig {
    /// Master switch; when false every action is allowed
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum running instances required before a restart or rollback
    #[serde(default = "default_min_instances")]
    pub min_instances: u32,

    /// Upper bound on horizontal scale-out targets
    #[serde(default = "default_max_horizontal_instances")]
    pub max_horizontal_instances: u32,

    /// Upper bound on vertical CPU allocation, in cores
    #[serde(default = "default_max_vertical_cpu")]
    pub max_vertical_cpu: f64,

    /// Upper bound on vertical memory allocation, in GB
    #[serde(default = "default_max_vertical_memory")]
    pub max_vertical_memory_gb: f64,

    /// Lowest settable timeout
    #[serde(default = "default_min_timeout_ms")]
    pub min_timeout_ms: u32,

    /// Highest settable timeout
    #[serde(default = "default_max_timeout_ms")]
    pub max_timeout_ms: u32,

    /// Cost budget per incident
    #[serde(default = "default_cost_budget")]
    pub cost_budget: f64,

    /// Restart ceiling per incident
    #[serde(default = "default_max_restarts")]
    pub max_restarts_per_incident: u32,

    /// Rollback ceiling per incident
    #[serde(default = "default_max_rollbacks")]
    pub max_rollbacks_per_incident: u32,

    /// Total-action ceiling per incident
    #[serde(default = "default_max_total_actions")]
    pub max_total_actions: u32,

    /// Availability at or above which actions draw a warning
    #[serde(default = "default_healthy_threshold")]
    pub healthy_threshold: f64,
}

const fn default_true() -> bool {
    true
}

const fn default_min_instances() -> u32 {
    2
}

const fn default_max_horizontal_instances() -> u32 {
    10
}

const fn default_max_vertical_cpu() -> f64 {
    8.0
}

const fn default_max_vertical_memory() -> f64 {
    16.0
}

const fn default_min_timeout_ms() -> u32 {
    500
}

const fn default_max_timeout_ms() -> u32 {
    60_000
}

const fn default_cost_budget() -> f64 {
    50.0
}

const fn default_max_restarts() -> u32 {
    3
}

const fn default_max_rollbacks() -> u32 {
    1
}

const fn default_max_total_actions() -> u32 {
    10
}

const fn default_healthy_threshold() -> f64 {
    0.85
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            min_instances: default_min_instances(),
            max_horizontal_instances: default_max_horizontal_instances(),
            max_vertical_cpu: default_max_vertical_cpu(),
            max_vertical_memory_gb: default_max_vertical_memory(),
            min_timeout_ms: default_min_timeout_ms(),
            max_timeout_ms: default_max_timeout_ms(),
            cost_budget: default_cost_budget(),
            max_restarts_per_incident: default_max_restarts(),
            max_rollbacks_per_incident: default_max_rollbacks(),
            max_total_actions: default_max_total_actions(),
            healthy_threshold: default_healthy_threshold(),
        }
    }
}

/// Reward-formula coefficients. Defaults follow the documented model;
/// they are tunable, not invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RewardConfig {
    /// Flat bonus when the service ends the cycle restored
    #[serde(default = "default_restored_bonus")]
    pub restored_bonus: f64,

    /// Weight per millisecond of latency improvement
    #[serde(default = "default_latency_weight")]
    pub latency_weight: f64,

    /// Weight per point of availability improvement
    #[serde(default = "default_availability_weight")]
    pub availability_weight: f64,

    /// Weight per percentage point of CPU improvement
    #[serde(default = "default_cpu_weight")]
    pub cpu_weight: f64,

    /// Weight per percentage point of memory improvement
    #[serde(default = "default_memory_weight")]
    pub memory_weight: f64,

    /// Penalty per second of recovery time
    #[serde(default = "default_recovery_time_penalty")]
    pub recovery_time_penalty: f64,

    /// Penalty per unit of infrastructure cost
    #[serde(default = "default_cost_penalty")]
    pub cost_penalty: f64,

    /// Penalty per point of residual error rate
    #[serde(default = "default_error_rate_penalty")]
    pub error_rate_penalty: f64,

    /// Availability required to call the service restored
    #[serde(default = "default_restored_availability")]
    pub restored_availability: f64,

    /// Error rate that must stay below this bound for the service to count as restored
    #[serde(default = "default_restored_error_rate")]
    pub restored_error_rate: f64,
}

const fn default_restored_bonus() -> f64 {
    100.0
}

const fn default_latency_weight() -> f64 {
    0.1
}

const fn default_availability_weight() -> f64 {
    100.0
}

const fn default_cpu_weight() -> f64 {
    0.3
}

const fn default_memory_weight() -> f64 {
    0.3
}

const fn default_recovery_time_penalty() -> f64 {
    0.5
}

const fn default_cost_penalty() -> f64 {
    0.2
}

const fn default_error_rate_penalty() -> f64 {
    50.0
}

const fn default_restored_availability() -> f64 {
    0.95
}

const fn default_restored_error_rate() -> f64 {
    0.05
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            restored_bonus: default_restored_bonus(),
            latency_weight: default_latency_weight(),
            availability_weight: default_availability_weight(),
            cpu_weight: default_cpu_weight(),
            memory_weight: default_memory_weight(),
            recovery_time_penalty: default_recovery_time_penalty(),
            cost_penalty: default_cost_penalty(),
            error_rate_penalty: default_error_rate_penalty(),
            restored_availability: default_restored_availability(),
            restored_error_rate: default_restored_error_rate(),
        }
    }
}

/// Judgment-oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OracleConfig {
    /// Enable the HTTP oracle; when false the null oracle is used
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible endpoint
    #[serde(default = "default_oracle_base_url")]
    pub base_url: String,

    /// API key (can also be set via `MENDER_ORACLE__API_KEY`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model to use for judgments
    #[serde(default = "default_oracle_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
}

fn default_oracle_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_oracle_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_oracle_timeout() -> u64 {
    30
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_oracle_base_url(),
            api_key: None,
            model: default_oracle_model(),
            timeout_secs: default_oracle_timeout(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".mender/mender.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
