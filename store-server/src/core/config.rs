/// Server configuration for the workflow core
///
/// # Environment variables
///
/// Every knob can be overridden through the environment:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/store/core | Working directory (database files) |
/// | ENVIRONMENT | development | Runtime environment |
/// | TAX_RATE_PERCENT | 5.0 | Tax as a percentage of the subtotal |
/// | DELIVERY_FEE | 40.0 | Flat delivery fee |
/// | FREE_DELIVERY_THRESHOLD | 500.0 | Subtotal at or above which delivery is free |
/// | OTP_TTL_MINUTES | 10 | One-time code lifetime |
/// | OTP_MAX_ATTEMPTS | 3 | Verification attempts before a code goes inert |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/store TAX_RATE_PERCENT=12 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the redb database
    pub work_dir: String,
    /// Runtime environment: development | staging | production
    pub environment: String,

    // === Pricing ===
    /// Tax rate as a percentage of the subtotal
    pub tax_rate_percent: f64,
    /// Flat delivery fee charged below the free-delivery threshold
    pub delivery_fee: f64,
    /// Subtotal at or above which the delivery fee is waived
    pub free_delivery_threshold: f64,

    // === Verification codes ===
    /// Code lifetime in minutes
    pub otp_ttl_minutes: i64,
    /// Attempts allowed before a code becomes permanently inert
    pub otp_max_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/store/core".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            tax_rate_percent: std::env::var("TAX_RATE_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5.0),
            delivery_fee: std::env::var("DELIVERY_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(40.0),
            free_delivery_threshold: std::env::var("FREE_DELIVERY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500.0),
            otp_ttl_minutes: std::env::var("OTP_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            otp_max_attempts: std::env::var("OTP_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }

    /// Override the working directory, for test scenarios
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
