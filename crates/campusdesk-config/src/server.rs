use crate::env_parse;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub metrics_port: u16,
    /// Seconds between sweeps that delete expired notices and exams
    pub purge_interval_secs: u64,
    /// Days an expired exam is kept before the sweep deletes it
    pub exam_retention_days: i64,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", 3000),
            metrics_port: env_parse("METRICS_PORT", 9090),
            purge_interval_secs: env_parse("PURGE_INTERVAL_SECS", 300),
            exam_retention_days: env_parse("EXAM_RETENTION_DAYS", 30),
        }
    }
}
