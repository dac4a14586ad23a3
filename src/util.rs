const CHECK_INTERVAL: &str = "HEALTH_CHECK_INTERVAL";

const DEFAULT_INTERVAL: u64 = 30;

pub fn get_default_interval() -> u64 {
    let interval_from_env = std::env::var(CHECK_INTERVAL);
    interval_from_env.map_or(DEFAULT_INTERVAL, |res| {
        res.parse().unwrap_or(DEFAULT_INTERVAL)
    })
}

const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";

const DEFAULT_TIMEOUT: u64 = 10;

pub fn get_default_timeout() -> u64 {
    let timeout_from_env = std::env::var(REQUEST_TIMEOUT);
    timeout_from_env.map_or(DEFAULT_TIMEOUT, |res| {
        res.parse().unwrap_or(DEFAULT_TIMEOUT)
    })
}

const SLA_HOURS: &str = "DEFAULT_SLA_HOURS";

const DEFAULT_SLA_HOURS: i64 = 4;

pub fn get_default_sla_hours() -> i64 {
    let sla_from_env = std::env::var(SLA_HOURS);
    sla_from_env.map_or(DEFAULT_SLA_HOURS, |res| {
        res.parse().unwrap_or(DEFAULT_SLA_HOURS)
    })
}
