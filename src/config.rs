use crate::error::{Error, Result};
use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    /// Base URL under which the acknowledge/confirm callback links are reachable.
    pub public_base_url: String,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub calendar_api_url: String,
    pub calendar_api_key: String,
    pub interviewer_email: String,
    pub company_name: String,
    pub max_interviews_per_day: i64,
    pub lookahead_days: u32,
    pub daily_slot_template: Vec<NaiveTime>,
    pub slot_duration_minutes: i64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            public_base_url: get_env("PUBLIC_BASE_URL")?,
            email_api_url: get_env("EMAIL_API_URL")?,
            email_api_key: get_env("EMAIL_API_KEY")?,
            email_from: get_env("EMAIL_FROM")?,
            calendar_api_url: get_env("CALENDAR_API_URL")?,
            calendar_api_key: get_env("CALENDAR_API_KEY")?,
            interviewer_email: get_env("INTERVIEWER_EMAIL")?,
            company_name: get_env_or("COMPANY_NAME", "Tek Leaders"),
            max_interviews_per_day: get_env_parse_or("MAX_INTERVIEWS_PER_DAY", 3)?,
            lookahead_days: get_env_parse_or("LOOKAHEAD_DAYS", 30)?,
            daily_slot_template: parse_slot_template(&get_env_or(
                "DAILY_SLOT_TEMPLATE",
                "10:00,13:00,15:30",
            ))?,
            slot_duration_minutes: get_env_parse_or("SLOT_DURATION_MINUTES", 45)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

/// Parses a comma-separated list of `HH:MM` times, e.g. `10:00,13:00,15:30`.
pub fn parse_slot_template(raw: &str) -> Result<Vec<NaiveTime>> {
    let times: Vec<NaiveTime> = raw
        .split(',')
        .map(|part| {
            NaiveTime::parse_from_str(part.trim(), "%H:%M").map_err(|e| {
                Error::Config(format!("Invalid DAILY_SLOT_TEMPLATE entry '{}': {}", part, e))
            })
        })
        .collect::<Result<_>>()?;
    if times.is_empty() {
        return Err(Error::Config("DAILY_SLOT_TEMPLATE must not be empty".to_string()));
    }
    Ok(times)
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_template_parses_times_in_order() {
        let times = parse_slot_template("10:00, 13:00 ,15:30").unwrap();
        assert_eq!(times.len(), 3);
        assert_eq!(times[0], NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(times[2], NaiveTime::from_hms_opt(15, 30, 0).unwrap());
    }

    #[test]
    fn slot_template_rejects_garbage() {
        assert!(parse_slot_template("morning,noon").is_err());
        assert!(parse_slot_template("").is_err());
    }
}
