use crate::errors::{Error, Result};
use crate::gemini::DEFAULT_MODEL;
use crate::storage::DEFAULT_DATA_PATH;
use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 168;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const TOKEN_TTL_HOURS_RANGE: std::ops::RangeInclusive<i64> = 1..=8760;
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Process settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub cors_origin: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("data_path", &self.data_path)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("gemini_enabled", &self.gemini_api_key.is_some())
            .field("gemini_model", &self.gemini_model)
            .field("cors_origin", &self.cors_origin)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let jwt_secret =
            var("JWT_SECRET").ok_or_else(|| Error::Config("JWT_SECRET must be set".into()))?;
        let token_ttl_hours = parsed(var("TOKEN_TTL_HOURS"), "TOKEN_TTL_HOURS")?
            .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);
        let bcrypt_cost =
            parsed(var("BCRYPT_COST"), "BCRYPT_COST")?.unwrap_or(bcrypt::DEFAULT_COST);

        Ok(Self {
            port: parsed(var("PORT"), "PORT")?.unwrap_or(DEFAULT_PORT),
            data_path: var("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            jwt_secret,
            token_ttl_hours: within(token_ttl_hours, TOKEN_TTL_HOURS_RANGE, "TOKEN_TTL_HOURS")?,
            bcrypt_cost: within(bcrypt_cost, BCRYPT_COST_RANGE, "BCRYPT_COST")?,
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            cors_origin: var("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        })
    }
}

fn parsed<T: std::str::FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw}")))
        })
        .transpose()
}

fn within<T>(value: T, range: std::ops::RangeInclusive<T>, key: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(Error::Config(format!(
            "{key} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )))
    }
}
