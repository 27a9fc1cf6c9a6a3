use std::env;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::layout::PageGeometry;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error(transparent)]
    Geometry(#[from] DomainError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub page: PageGeometry,
}

impl AppConfig {
    /// Read `HOST`, `PORT`, `PAGE_WIDTH`, `PAGE_HEIGHT` and `PAGE_MARGIN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let a4 = PageGeometry::a4();
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080u16)?;
        let width = parse_or(&lookup, "PAGE_WIDTH", a4.width())?;
        let height = parse_or(&lookup, "PAGE_HEIGHT", a4.height())?;
        let margin = parse_or(&lookup, "PAGE_MARGIN", a4.margin())?;

        Ok(Self {
            host,
            port,
            page: PageGeometry::new(width, height, margin)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}
