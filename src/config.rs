use std::{fmt::Display, path::PathBuf, str::FromStr};

use anyhow::Context;
use tracing::info;

use crate::Taxonomy;

pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    /// TOML synonym table; the built-in table is used when unset.
    pub taxonomy_path: Option<PathBuf>,
    pub recommendation_limit: usize,
}

impl Config {
    /// Reads the environment, honouring a `.env` file if one is present.
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://collab.db")?,
            max_connections: try_load("DB_MAX_CONNECTIONS", "16")?,
            taxonomy_path: dotenv::var("SKILL_TAXONOMY_PATH").ok().map(PathBuf::from),
            recommendation_limit: try_load("RECOMMENDATION_LIMIT", "6")?,
        })
    }

    pub fn taxonomy(&self) -> anyhow::Result<Taxonomy> {
        match &self.taxonomy_path {
            Some(path) => {
                let taxonomy = Taxonomy::load(path)?;
                info!(path = %path.display(), terms = taxonomy.len(), "loaded skill taxonomy");
                Ok(taxonomy)
            }
            None => Ok(Taxonomy::builtin()),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = dotenv::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value: {raw}"))
}
