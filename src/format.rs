use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Output format for structured data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// JSON - machine-parseable
    Json,
    /// Plain text - stable, pipe-friendly lines
    Text,
    /// Human-oriented tables and headers
    #[default]
    Pretty,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "pretty" => Ok(Self::Pretty),
            _ => bail!("Invalid format '{}'. Use: json, text, or pretty", s),
        }
    }
}

impl OutputFormat {
    /// Pick the effective format: an explicit CLI choice wins over config.
    #[must_use]
    pub fn resolve(cli: Option<Self>, config: Self) -> Self {
        cli.unwrap_or(config)
    }

    /// Serialize data to the requested format.
    ///
    /// # Errors
    /// Returns an error for serialization failures, or if called for a
    /// non-structured format — Text and Pretty output is composed by the
    /// caller, not serialized.
    pub fn serialize<T: Serialize>(self, data: &T) -> Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(data)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}")),
            Self::Text | Self::Pretty => {
                bail!("Text/Pretty formats should not use serialize()")
            }
        }
    }
}
