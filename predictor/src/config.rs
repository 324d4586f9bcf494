use std::{env, path::PathBuf, str::FromStr};

use comms::{FeatureSchema, TargetLabel};

use crate::ConfigErr;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_STORE: &str = "artifacts";

/// Startup settings of the prediction service.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    pub host: String,
    pub port: u16,
    pub store: PathBuf,
    /// A pinned version id, `None` serves the current version.
    pub version: Option<String>,
    pub target: TargetLabel,
    pub strict_features: bool,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store: PathBuf::from(DEFAULT_STORE),
            version: None,
            target: TargetLabel::default(),
            strict_features: false,
        }
    }
}

impl PredictorConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigErr> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Args
    /// * `lookup` - Returns the value of a variable, or `None` if unset.
    ///
    /// # Errors
    /// A `ConfigErr` naming the first variable that doesn't parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigErr>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = parse(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(store) = lookup("MODEL_STORE") {
            config.store = PathBuf::from(store);
        }
        config.version = lookup("MODEL_VERSION").filter(|id| !id.trim().is_empty());
        if let Some(target) = parse(&lookup, "PREDICT_TARGET")? {
            config.target = target;
        }
        if let Some(strict) = parse(&lookup, "STRICT_FEATURES")? {
            config.strict_features = strict;
        }

        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the feature schema selected by `STRICT_FEATURES`.
    pub fn schema(&self) -> FeatureSchema {
        if self.strict_features {
            FeatureSchema::strict()
        } else {
            FeatureSchema::lenient()
        }
    }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigErr>
where
    T: FromStr,
    T::Err: ToString,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };

    value.trim().parse().map(Some).map_err(|e: T::Err| ConfigErr {
        var,
        value,
        reason: e.to_string(),
    })
}
