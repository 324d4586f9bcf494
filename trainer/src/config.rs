use std::{env, num::NonZeroUsize, path::PathBuf, str::FromStr};

use ml_core::{InsulinModel, MultiOutputRegressor, RandomForestRegressor};

use crate::ConfigErr;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_STORE: &str = "artifacts";
const DEFAULT_N_ESTIMATORS: NonZeroUsize = NonZeroUsize::new(100).unwrap();
const DEFAULT_RANDOM_STATE: u64 = 42;

/// Startup settings of the training service.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub host: String,
    pub port: u16,
    pub store: PathBuf,
    pub n_estimators: NonZeroUsize,
    /// `None` seeds every fit from the OS.
    pub random_state: Option<u64>,
    pub max_depth: Option<usize>,
    /// How many published versions to keep, `None` keeps all of them.
    pub keep_versions: Option<usize>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store: PathBuf::from(DEFAULT_STORE),
            n_estimators: DEFAULT_N_ESTIMATORS,
            random_state: Some(DEFAULT_RANDOM_STATE),
            max_depth: None,
            keep_versions: None,
        }
    }
}

impl TrainerConfig {
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
        if let Some(n_estimators) = parse(&lookup, "N_ESTIMATORS")? {
            config.n_estimators = n_estimators;
        }
        match lookup("RANDOM_STATE") {
            Some(seed) if seed.trim().eq_ignore_ascii_case("none") => config.random_state = None,
            Some(_) => config.random_state = parse(&lookup, "RANDOM_STATE")?,
            None => {}
        }
        config.max_depth = parse(&lookup, "MAX_DEPTH")?;
        config.keep_versions = parse(&lookup, "KEEP_VERSIONS")?;

        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the unfitted model these settings describe.
    pub fn model(&self) -> InsulinModel {
        let forest = RandomForestRegressor::new(self.n_estimators)
            .with_random_state(self.random_state)
            .with_max_depth(self.max_depth);

        MultiOutputRegressor::new(forest)
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

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = TrainerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.addr(), "127.0.0.1:5000");
        assert_eq!(config.n_estimators.get(), 100);
        assert_eq!(config.random_state, Some(42));
        assert_eq!(config.max_depth, None);
        assert_eq!(config.keep_versions, None);
    }

    #[test]
    fn reads_every_variable() {
        let config = TrainerConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("MODEL_STORE", "/tmp/models"),
            ("N_ESTIMATORS", "25"),
            ("RANDOM_STATE", "none"),
            ("MAX_DEPTH", "8"),
            ("KEEP_VERSIONS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.store, PathBuf::from("/tmp/models"));
        assert_eq!(config.n_estimators.get(), 25);
        assert_eq!(config.random_state, None);
        assert_eq!(config.max_depth, Some(8));
        assert_eq!(config.keep_versions, Some(3));

        assert!(!config.model().is_fitted());
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = TrainerConfig::from_lookup(lookup(&[("N_ESTIMATORS", "0")])).unwrap_err();
        assert_eq!(err.var, "N_ESTIMATORS");

        let err = TrainerConfig::from_lookup(lookup(&[("RANDOM_STATE", "-1")])).unwrap_err();
        assert_eq!(err.var, "RANDOM_STATE");

        let err = TrainerConfig::from_lookup(lookup(&[("MAX_DEPTH", "deep")])).unwrap_err();
        assert_eq!(err.var, "MAX_DEPTH");
    }
}
