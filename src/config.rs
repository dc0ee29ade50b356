//! Container options and their environment / JSON sources.
//!
//! Options are read once when the container is built. Environment variables
//! use the `FERROUS_IOC` prefix by default:
//!
//! | Variable | Field | Values |
//! |---|---|---|
//! | `FERROUS_IOC_MAX_DEPTH` | `max_depth` | positive integer |
//! | `FERROUS_IOC_DETECT_CYCLES` | `detect_cycles` | `true`/`false`/`1`/`0` |
//! | `FERROUS_IOC_SINGLETON_POLICY` | `singleton_policy` | `exclusive`/`first-commit-wins` |

use std::env;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Default prefix of the environment variables read by
/// [`ContainerOptions::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_IOC";

/// Default bound on nested resolutions.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How concurrent first resolutions of a singleton are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum SingletonPolicy {
    /// A per-registration lock is held while building; the constructor runs
    /// at most once. Threads whose builds wait on each other's locks fail
    /// with `CircularDependency` instead of blocking.
    #[default]
    Exclusive,
    /// Racing threads may each build an instance; the first one committed is
    /// returned to everyone and the others are dropped.
    FirstCommitWins,
}

impl SingletonPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SingletonPolicy::Exclusive => "exclusive",
            SingletonPolicy::FirstCommitWins => "first-commit-wins",
        }
    }
}

impl fmt::Display for SingletonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SingletonPolicy {
    type Err = DiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exclusive" => Ok(SingletonPolicy::Exclusive),
            "first-commit-wins" | "first_commit_wins" => Ok(SingletonPolicy::FirstCommitWins),
            _ => Err(DiError::Configuration {
                key: "singleton_policy".to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Engine options.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ContainerOptions, SingletonPolicy};
///
/// let options = ContainerOptions::default();
/// assert_eq!(options.max_depth, 256);
/// assert!(options.detect_cycles);
/// assert_eq!(options.singleton_policy, SingletonPolicy::Exclusive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Nested resolutions allowed below one top-level call
    pub max_depth: usize,
    /// Fail with `CircularDependency` when a key reappears on the path
    pub detect_cycles: bool,
    pub singleton_policy: SingletonPolicy,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            detect_cycles: true,
            singleton_policy: SingletonPolicy::Exclusive,
        }
    }
}

impl ContainerOptions {
    /// Reads `FERROUS_IOC_*` variables over the defaults.
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Reads `{PREFIX}_MAX_DEPTH`, `{PREFIX}_DETECT_CYCLES` and
    /// `{PREFIX}_SINGLETON_POLICY`. Unset variables keep their defaults.
    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        let mut options = Self::default();

        if let Some((key, value)) = env_value(prefix, "max_depth") {
            options.max_depth = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|depth| *depth > 0)
                .ok_or(DiError::Configuration { key, value })?;
        }
        if let Some((key, value)) = env_value(prefix, "detect_cycles") {
            options.detect_cycles = parse_bool(&value).ok_or(DiError::Configuration { key, value })?;
        }
        if let Some((key, value)) = env_value(prefix, "singleton_policy") {
            options.singleton_policy = value.parse().map_err(|_| DiError::Configuration { key, value })?;
        }

        options.validate()?;
        Ok(options)
    }

    /// Parses options from JSON; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        let options: Self = serde_json::from_str(json).map_err(|e| DiError::Configuration {
            key: "json".to_string(),
            value: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    pub(crate) fn validate(&self) -> DiResult<()> {
        if self.max_depth == 0 {
            return Err(DiError::Configuration {
                key: "max_depth".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

// Looks up `{PREFIX}_{FIELD}`, returning the variable name with its value.
fn env_value(prefix: &str, field: &str) -> Option<(String, String)> {
    let key = format!("{}_{}", prefix.to_uppercase(), field.to_uppercase());
    env::var(&key).ok().map(|value| (key, value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear(prefix: &str) {
        for field in ["MAX_DEPTH", "DETECT_CYCLES", "SINGLETON_POLICY"] {
            env::remove_var(format!("{}_{}", prefix, field));
        }
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear(ENV_PREFIX);
        env::set_var("FERROUS_IOC_MAX_DEPTH", "32");
        env::set_var("FERROUS_IOC_DETECT_CYCLES", "false");
        env::set_var("FERROUS_IOC_SINGLETON_POLICY", "first-commit-wins");

        let options = ContainerOptions::from_env().unwrap();
        assert_eq!(options.max_depth, 32);
        assert!(!options.detect_cycles);
        assert_eq!(options.singleton_policy, SingletonPolicy::FirstCommitWins);

        clear(ENV_PREFIX);
    }

    #[test]
    #[serial]
    fn unset_variables_keep_defaults() {
        clear("MYAPP_DI");
        env::set_var("MYAPP_DI_DETECT_CYCLES", "0");

        let options = ContainerOptions::from_env_with_prefix("myapp_di").unwrap();
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!options.detect_cycles);
        assert_eq!(options.singleton_policy, SingletonPolicy::Exclusive);

        clear("MYAPP_DI");
    }

    #[test]
    #[serial]
    fn invalid_values_are_reported_with_variable_name() {
        clear(ENV_PREFIX);
        env::set_var("FERROUS_IOC_MAX_DEPTH", "0");
        match ContainerOptions::from_env() {
            Err(DiError::Configuration { key, value }) => {
                assert_eq!(key, "FERROUS_IOC_MAX_DEPTH");
                assert_eq!(value, "0");
            }
            other => panic!("expected configuration error, got {:?}", other),
        }

        clear(ENV_PREFIX);
        env::set_var("FERROUS_IOC_SINGLETON_POLICY", "sometimes");
        assert!(matches!(
            ContainerOptions::from_env(),
            Err(DiError::Configuration { .. })
        ));
        clear(ENV_PREFIX);
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("Exclusive".parse::<SingletonPolicy>().unwrap(), SingletonPolicy::Exclusive);
        assert_eq!(
            " first_commit_wins ".parse::<SingletonPolicy>().unwrap(),
            SingletonPolicy::FirstCommitWins
        );
        assert_eq!(SingletonPolicy::FirstCommitWins.to_string(), "first-commit-wins");
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_options() {
        let options = ContainerOptions::from_json(r#"{"max_depth": 8, "singleton_policy": "first-commit-wins"}"#).unwrap();
        assert_eq!(options.max_depth, 8);
        assert!(options.detect_cycles);
        assert_eq!(options.singleton_policy, SingletonPolicy::FirstCommitWins);

        assert!(ContainerOptions::from_json(r#"{"max_depth": 0}"#).is_err());
        assert!(ContainerOptions::from_json("not json").is_err());
    }
}
