// src/exec/environment.rs

use std::collections::BTreeMap;

use crate::config::Environment;

/// Variables handed to a script process. The child starts from an empty
/// environment and receives exactly these.
pub type EnvVars = BTreeMap<String, String>;

/// Build the variable set for `policy`.
///
/// `Current` takes a snapshot of this process's variables at call time;
/// entries that are not valid UTF-8 are skipped. The engine's own
/// environment is never modified.
pub fn build(policy: Environment) -> EnvVars {
    match policy {
        Environment::None => EnvVars::new(),
        Environment::Current => std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect(),
    }
}
