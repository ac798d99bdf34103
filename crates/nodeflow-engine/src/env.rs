//! The env-var window: executions are admitted one at a time, and the
//! request's env-var map is applied and restored around the run.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tokio::sync::Mutex;

static EXECUTION_LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();

/// Process-wide admission lock. Environment variables are process-global
/// state, so while any execution is inside its env window no other
/// execution may observe the host environment; serializing all
/// executions is the simplest contract that guarantees it.
pub fn execution_lock() -> Arc<Mutex<()>> {
    EXECUTION_LOCK
        .get_or_init(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Applies an env-var map on construction and restores the prior state
/// on drop, on every exit path. Previously-unset keys are removed again.
pub struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub fn apply(vars: &HashMap<String, String>) -> Self {
        let mut saved = Vec::with_capacity(vars.len());
        for (key, value) in vars {
            saved.push((key.clone(), std::env::var(key).ok()));
            std::env::set_var(key, value);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, previous) in &self.saved {
            match previous {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_prior_state() {
        std::env::set_var("NODEFLOW_ENV_TEST_EXISTING", "before");
        std::env::remove_var("NODEFLOW_ENV_TEST_FRESH");

        let mut vars = HashMap::new();
        vars.insert("NODEFLOW_ENV_TEST_EXISTING".to_string(), "during".to_string());
        vars.insert("NODEFLOW_ENV_TEST_FRESH".to_string(), "during".to_string());

        {
            let _guard = EnvGuard::apply(&vars);
            assert_eq!(
                std::env::var("NODEFLOW_ENV_TEST_EXISTING").unwrap(),
                "during"
            );
            assert_eq!(std::env::var("NODEFLOW_ENV_TEST_FRESH").unwrap(), "during");
        }

        assert_eq!(
            std::env::var("NODEFLOW_ENV_TEST_EXISTING").unwrap(),
            "before"
        );
        assert!(std::env::var("NODEFLOW_ENV_TEST_FRESH").is_err());
        std::env::remove_var("NODEFLOW_ENV_TEST_EXISTING");
    }
}
