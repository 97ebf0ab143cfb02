//! User agent pool
//!
//! Every session presents one identity, drawn uniformly at random from a
//! fixed pool. The pool itself never changes after construction.

use crate::config::IdentityConfig;
use crate::ConfigError;

/// A fixed, non-empty set of user agent strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPool {
    agents: Vec<String>,
}

impl IdentityPool {
    /// Creates a pool from the given user agents
    ///
    /// # Returns
    ///
    /// * `Ok(IdentityPool)` - The pool
    /// * `Err(ConfigError)` - The list was empty
    pub fn new(agents: Vec<String>) -> Result<Self, ConfigError> {
        if agents.is_empty() {
            return Err(ConfigError::Validation(
                "identity pool must contain at least one user agent".to_string(),
            ));
        }
        Ok(Self { agents })
    }

    /// Creates a pool from the `[identity]` configuration section
    pub fn from_config(config: &IdentityConfig) -> Result<Self, ConfigError> {
        Self::new(config.pool.clone())
    }

    /// Picks one user agent uniformly at random
    pub fn random_identity(&self) -> &str {
        // Non-empty by construction
        &self.agents[rand::random_range(0..self.agents.len())]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn contains(&self, agent: &str) -> bool {
        self.agents.iter().any(|a| a == agent)
    }
}
