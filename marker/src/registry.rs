//! Lookup table from strategy id to grading strategy.

use std::collections::HashMap;
use std::sync::Arc;

use crate::strategies::{
    exact_match::ExactMatchStrategy, manual::ManualStrategy,
    multiple_choice::MultipleChoiceStrategy, regex_match::RegexMatchStrategy,
};
use crate::traits::strategy::GradingStrategy;

/// Maps strategy ids to the strategies that handle them.
///
/// Built once at start-up and shared read-only between workers. A missing id
/// is an ordinary outcome of [`StrategyRegistry::get`], not an error.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn GradingStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in strategy.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ExactMatchStrategy));
        registry.register(Arc::new(RegexMatchStrategy));
        registry.register(Arc::new(MultipleChoiceStrategy));
        registry.register(Arc::new(ManualStrategy));
        registry
    }

    /// Adds `strategy` under its own id, replacing any earlier registration.
    pub fn register(&mut self, strategy: Arc<dyn GradingStrategy>) -> &mut Self {
        let id = strategy.strategy_id().to_string();
        if self.strategies.insert(id.clone(), strategy).is_some() {
            tracing::debug!(strategy_id = %id, "Replaced grading strategy");
        }
        self
    }

    pub fn get(&self, strategy_id: &str) -> Option<Arc<dyn GradingStrategy>> {
        self.strategies.get(strategy_id).cloned()
    }

    pub fn contains(&self, strategy_id: &str) -> bool {
        self.strategies.contains_key(strategy_id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.ids())
            .finish()
    }
}
