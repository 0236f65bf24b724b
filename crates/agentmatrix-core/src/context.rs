use crate::filter::{apply_filters, FilterCriteria, FilteredView};
use crate::{build_matrix, Agent, ComparisonMatrix, EntityStore, Feature, MatrixCell, Result, SupportRecord};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::debug;

/// Read-only, lazily loaded view of one dataset.
///
/// Owned by whoever serves requests (the API state, a CLI invocation) and
/// passed explicitly; each collection is loaded at most once and the full
/// matrix is built at most once.
pub struct DataContext<S: EntityStore> {
    store: S,
    agents: OnceCell<Vec<Agent>>,
    features: OnceCell<Vec<Feature>>,
    records: OnceCell<Vec<SupportRecord>>,
    matrix: OnceCell<ComparisonMatrix>,
}

impl<S: EntityStore> std::fmt::Debug for DataContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataContext")
            .field("agents_loaded", &self.agents.get().is_some())
            .field("features_loaded", &self.features.get().is_some())
            .field("records_loaded", &self.records.get().is_some())
            .field("matrix_built", &self.matrix.get().is_some())
            .finish()
    }
}

/// A feature together with one agent's cell for it.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSupport<'a> {
    pub feature: &'a Feature,
    pub cell: &'a MatrixCell,
}

/// An agent together with its cell for one feature.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSupport<'a> {
    pub agent: &'a Agent,
    pub cell: &'a MatrixCell,
}

static UNKNOWN_CELL: MatrixCell = MatrixCell {
    level: crate::SupportLevel::Unknown,
    notes: None,
    examples: None,
    sources: None,
    last_verified: None,
};

impl<S: EntityStore> DataContext<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            agents: OnceCell::new(),
            features: OnceCell::new(),
            records: OnceCell::new(),
            matrix: OnceCell::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn agents(&self) -> Result<&[Agent]> {
        self.agents
            .get_or_try_init(|| self.store.load_agents())
            .map(Vec::as_slice)
    }

    pub fn features(&self) -> Result<&[Feature]> {
        self.features
            .get_or_try_init(|| self.store.load_features())
            .map(Vec::as_slice)
    }

    pub fn support_records(&self) -> Result<&[SupportRecord]> {
        self.records
            .get_or_try_init(|| self.store.load_support_records())
            .map(Vec::as_slice)
    }

    /// The full matrix over every loaded agent and feature.
    pub fn matrix(&self) -> Result<&ComparisonMatrix> {
        self.matrix.get_or_try_init(|| {
            let matrix = build_matrix(self.agents()?, self.features()?, self.support_records()?);
            debug!(cells = matrix.cell_count(), "memoized comparison matrix");
            Ok(matrix)
        })
    }

    /// Forces every lazy value so later calls cannot fail.
    pub fn preload(&self) -> Result<()> {
        self.matrix().map(|_| ())
    }

    pub fn view(&self, criteria: &FilterCriteria) -> Result<FilteredView<'_>> {
        Ok(apply_filters(
            self.matrix()?,
            self.agents()?,
            self.features()?,
            criteria,
        ))
    }

    /// Resolves an agent by exact id, case-insensitive id, then alias.
    pub fn find_agent(&self, slug: &str) -> Result<Option<&Agent>> {
        let agents = self.agents()?;
        let needle = slug.trim().to_lowercase();
        Ok(agents
            .iter()
            .find(|a| a.id == needle)
            .or_else(|| agents.iter().find(|a| a.id.to_lowercase() == needle))
            .or_else(|| {
                agents
                    .iter()
                    .find(|a| a.aliases.iter().any(|alias| alias.to_lowercase() == needle))
            }))
    }

    /// Resolves a feature by exact id, case-insensitive id, then alias.
    pub fn find_feature(&self, slug: &str) -> Result<Option<&Feature>> {
        let features = self.features()?;
        let trimmed = slug.trim();
        let needle = trimmed.to_lowercase();
        Ok(features
            .iter()
            .find(|f| f.id == trimmed)
            .or_else(|| features.iter().find(|f| f.id.to_lowercase() == needle))
            .or_else(|| {
                features
                    .iter()
                    .find(|f| f.aliases.iter().any(|alias| alias.to_lowercase() == needle))
            }))
    }

    /// Every feature with the agent's cell, in feature order.
    pub fn agent_support(&self, agent_id: &str) -> Result<Vec<FeatureSupport<'_>>> {
        let matrix = self.matrix()?;
        Ok(self
            .features()?
            .iter()
            .map(|feature| FeatureSupport {
                feature,
                cell: matrix.cell(agent_id, &feature.id).unwrap_or(&UNKNOWN_CELL),
            })
            .collect())
    }

    /// Every agent with its cell for the feature, best support first.
    pub fn feature_support(&self, feature_id: &str) -> Result<Vec<AgentSupport<'_>>> {
        let matrix = self.matrix()?;
        let mut support: Vec<AgentSupport<'_>> = self
            .agents()?
            .iter()
            .map(|agent| AgentSupport {
                agent,
                cell: matrix.cell(&agent.id, feature_id).unwrap_or(&UNKNOWN_CELL),
            })
            .collect();
        support.sort_by_key(|s| s.cell.level);
        Ok(support)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, InMemoryEntityStore, MatrixError, SupportLevel};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> InMemoryEntityStore {
        InMemoryEntityStore::new(
            vec![
                Agent::new("cursor", "Cursor").with_aliases(["Cursor AI"]),
                Agent::new("windsurf", "Windsurf"),
                Agent::new("claude-dev", "Claude Dev").with_aliases(["cline"]),
            ],
            vec![
                Feature::new("mcp-support", "MCP", Category::Configuration)
                    .with_aliases(["Model Context Protocol"]),
                Feature::new("claude3-support", "Claude 3", Category::ModelSupport),
            ],
            vec![
                SupportRecord::new("windsurf", "mcp-support", SupportLevel::Partial),
                SupportRecord::new("claude-dev", "mcp-support", SupportLevel::Yes),
                SupportRecord::new("cursor", "mcp-support", SupportLevel::No),
            ],
        )
    }

    struct CountingStore {
        inner: InMemoryEntityStore,
        loads: AtomicUsize,
    }

    impl EntityStore for CountingStore {
        fn load_agents(&self) -> Result<Vec<Agent>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_agents()
        }

        fn load_features(&self) -> Result<Vec<Feature>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_features()
        }

        fn load_support_records(&self) -> Result<Vec<SupportRecord>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_support_records()
        }
    }

    struct FailingStore;

    impl EntityStore for FailingStore {
        fn load_agents(&self) -> Result<Vec<Agent>> {
            Err(MatrixError::NotFound("index".into()))
        }

        fn load_features(&self) -> Result<Vec<Feature>> {
            Ok(Vec::new())
        }

        fn load_support_records(&self) -> Result<Vec<SupportRecord>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn loads_each_collection_once() {
        let ctx = DataContext::new(CountingStore {
            inner: store(),
            loads: AtomicUsize::new(0),
        });
        ctx.preload().unwrap();
        ctx.matrix().unwrap();
        ctx.agents().unwrap();
        ctx.view(&FilterCriteria::default()).unwrap();
        assert_eq!(ctx.store().loads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn load_failure_propagates() {
        let ctx = DataContext::new(FailingStore);
        assert!(ctx.matrix().is_err());
        assert!(ctx.preload().is_err());
    }

    #[test]
    fn find_agent_by_id_case_and_alias() {
        let ctx = DataContext::new(store());
        assert_eq!(ctx.find_agent("cursor").unwrap().unwrap().id, "cursor");
        assert_eq!(ctx.find_agent("WindSurf").unwrap().unwrap().id, "windsurf");
        assert_eq!(ctx.find_agent("Cline").unwrap().unwrap().id, "claude-dev");
        assert!(ctx.find_agent("copilot").unwrap().is_none());
    }

    #[test]
    fn find_feature_by_id_and_alias() {
        let ctx = DataContext::new(store());
        assert_eq!(
            ctx.find_feature("MCP-SUPPORT").unwrap().unwrap().id,
            "mcp-support"
        );
        assert_eq!(
            ctx.find_feature("model context protocol").unwrap().unwrap().id,
            "mcp-support"
        );
        assert!(ctx.find_feature("nope").unwrap().is_none());
    }

    #[test]
    fn agent_support_lists_every_feature() {
        let ctx = DataContext::new(store());
        let support = ctx.agent_support("cursor").unwrap();
        assert_eq!(support.len(), 2);
        assert_eq!(support[0].cell.level, SupportLevel::No);
        assert_eq!(support[1].cell.level, SupportLevel::Unknown);
    }

    #[test]
    fn feature_support_sorts_best_first_and_stably() {
        let ctx = DataContext::new(store());
        let support = ctx.feature_support("mcp-support").unwrap();
        let order: Vec<&str> = support.iter().map(|s| s.agent.id.as_str()).collect();
        assert_eq!(order, vec!["claude-dev", "windsurf", "cursor"]);

        let untouched = ctx.feature_support("claude3-support").unwrap();
        let order: Vec<&str> = untouched.iter().map(|s| s.agent.id.as_str()).collect();
        assert_eq!(order, vec!["cursor", "windsurf", "claude-dev"]);
    }
}
