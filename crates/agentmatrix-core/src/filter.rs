use crate::stats::{
    compute_agent_stats, compute_category_stats, compute_feature_stats, compute_global_stats,
    AgentStats, CategoryStats, FeatureStats, GlobalStats,
};
use crate::{Agent, Category, ComparisonMatrix, Feature, MatrixCell, MatrixError, Result, SupportLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// User-selected restrictions over the comparison matrix.
///
/// Empty sets mean "no restriction". The support-level set never removes
/// rows or columns; it only drives [`is_cell_visible`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub agent_ids: HashSet<String>,
    #[serde(default)]
    pub feature_ids: HashSet<String>,
    #[serde(default)]
    pub categories: HashSet<Category>,
    #[serde(default)]
    pub support_levels: HashSet<SupportLevel>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Raw comma-separated query parameters, as sent by the compare page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub agents: Option<String>,
    pub features: Option<String>,
    pub categories: Option<String>,
    pub levels: Option<String>,
    pub q: Option<String>,
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl FilterCriteria {
    pub fn from_query(query: &FilterQuery) -> Result<Self> {
        let categories = split_list(query.categories.as_deref())
            .map(|c| c.parse::<Category>().map_err(MatrixError::Validation))
            .collect::<Result<HashSet<_>>>()?;
        let support_levels = split_list(query.levels.as_deref())
            .map(|l| l.parse::<SupportLevel>().map_err(MatrixError::Validation))
            .collect::<Result<HashSet<_>>>()?;

        Ok(Self {
            agent_ids: split_list(query.agents.as_deref())
                .map(str::to_lowercase)
                .collect(),
            feature_ids: split_list(query.features.as_deref())
                .map(str::to_string)
                .collect(),
            categories,
            support_levels,
            search: query
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
        })
    }

    pub fn with_agents<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agent_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_features<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn with_levels(mut self, levels: impl IntoIterator<Item = SupportLevel>) -> Self {
        self.support_levels = levels.into_iter().collect();
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Number of active restrictions, for "N filters active" badges.
    pub fn active_count(&self) -> usize {
        [
            !self.agent_ids.is_empty(),
            !self.feature_ids.is_empty(),
            !self.categories.is_empty(),
            !levels_unrestricted(&self.support_levels),
            self.search_needle().is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn keeps_agent(&self, agent: &Agent) -> bool {
        self.agent_ids.is_empty() || self.agent_ids.contains(&agent.id)
    }

    fn keeps_feature(&self, feature: &Feature) -> bool {
        (self.feature_ids.is_empty() || self.feature_ids.contains(&feature.id))
            && (self.categories.is_empty() || self.categories.contains(&feature.category))
    }
}

fn levels_unrestricted(levels: &HashSet<SupportLevel>) -> bool {
    levels.is_empty() || SupportLevel::ALL.iter().all(|l| levels.contains(l))
}

/// Whether a cell should be shown given the allowed support levels.
pub fn is_cell_visible(cell: &MatrixCell, allowed_levels: &HashSet<SupportLevel>) -> bool {
    levels_unrestricted(allowed_levels) || allowed_levels.contains(&cell.level)
}

/// A filtered projection over the matrix. Borrows, never copies, entities.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub matrix: &'a ComparisonMatrix,
    pub agents: Vec<&'a Agent>,
    pub features: Vec<&'a Feature>,
}

impl<'a> FilteredView<'a> {
    /// The unfiltered view over every agent and feature.
    pub fn full(matrix: &'a ComparisonMatrix, agents: &'a [Agent], features: &'a [Feature]) -> Self {
        Self {
            matrix,
            agents: agents.iter().collect(),
            features: features.iter().collect(),
        }
    }

    pub fn global_stats(&self) -> GlobalStats {
        compute_global_stats(self.matrix, &self.agents, &self.features)
    }

    /// Per-agent stats over the view's features, in view order.
    pub fn agent_stats(&self) -> Vec<AgentStats> {
        self.agents
            .iter()
            .map(|a| compute_agent_stats(&a.id, self.matrix, self.features.iter().copied()))
            .collect()
    }

    /// Per-feature stats over the view's agents, in view order.
    pub fn feature_stats(&self) -> Vec<FeatureStats> {
        self.features
            .iter()
            .map(|f| compute_feature_stats(&f.id, self.matrix, self.agents.iter().copied()))
            .collect()
    }

    pub fn category_stats(&self) -> Vec<CategoryStats> {
        compute_category_stats(self.matrix, &self.agents, &self.features)
    }

    /// Dense sub-matrix over exactly the agents and features of this view.
    pub fn project_matrix(&self) -> ComparisonMatrix {
        self.matrix
            .project(self.agents.iter().copied(), self.features.iter().copied())
    }
}

/// Applies criteria to the agent and feature axes independently.
///
/// The search string is matched against each axis on its own: agents keep
/// only text hits among agents and features keep only text hits among
/// features, so a needle that hits one axis empties the other.
pub fn apply_filters<'a>(
    matrix: &'a ComparisonMatrix,
    agents: &'a [Agent],
    features: &'a [Feature],
    criteria: &FilterCriteria,
) -> FilteredView<'a> {
    let mut kept_agents: Vec<&Agent> = agents.iter().filter(|a| criteria.keeps_agent(a)).collect();
    let mut kept_features: Vec<&Feature> = features
        .iter()
        .filter(|f| criteria.keeps_feature(f))
        .collect();

    if let Some(needle) = criteria.search_needle() {
        kept_agents.retain(|a| a.matches_text(&needle));
        kept_features.retain(|f| f.matches_text(&needle));
    }

    FilteredView {
        matrix,
        agents: kept_agents,
        features: kept_features,
    }
}
