use crate::{Agent, Category, ComparisonMatrix, Feature, SupportLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Number of cells at each support level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportCounts {
    pub yes: usize,
    pub partial: usize,
    pub no: usize,
    pub unknown: usize,
}

impl SupportCounts {
    pub fn record(&mut self, level: SupportLevel) {
        match level {
            SupportLevel::Yes => self.yes += 1,
            SupportLevel::Partial => self.partial += 1,
            SupportLevel::No => self.no += 1,
            SupportLevel::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, level: SupportLevel) -> usize {
        match level {
            SupportLevel::Yes => self.yes,
            SupportLevel::Partial => self.partial,
            SupportLevel::No => self.no,
            SupportLevel::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.yes + self.partial + self.no + self.unknown
    }

    /// Weighted percentage where partial support earns half credit.
    pub fn support_percentage(&self, denominator: usize) -> u32 {
        support_percentage(self.yes, self.partial, denominator)
    }
}

impl FromIterator<SupportLevel> for SupportCounts {
    fn from_iter<I: IntoIterator<Item = SupportLevel>>(iter: I) -> Self {
        let mut counts = SupportCounts::default();
        for level in iter {
            counts.record(level);
        }
        counts
    }
}

/// `round(((yes + 0.5 * partial) / total) * 100)`, or 0 when `total` is 0.
pub fn support_percentage(yes: usize, partial: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = (yes as f64 + partial as f64 * 0.5) / total as f64;
    // half rounds up
    (score * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub agent_id: String,
    #[serde(flatten)]
    pub counts: SupportCounts,
    pub total_features: usize,
    pub support_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStats {
    pub feature_id: String,
    #[serde(flatten)]
    pub counts: SupportCounts,
    pub total_agents: usize,
    pub support_percentage: u32,
    /// Agents at yes or partial, in input order.
    pub supported_agents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: Category,
    pub feature_count: usize,
    #[serde(flatten)]
    pub counts: SupportCounts,
    pub support_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_agents: usize,
    pub total_features: usize,
    pub total_comparisons: usize,
    pub overall_support_percentage: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub support_distribution: SupportCounts,
}

pub fn compute_agent_stats<'a, F>(agent_id: &str, matrix: &ComparisonMatrix, features: F) -> AgentStats
where
    F: IntoIterator<Item = &'a Feature>,
{
    let mut total_features = 0;
    let counts: SupportCounts = features
        .into_iter()
        .inspect(|_| total_features += 1)
        .map(|feature| matrix.level(agent_id, &feature.id))
        .collect();

    AgentStats {
        agent_id: agent_id.to_string(),
        counts,
        total_features,
        support_percentage: counts.support_percentage(total_features),
    }
}

pub fn compute_feature_stats<'a, A>(
    feature_id: &str,
    matrix: &ComparisonMatrix,
    agents: A,
) -> FeatureStats
where
    A: IntoIterator<Item = &'a Agent>,
{
    let mut counts = SupportCounts::default();
    let mut supported_agents = Vec::new();
    let mut total_agents = 0;
    for agent in agents {
        total_agents += 1;
        let level = matrix.level(&agent.id, feature_id);
        counts.record(level);
        if level.is_supported() {
            supported_agents.push(agent.id.clone());
        }
    }

    FeatureStats {
        feature_id: feature_id.to_string(),
        counts,
        total_agents,
        support_percentage: counts.support_percentage(total_agents),
        supported_agents,
    }
}

/// Per-category breakdown, in order of first appearance within `features`.
pub fn compute_category_stats(
    matrix: &ComparisonMatrix,
    agents: &[&Agent],
    features: &[&Feature],
) -> Vec<CategoryStats> {
    let mut out: Vec<CategoryStats> = Vec::new();
    for feature in features {
        let idx = match out.iter().position(|c| c.category == feature.category) {
            Some(idx) => idx,
            None => {
                out.push(CategoryStats {
                    category: feature.category,
                    feature_count: 0,
                    counts: SupportCounts::default(),
                    support_percentage: 0,
                });
                out.len() - 1
            }
        };
        let entry = &mut out[idx];
        entry.feature_count += 1;
        for agent in agents {
            entry.counts.record(matrix.level(&agent.id, &feature.id));
        }
    }
    for entry in &mut out {
        entry.support_percentage = entry.counts.support_percentage(entry.counts.total());
    }
    out
}

pub fn compute_global_stats(
    matrix: &ComparisonMatrix,
    agents: &[&Agent],
    features: &[&Feature],
) -> GlobalStats {
    let mut distribution = SupportCounts::default();
    let mut last_updated: Option<&str> = None;
    for agent in agents {
        for feature in features {
            match matrix.cell(&agent.id, &feature.id) {
                Some(cell) => {
                    distribution.record(cell.level);
                    if let Some(date) = cell.last_verified.as_deref() {
                        if last_updated.map_or(true, |cur| date > cur) {
                            last_updated = Some(date);
                        }
                    }
                }
                None => distribution.record(SupportLevel::Unknown),
            }
        }
    }

    let total_comparisons = agents.len() * features.len();
    GlobalStats {
        total_agents: agents.len(),
        total_features: features.len(),
        total_comparisons,
        overall_support_percentage: distribution.support_percentage(total_comparisons),
        last_updated: last_updated.map(str::to_string),
        support_distribution: distribution,
    }
}

/// Descending by percentage; ties keep input order.
pub fn rank_agents(stats: &mut [AgentStats]) {
    stats.sort_by(|a, b| b.support_percentage.cmp(&a.support_percentage));
}

/// Descending by percentage; ties keep input order.
pub fn rank_features(stats: &mut [FeatureStats]) {
    stats.sort_by(|a, b| b.support_percentage.cmp(&a.support_percentage));
}

/// Rounded mean of the agents' support percentages.
pub fn average_support_percentage(stats: &[AgentStats]) -> u32 {
    if stats.is_empty() {
        return 0;
    }
    let sum: u64 = stats.iter().map(|s| s.support_percentage as u64).sum();
    (sum as f64 / stats.len() as f64).round() as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCount {
    pub provider: String,
    pub count: usize,
}

pub fn provider_counts(agents: &[Agent]) -> Vec<ProviderCount> {
    let mut out: Vec<ProviderCount> = Vec::new();
    for agent in agents {
        let provider = if agent.provider.trim().is_empty() {
            "Unknown"
        } else {
            agent.provider.as_str()
        };
        match out.iter_mut().find(|p| p.provider == provider) {
            Some(entry) => entry.count += 1,
            None => out.push(ProviderCount {
                provider: provider.to_string(),
                count: 1,
            }),
        }
    }
    out
}

/// Sorted, de-duplicated IDE names across all agents.
pub fn supported_ides(agents: &[Agent]) -> Vec<String> {
    agents
        .iter()
        .flat_map(|a| a.supported_ide.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

pub fn category_counts(features: &[Feature]) -> Vec<CategoryCount> {
    let mut out: Vec<CategoryCount> = Vec::new();
    for feature in features {
        match out.iter_mut().find(|c| c.category == feature.category) {
            Some(entry) => entry.count += 1,
            None => out.push(CategoryCount {
                category: feature.category,
                count: 1,
            }),
        }
    }
    out
}
