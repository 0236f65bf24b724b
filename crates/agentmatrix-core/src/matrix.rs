use crate::{Agent, Feature, SupportLevel, SupportRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One (agent, feature) entry of the comparison matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub level: SupportLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<String>,
}

impl MatrixCell {
    /// Cell used when no support record exists for a pair.
    pub fn unknown() -> Self {
        Self::default()
    }

    fn from_record(record: &SupportRecord) -> Self {
        Self {
            level: record.support_level,
            notes: Some(record.notes.clone()).filter(|n| !n.trim().is_empty()),
            examples: Some(record.examples.clone()).filter(|e| !e.is_empty()),
            sources: Some(record.sources.clone()).filter(|s| !s.is_empty()),
            last_verified: Some(record.last_verified.clone()).filter(|d| !d.is_empty()),
        }
    }
}

pub type MatrixRow = BTreeMap<String, MatrixCell>;

/// Dense join of agents against features.
///
/// Every (agent, feature) pair of the collections the matrix was built from
/// holds exactly one cell. Serializes as `{agent_id: {feature_id: cell}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonMatrix {
    rows: BTreeMap<String, MatrixRow>,
}

impl ComparisonMatrix {
    pub fn cell(&self, agent_id: &str, feature_id: &str) -> Option<&MatrixCell> {
        self.rows.get(agent_id)?.get(feature_id)
    }

    /// Level for a pair; pairs outside the matrix read as unknown.
    pub fn level(&self, agent_id: &str, feature_id: &str) -> SupportLevel {
        self.cell(agent_id, feature_id)
            .map(|c| c.level)
            .unwrap_or(SupportLevel::Unknown)
    }

    pub fn row(&self, agent_id: &str) -> Option<&MatrixRow> {
        self.rows.get(agent_id)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &MatrixRow)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains_agent(&self, agent_id: &str) -> bool {
        self.rows.contains_key(agent_id)
    }

    pub fn contains_feature(&self, feature_id: &str) -> bool {
        self.rows
            .values()
            .next()
            .is_some_and(|row| row.contains_key(feature_id))
    }

    pub fn agent_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Dense sub-matrix restricted to the given agents and features.
    pub fn project<'a, A, F>(&self, agents: A, features: F) -> ComparisonMatrix
    where
        A: IntoIterator<Item = &'a Agent>,
        F: IntoIterator<Item = &'a Feature> + Clone,
    {
        let rows = agents
            .into_iter()
            .map(|agent| {
                let row = features
                    .clone()
                    .into_iter()
                    .map(|feature| {
                        let cell = self
                            .cell(&agent.id, &feature.id)
                            .cloned()
                            .unwrap_or_default();
                        (feature.id.clone(), cell)
                    })
                    .collect();
                (agent.id.clone(), row)
            })
            .collect();
        ComparisonMatrix { rows }
    }
}

/// Joins agents × features × support records into a dense matrix.
///
/// Records naming an agent or feature outside the supplied collections are
/// ignored; the shape is always `agents.len() × features.len()` (after
/// duplicate ids collapse). When a pair has several records the first one wins.
pub fn build_matrix(
    agents: &[Agent],
    features: &[Feature],
    support_records: &[SupportRecord],
) -> ComparisonMatrix {
    let mut index: HashMap<(&str, &str), &SupportRecord> =
        HashMap::with_capacity(support_records.len());
    for record in support_records {
        index
            .entry((record.agent_id.as_str(), record.feature_id.as_str()))
            .or_insert(record);
    }

    let mut rows = BTreeMap::new();
    let mut matched = 0usize;
    for agent in agents {
        let mut row = MatrixRow::new();
        for feature in features {
            let cell = match index.get(&(agent.id.as_str(), feature.id.as_str())) {
                Some(record) => {
                    matched += 1;
                    MatrixCell::from_record(record)
                }
                None => MatrixCell::unknown(),
            };
            row.insert(feature.id.clone(), cell);
        }
        rows.insert(agent.id.clone(), row);
    }

    debug!(
        agents = agents.len(),
        features = features.len(),
        records = support_records.len(),
        matched,
        ignored = index.len().saturating_sub(matched),
        "built comparison matrix"
    );

    ComparisonMatrix { rows }
}
