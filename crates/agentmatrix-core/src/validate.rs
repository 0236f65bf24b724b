use crate::{Agent, Feature, SupportRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("{entity} '{id}': required field '{field}' is empty")]
    EmptyField {
        entity: &'static str,
        id: String,
        field: &'static str,
    },

    #[error("{entity} id '{id}' appears more than once")]
    DuplicateId { entity: &'static str, id: String },

    #[error("agent id '{id}' must be lowercase")]
    NonLowercaseId { id: String },

    #[error("support for ({agent_id}, {feature_id}) is recorded more than once")]
    DuplicateSupport { agent_id: String, feature_id: String },

    #[error("support record references unknown agent '{agent_id}'")]
    DanglingAgent { agent_id: String, feature_id: String },

    #[error("support record references unknown feature '{feature_id}'")]
    DanglingFeature { agent_id: String, feature_id: String },

    #[error("({agent_id}, {feature_id}): last_verified '{value}' is not a YYYY-MM-DD date")]
    InvalidDate {
        agent_id: String,
        feature_id: String,
        value: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub agents_checked: usize,
    pub features_checked: usize,
    pub records_checked: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "checked {} agents, {} features, {} support records: {} issue(s)",
            self.agents_checked,
            self.features_checked,
            self.records_checked,
            self.issues.len()
        )?;
        for issue in &self.issues {
            writeln!(f, "  - {}", issue)?;
        }
        Ok(())
    }
}

fn require(issues: &mut Vec<ValidationIssue>, entity: &'static str, id: &str, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        issues.push(ValidationIssue::EmptyField {
            entity,
            id: id.to_string(),
            field,
        });
    }
}

/// Cross-entity integrity checks over a loaded dataset.
///
/// The matrix builder tolerates every problem reported here; this is for
/// tooling that wants to catch bad data before it ships.
pub fn validate_dataset(
    agents: &[Agent],
    features: &[Feature],
    records: &[SupportRecord],
) -> ValidationReport {
    let mut issues = Vec::new();

    let mut agent_ids = HashSet::new();
    for agent in agents {
        require(&mut issues, "agent", &agent.id, "id", &agent.id);
        require(&mut issues, "agent", &agent.id, "name", &agent.name);
        require(&mut issues, "agent", &agent.id, "provider", &agent.provider);
        require(&mut issues, "agent", &agent.id, "website", &agent.website);
        require(&mut issues, "agent", &agent.id, "description", &agent.description);
        if agent.id != agent.id.to_lowercase() {
            issues.push(ValidationIssue::NonLowercaseId {
                id: agent.id.clone(),
            });
        }
        if !agent_ids.insert(agent.id.as_str()) {
            issues.push(ValidationIssue::DuplicateId {
                entity: "agent",
                id: agent.id.clone(),
            });
        }
    }

    let mut feature_ids = HashSet::new();
    for feature in features {
        require(&mut issues, "feature", &feature.id, "id", &feature.id);
        require(&mut issues, "feature", &feature.id, "name", &feature.name);
        require(&mut issues, "feature", &feature.id, "description", &feature.description);
        if !feature_ids.insert(feature.id.as_str()) {
            issues.push(ValidationIssue::DuplicateId {
                entity: "feature",
                id: feature.id.clone(),
            });
        }
    }

    let mut pairs = HashSet::new();
    for record in records {
        let agent_id = record.agent_id.clone();
        let feature_id = record.feature_id.clone();
        if !agent_ids.contains(record.agent_id.as_str()) {
            issues.push(ValidationIssue::DanglingAgent {
                agent_id: agent_id.clone(),
                feature_id: feature_id.clone(),
            });
        }
        if !feature_ids.contains(record.feature_id.as_str()) {
            issues.push(ValidationIssue::DanglingFeature {
                agent_id: agent_id.clone(),
                feature_id: feature_id.clone(),
            });
        }
        if !pairs.insert((record.agent_id.as_str(), record.feature_id.as_str())) {
            issues.push(ValidationIssue::DuplicateSupport {
                agent_id: agent_id.clone(),
                feature_id: feature_id.clone(),
            });
        }
        if NaiveDate::parse_from_str(&record.last_verified, "%Y-%m-%d").is_err() {
            issues.push(ValidationIssue::InvalidDate {
                agent_id,
                feature_id,
                value: record.last_verified.clone(),
            });
        }
    }

    ValidationReport {
        agents_checked: agents.len(),
        features_checked: features.len(),
        records_checked: records.len(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, SupportLevel};

    fn agent(id: &str) -> Agent {
        let mut agent = Agent::new(id, id)
            .with_provider("Acme")
            .with_description("desc");
        agent.website = "https://example.com".into();
        agent
    }

    fn feature(id: &str) -> Feature {
        Feature::new(id, id, Category::Execution).with_description("desc")
    }

    fn record(agent: &str, feature: &str) -> SupportRecord {
        SupportRecord::new(agent, feature, SupportLevel::Yes).with_last_verified("2024-01-31")
    }

    #[test]
    fn clean_dataset_passes() {
        let report = validate_dataset(
            &[agent("a"), agent("b")],
            &[feature("f1")],
            &[record("a", "f1"), record("b", "f1")],
        );
        assert!(report.is_valid(), "{}", report);
        assert_eq!(report.records_checked, 2);
    }

    #[test]
    fn reports_duplicates_and_dangling_references() {
        let report = validate_dataset(
            &[agent("a"), agent("a")],
            &[feature("f1")],
            &[record("a", "f1"), record("a", "f1"), record("ghost", "f9")],
        );
        assert!(report
            .issues
            .contains(&ValidationIssue::DuplicateId {
                entity: "agent",
                id: "a".into()
            }));
        assert!(report.issues.contains(&ValidationIssue::DuplicateSupport {
            agent_id: "a".into(),
            feature_id: "f1".into()
        }));
        assert!(report.issues.contains(&ValidationIssue::DanglingAgent {
            agent_id: "ghost".into(),
            feature_id: "f9".into()
        }));
        assert!(report.issues.contains(&ValidationIssue::DanglingFeature {
            agent_id: "ghost".into(),
            feature_id: "f9".into()
        }));
    }

    #[test]
    fn reports_empty_fields_case_and_dates() {
        let mut upper = agent("a");
        upper.id = "Upper".into();
        upper.provider.clear();
        let report = validate_dataset(
            &[upper],
            &[feature("f1")],
            &[SupportRecord::new("Upper", "f1", SupportLevel::No).with_last_verified("last week")],
        );
        assert!(report.issues.contains(&ValidationIssue::NonLowercaseId { id: "Upper".into() }));
        assert!(report.issues.contains(&ValidationIssue::EmptyField {
            entity: "agent",
            id: "Upper".into(),
            field: "provider"
        }));
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::InvalidDate { value, .. } if value == "last week")));
    }

    #[test]
    fn report_display_lists_issues() {
        let report = validate_dataset(&[], &[], &[record("x", "y")]);
        let text = report.to_string();
        assert!(text.contains("2 issue(s)"));
        assert!(text.contains("unknown agent 'x'"));
    }
}
