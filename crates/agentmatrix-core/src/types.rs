use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type AgentId = String;
pub type FeatureId = String;

/// How well an agent supports a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    Yes,
    Partial,
    No,
    Unknown,
}

impl SupportLevel {
    pub const ALL: [SupportLevel; 4] = [
        SupportLevel::Yes,
        SupportLevel::Partial,
        SupportLevel::No,
        SupportLevel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportLevel::Yes => "yes",
            SupportLevel::Partial => "partial",
            SupportLevel::No => "no",
            SupportLevel::Unknown => "unknown",
        }
    }

    /// Yes and partial both count as some form of support.
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportLevel::Yes | SupportLevel::Partial)
    }
}

impl Default for SupportLevel {
    fn default() -> Self {
        SupportLevel::Unknown
    }
}

impl fmt::Display for SupportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Ok(SupportLevel::Yes),
            "partial" => Ok(SupportLevel::Partial),
            "no" => Ok(SupportLevel::No),
            "unknown" => Ok(SupportLevel::Unknown),
            other => Err(format!(
                "unknown support level '{}', expected one of: yes, partial, no, unknown",
                other
            )),
        }
    }
}

/// Fixed classification bucket for features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Model Support")]
    ModelSupport,
    #[serde(rename = "Editor Integration")]
    EditorIntegration,
    Execution,
    Planning,
    Configuration,
    Debugging,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::ModelSupport,
        Category::EditorIntegration,
        Category::Execution,
        Category::Planning,
        Category::Configuration,
        Category::Debugging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ModelSupport => "Model Support",
            Category::EditorIntegration => "Editor Integration",
            Category::Execution => "Execution",
            Category::Planning => "Planning",
            Category::Configuration => "Configuration",
            Category::Debugging => "Debugging",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect::<String>()
            .to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown category '{}', expected one of: {}",
                    s.trim(),
                    Category::ALL
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// An AI coding assistant being profiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub provider: String,
    pub website: String,
    #[serde(default)]
    pub supported_ide: Vec<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faq: Option<Vec<Faq>>,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into().to_lowercase(),
            name: name.into(),
            aliases: Vec::new(),
            provider: String::new(),
            website: String::new(),
            supported_ide: Vec::new(),
            description: String::new(),
            faq: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_supported_ide<I, S>(mut self, ides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_ide = ides.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches_text(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self
                .aliases
                .iter()
                .any(|a| a.to_lowercase().contains(needle_lower))
            || self.description.to_lowercase().contains(needle_lower)
    }
}

/// A capability agents may or may not support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub category: Category,
    pub description: String,
    /// Long-form explanation shown on the feature detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faq: Option<Vec<Faq>>,
}

impl Feature {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            aliases: Vec::new(),
            category,
            description: String::new(),
            overview: None,
            importance: None,
            faq: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches_text(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self
                .aliases
                .iter()
                .any(|a| a.to_lowercase().contains(needle_lower))
            || self.description.to_lowercase().contains(needle_lower)
            || self.category.as_str().to_lowercase().contains(needle_lower)
    }
}

/// A recorded judgment of how well one agent supports one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportRecord {
    pub agent_id: AgentId,
    pub feature_id: FeatureId,
    pub support_level: SupportLevel,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub last_verified: String,
}

impl SupportRecord {
    pub fn new(
        agent_id: impl Into<String>,
        feature_id: impl Into<String>,
        support_level: SupportLevel,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            feature_id: feature_id.into(),
            support_level,
            notes: String::new(),
            examples: Vec::new(),
            sources: Vec::new(),
            links: Vec::new(),
            last_verified: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_last_verified(mut self, date: impl Into<String>) -> Self {
        self.last_verified = date.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_level_serializes_lowercase() {
        let json = serde_json::to_string(&SupportLevel::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
        let parsed: SupportLevel = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(parsed, SupportLevel::Unknown);
    }

    #[test]
    fn support_level_rejects_unknown_tokens() {
        assert!("maybe".parse::<SupportLevel>().is_err());
        assert_eq!(" YES ".parse::<SupportLevel>().unwrap(), SupportLevel::Yes);
    }

    #[test]
    fn category_uses_display_names_on_the_wire() {
        let json = serde_json::to_string(&Category::ModelSupport).unwrap();
        assert_eq!(json, "\"Model Support\"");
        assert!(serde_json::from_str::<Category>("\"model support\"").is_err());
    }

    #[test]
    fn category_parses_loose_forms() {
        assert_eq!(
            "editor-integration".parse::<Category>().unwrap(),
            Category::EditorIntegration
        );
        assert_eq!(
            "model_support".parse::<Category>().unwrap(),
            Category::ModelSupport
        );
        assert_eq!("Planning".parse::<Category>().unwrap(), Category::Planning);
        assert!("Testing".parse::<Category>().is_err());
    }

    #[test]
    fn agent_new_lowercases_id() {
        let agent = Agent::new("Cursor", "Cursor");
        assert_eq!(agent.id, "cursor");
    }

    #[test]
    fn feature_extension_fields_are_optional() {
        let feature: Feature = serde_json::from_str(
            r#"{"id":"mcp-support","name":"MCP","aliases":[],"category":"Configuration","description":"d"}"#,
        )
        .unwrap();
        assert!(feature.overview.is_none());
        assert!(feature.faq.is_none());

        let with_overview: Feature = serde_json::from_str(
            r#"{"id":"x","name":"X","category":"Planning","description":"d","overview":"long","faq":[{"question":"q","answer":"a"}]}"#,
        )
        .unwrap();
        assert_eq!(with_overview.overview.as_deref(), Some("long"));
        assert_eq!(with_overview.faq.unwrap().len(), 1);
    }

    #[test]
    fn text_matching_is_case_insensitive() {
        let agent = Agent::new("claude-dev", "Claude Dev")
            .with_aliases(["Cline"])
            .with_description("VS Code extension");
        assert!(agent.matches_text("cline"));
        assert!(agent.matches_text("vs code"));
        assert!(!agent.matches_text("jetbrains"));

        let feature = Feature::new("planner", "Planner", Category::Planning);
        assert!(feature.matches_text("planning"));
    }
}
