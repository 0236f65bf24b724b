use crate::{Agent, Feature, MatrixError, Result, SupportLevel, SupportRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of the three read-only entity collections.
///
/// Implementations hand back fully materialized collections; the matrix
/// builder and statistics never touch I/O themselves.
pub trait EntityStore: Send + Sync {
    fn load_agents(&self) -> Result<Vec<Agent>>;
    fn load_features(&self) -> Result<Vec<Feature>>;
    fn load_support_records(&self) -> Result<Vec<SupportRecord>>;
}

/// Collections held in memory, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    pub agents: Vec<Agent>,
    pub features: Vec<Feature>,
    pub records: Vec<SupportRecord>,
}

impl InMemoryEntityStore {
    pub fn new(agents: Vec<Agent>, features: Vec<Feature>, records: Vec<SupportRecord>) -> Self {
        Self {
            agents,
            features,
            records,
        }
    }
}

impl EntityStore for InMemoryEntityStore {
    fn load_agents(&self) -> Result<Vec<Agent>> {
        Ok(self.agents.clone())
    }

    fn load_features(&self) -> Result<Vec<Feature>> {
        Ok(self.features.clone())
    }

    fn load_support_records(&self) -> Result<Vec<SupportRecord>> {
        Ok(self.records.clone())
    }
}

/// `index.*` at the root of the data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIndex {
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub comparisons: Vec<String>,
}

/// `support/<agent_id>.*`: every judgment recorded for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportFile {
    pub agent_id: String,
    #[serde(default)]
    pub feature_support: Vec<SupportEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportEntry {
    pub feature_id: String,
    pub support_level: SupportLevel,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub last_verified: String,
}

const EXTENSIONS: [&str; 4] = ["json", "toml", "yaml", "yml"];

/// Reads the on-disk data layout:
///
/// ```text
/// data/
///   index.json            { agents: [...], features: [...], comparisons: [...] }
///   agents/<id>.json
///   features/<id>.json
///   support/<agent_id>.json
/// ```
///
/// Each document may be JSON, TOML or YAML; the extension decides.
#[derive(Debug, Clone)]
pub struct FileEntityStore {
    root: PathBuf,
}

impl FileEntityStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_index(&self) -> Result<DataIndex> {
        let path = find_document(&self.root, "index").ok_or_else(|| {
            MatrixError::NotFound(format!("no index file in {}", self.root.display()))
        })?;
        read_document(&path)
    }

    fn entity_path(&self, dir: &str, id: &str) -> Result<PathBuf> {
        find_document(&self.root.join(dir), id)
            .ok_or_else(|| MatrixError::NotFound(format!("{}/{}", dir, id)))
    }

    pub fn load_agent(&self, id: &str) -> Result<Agent> {
        let path = self.entity_path("agents", id)?;
        let mut agent: Agent = read_document(&path)?;
        agent.id = agent.id.trim().to_lowercase();
        ensure_id_matches(&path, "id", &agent.id, &id.to_lowercase())?;
        Ok(agent)
    }

    pub fn load_feature(&self, id: &str) -> Result<Feature> {
        let path = self.entity_path("features", id)?;
        let feature: Feature = read_document(&path)?;
        ensure_id_matches(&path, "id", &feature.id, id)?;
        Ok(feature)
    }

    /// Records for one agent; a missing support file means no records.
    pub fn load_support_file(&self, agent_id: &str) -> Result<Vec<SupportRecord>> {
        let Some(path) = find_document(&self.root.join("support"), agent_id) else {
            debug!(agent_id, "no support file, agent has no recorded support");
            return Ok(Vec::new());
        };
        let file: SupportFile = read_document(&path)?;
        let owner = file.agent_id.trim().to_lowercase();
        ensure_id_matches(&path, "agent_id", &owner, &agent_id.to_lowercase())?;

        Ok(file
            .feature_support
            .into_iter()
            .map(|entry| SupportRecord {
                agent_id: owner.clone(),
                feature_id: entry.feature_id,
                support_level: entry.support_level,
                notes: entry.notes,
                examples: entry.examples,
                sources: entry.sources,
                links: entry.links,
                last_verified: entry.last_verified,
            })
            .collect())
    }
}

impl EntityStore for FileEntityStore {
    fn load_agents(&self) -> Result<Vec<Agent>> {
        let index = self.load_index()?;
        let agents = index
            .agents
            .iter()
            .map(|id| self.load_agent(id))
            .collect::<Result<Vec<_>>>()?;
        info!(count = agents.len(), root = %self.root.display(), "loaded agents");
        Ok(agents)
    }

    fn load_features(&self) -> Result<Vec<Feature>> {
        let index = self.load_index()?;
        let features = index
            .features
            .iter()
            .map(|id| self.load_feature(id))
            .collect::<Result<Vec<_>>>()?;
        info!(count = features.len(), root = %self.root.display(), "loaded features");
        Ok(features)
    }

    fn load_support_records(&self) -> Result<Vec<SupportRecord>> {
        let index = self.load_index()?;
        let mut records = Vec::new();
        for agent_id in &index.agents {
            records.extend(self.load_support_file(agent_id)?);
        }
        info!(count = records.len(), root = %self.root.display(), "loaded support records");
        Ok(records)
    }
}

fn ensure_id_matches(path: &Path, field: &str, actual: &str, expected: &str) -> Result<()> {
    if actual == expected {
        return Ok(());
    }
    Err(MatrixError::Validation(format!(
        "{}: {} '{}' must match file name (expected '{}')",
        path.display(),
        field,
        actual,
        expected
    )))
}

pub(crate) fn find_document(dir: &Path, stem: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|p| p.is_file())
}

/// Parses a JSON, TOML or YAML document according to its extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    let parsed = match ext.as_str() {
        "json" => serde_json::from_str(&content)
            .map_err(|e| MatrixError::Parse(format!("{}: {}", path.display(), e)))?,
        "toml" => toml::from_str(&content)
            .map_err(|e| MatrixError::Parse(format!("{}: {}", path.display(), e)))?,
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .map_err(|e| MatrixError::Parse(format!("{}: {}", path.display(), e)))?,
        other => {
            return Err(MatrixError::Parse(format!(
                "{}: unsupported document format '{}'",
                path.display(),
                other
            )))
        }
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn seed(dir: &Path) {
        write(
            dir,
            "index.json",
            r#"{"agents":["cursor","windsurf"],"features":["mcp-support"],"comparisons":[]}"#,
        );
        write(
            dir,
            "agents/cursor.json",
            r#"{"id":"Cursor","name":"Cursor","aliases":["cursor-ai"],"provider":"Anysphere",
               "website":"https://cursor.com","supported_ide":["Cursor"],"description":"AI editor"}"#,
        );
        write(
            dir,
            "agents/windsurf.yaml",
            "id: windsurf\nname: Windsurf\naliases: []\nprovider: Codeium\nwebsite: https://windsurf.com\nsupported_ide: [Windsurf]\ndescription: Agentic IDE\n",
        );
        write(
            dir,
            "features/mcp-support.toml",
            "id = \"mcp-support\"\nname = \"MCP Support\"\naliases = []\ncategory = \"Configuration\"\ndescription = \"Model Context Protocol\"\n",
        );
        write(
            dir,
            "support/cursor.json",
            r#"{"agent_id":"cursor","feature_support":[
                {"feature_id":"mcp-support","support_level":"yes","notes":"built in",
                 "examples":[],"links":[],"sources":["docs"],"last_verified":"2024-06-01"}]}"#,
        );
    }

    #[test]
    fn loads_mixed_format_directory() {
        let tmp = TempDir::new().unwrap();
        seed(tmp.path());
        let store = FileEntityStore::new(tmp.path());

        let agents = store.load_agents().unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].id, "cursor");
        assert_eq!(agents[1].provider, "Codeium");

        let features = store.load_features().unwrap();
        assert_eq!(features[0].category, Category::Configuration);

        let records = store.load_support_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].agent_id, "cursor");
        assert_eq!(records[0].sources, vec!["docs".to_string()]);
    }

    #[test]
    fn missing_support_file_yields_no_records() {
        let tmp = TempDir::new().unwrap();
        seed(tmp.path());
        let store = FileEntityStore::new(tmp.path());
        assert!(store.load_support_file("windsurf").unwrap().is_empty());
    }

    #[test]
    fn missing_index_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = FileEntityStore::new(tmp.path());
        assert!(matches!(store.load_agents(), Err(MatrixError::NotFound(_))));
    }

    #[test]
    fn id_must_match_file_name() {
        let tmp = TempDir::new().unwrap();
        seed(tmp.path());
        write(
            tmp.path(),
            "features/mcp-support.toml",
            "id = \"mcp\"\nname = \"MCP\"\ncategory = \"Configuration\"\ndescription = \"d\"\n",
        );
        let store = FileEntityStore::new(tmp.path());
        assert!(matches!(
            store.load_features(),
            Err(MatrixError::Validation(_))
        ));
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        let tmp = TempDir::new().unwrap();
        seed(tmp.path());
        write(tmp.path(), "agents/cursor.json", "{ not json");
        let store = FileEntityStore::new(tmp.path());
        assert!(matches!(store.load_agents(), Err(MatrixError::Parse(_))));
    }

    #[test]
    fn malformed_toml_and_yaml_name_the_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "features/broken.toml", "id = \"broken\"\nname = [");
        write(tmp.path(), "support/broken.yaml", "agent_id: [unclosed\n");

        for rel in ["features/broken.toml", "support/broken.yaml"] {
            let path = tmp.path().join(rel);
            match read_document::<serde_json::Value>(&path) {
                Err(MatrixError::Parse(msg)) => assert!(msg.contains(rel), "{}", msg),
                other => panic!("expected parse error for {}, got {:?}", rel, other),
            }
        }
    }

    #[test]
    fn invalid_enum_values_are_rejected() {
        let tmp = TempDir::new().unwrap();
        seed(tmp.path());
        write(
            tmp.path(),
            "support/cursor.json",
            r#"{"agent_id":"cursor","feature_support":[{"feature_id":"mcp-support","support_level":"maybe"}]}"#,
        );
        let store = FileEntityStore::new(tmp.path());
        assert!(store.load_support_records().is_err());
    }
}
