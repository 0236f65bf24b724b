use agentmatrix_core::{
    compute_agent_stats, validate_dataset, Category, DataContext, EntityStore, FileEntityStore,
    FilterCriteria, SupportCounts, SupportLevel,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn agent_doc(id: &str, provider: &str) -> String {
    format!(
        r#"{{"id":"{id}","name":"Agent {id}","aliases":[],"provider":"{provider}",
            "website":"https://{id}.example","supported_ide":["VS Code"],
            "description":"agent {id}"}}"#
    )
}

fn feature_doc(id: &str, category: &str) -> String {
    format!(
        "id = \"{id}\"\nname = \"Feature {id}\"\ncategory = \"{category}\"\ndescription = \"feature {id}\"\n"
    )
}

/// Agents a, b; features f1..f3; records (a,f1,yes), (a,f2,partial), (b,f1,no).
fn seed_scenario() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(
        root,
        "index.json",
        r#"{"agents":["a","b"],"features":["f1","f2","f3"],"comparisons":[]}"#,
    );
    write(root, "agents/a.json", &agent_doc("a", "Acme"));
    write(root, "agents/b.json", &agent_doc("b", "Globex"));
    write(root, "features/f1.toml", &feature_doc("f1", "Execution"));
    write(root, "features/f2.toml", &feature_doc("f2", "Planning"));
    write(root, "features/f3.toml", &feature_doc("f3", "Execution"));
    write(
        root,
        "support/a.yaml",
        "agent_id: a\nfeature_support:\n  - feature_id: f1\n    support_level: yes\n    notes: full\n    last_verified: \"2024-05-01\"\n  - feature_id: f2\n    support_level: partial\n    last_verified: \"2024-06-10\"\n",
    );
    write(
        root,
        "support/b.json",
        r#"{"agent_id":"b","feature_support":[{"feature_id":"f1","support_level":"no","last_verified":"2024-01-15"}]}"#,
    );
    tmp
}

#[test]
fn end_to_end_scenario_from_disk() {
    let tmp = seed_scenario();
    let ctx = DataContext::new(FileEntityStore::new(tmp.path()));
    ctx.preload().unwrap();

    let matrix = ctx.matrix().unwrap();
    assert_eq!(matrix.cell_count(), 6);
    for (agent, feature) in [("a", "f3"), ("b", "f2"), ("b", "f3")] {
        let cell = matrix.cell(agent, feature).unwrap();
        assert_eq!(cell.level, SupportLevel::Unknown);
        assert!(cell.notes.is_none());
        assert!(cell.examples.is_none());
    }
    assert_eq!(matrix.cell("a", "f1").unwrap().notes.as_deref(), Some("full"));

    let features = ctx.features().unwrap();
    let a = compute_agent_stats("a", matrix, features);
    assert_eq!(
        a.counts,
        SupportCounts {
            yes: 1,
            partial: 1,
            no: 0,
            unknown: 1
        }
    );
    assert_eq!(a.support_percentage, 50);

    let b = compute_agent_stats("b", matrix, features);
    assert_eq!(
        b.counts,
        SupportCounts {
            yes: 0,
            partial: 0,
            no: 1,
            unknown: 2
        }
    );
    assert_eq!(b.support_percentage, 0);

    let global = ctx.view(&FilterCriteria::default()).unwrap().global_stats();
    assert_eq!(
        global.support_distribution,
        SupportCounts {
            yes: 1,
            partial: 1,
            no: 1,
            unknown: 3
        }
    );
    assert_eq!(global.support_distribution.total(), 6);
    assert_eq!(global.last_updated.as_deref(), Some("2024-06-10"));
}

#[test]
fn category_filter_recomputes_statistics() {
    let tmp = seed_scenario();
    let ctx = DataContext::new(FileEntityStore::new(tmp.path()));

    let criteria = FilterCriteria::default().with_categories([Category::Execution]);
    let view = ctx.view(&criteria).unwrap();
    let ids: Vec<&str> = view.features.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["f1", "f3"]);

    let global = view.global_stats();
    assert_eq!(global.total_comparisons, 4);
    assert_eq!(global.support_distribution.total(), 4);

    let projected = view.project_matrix();
    assert_eq!(projected.cell_count(), 4);
    assert!(!projected.contains_feature("f2"));
}

#[test]
fn scenario_dataset_validates_cleanly() {
    let tmp = seed_scenario();
    let store = FileEntityStore::new(tmp.path());
    let report = validate_dataset(
        &store.load_agents().unwrap(),
        &store.load_features().unwrap(),
        &store.load_support_records().unwrap(),
    );
    assert!(report.is_valid(), "{}", report);
    assert_eq!(report.records_checked, 3);
}

#[test]
fn support_for_unlisted_feature_does_not_change_shape() {
    let tmp = seed_scenario();
    write(
        tmp.path(),
        "support/b.json",
        r#"{"agent_id":"b","feature_support":[
            {"feature_id":"f1","support_level":"no","last_verified":"2024-01-15"},
            {"feature_id":"ghost","support_level":"yes","last_verified":"2024-01-15"}]}"#,
    );
    let store = FileEntityStore::new(tmp.path());
    let ctx = DataContext::new(store);
    let matrix = ctx.matrix().unwrap();
    assert_eq!(matrix.cell_count(), 6);
    assert!(!matrix.contains_feature("ghost"));

    let records = ctx.support_records().unwrap();
    let features = ctx.features().unwrap();
    let agents = ctx.agents().unwrap();
    let report = validate_dataset(agents, features, records);
    assert_eq!(report.issues.len(), 1);
}

#[test]
fn bundled_dataset_is_valid() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data");
    let ctx = DataContext::new(FileEntityStore::new(root));
    let report = validate_dataset(
        ctx.agents().unwrap(),
        ctx.features().unwrap(),
        ctx.support_records().unwrap(),
    );
    assert!(report.is_valid(), "{}", report);

    let matrix = ctx.matrix().unwrap();
    assert_eq!(matrix.cell_count(), report.agents_checked * report.features_checked);
    assert_eq!(
        matrix.level("windsurf", "inline-completion"),
        SupportLevel::Unknown
    );
}
