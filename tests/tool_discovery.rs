//! Integration tests for scanning a tools directory into a catalog.

mod test_helpers;

use rstest::{fixture, rstest};
use serde_json::json;
use std::time::Duration;
use test_helpers::Workspace;
use toolbridge::tool_registry::{
    adapters::BuiltinToolbox,
    domain::ToolKind,
    services::{SkipReason, ToolDiscovery},
};

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

fn discovery() -> ToolDiscovery {
    ToolDiscovery::new(BuiltinToolbox::with_defaults(), Duration::from_secs(5))
}

fn builtin(name: &str, builtin: &str) -> serde_json::Value {
    json!({
        "name": name,
        "description": format!("{name} tool"),
        "input_schema": {"type": "object"},
        "entry": {"kind": "builtin", "builtin": builtin}
    })
}

#[rstest]
fn five_valid_units_load_and_one_broken_unit_is_skipped(workspace: Workspace) {
    for (file, name, implementation) in [
        ("a.json", "Alpha", "echo"),
        ("b.json", "Bravo", "uppercase"),
        ("c.json", "Charlie", "word_count"),
        ("d.json", "Delta", "echo"),
        ("e.json", "Echo Location", "echo"),
    ] {
        workspace.write_manifest(file, &builtin(name, implementation));
    }
    workspace.write_tool_file("f.json", "{ this is not a manifest");

    let report = discovery()
        .discover(&workspace.tools_dir())
        .expect("scan succeeds");

    assert_eq!(report.snapshot.len(), 5);
    assert_eq!(report.skipped.len(), 1);
    let skipped = report.skipped.first().expect("skipped unit");
    assert_eq!(skipped.file_name, "f.json");
    assert!(matches!(skipped.reason, SkipReason::Malformed(_)));
}

#[rstest]
fn identifiers_are_derived_from_declared_names(workspace: Workspace) {
    workspace.write_manifest("weather.json", &builtin("Weather Lookup!", "echo"));

    let report = discovery()
        .discover(&workspace.tools_dir())
        .expect("scan succeeds");

    let ids: Vec<&str> = report
        .snapshot
        .descriptors()
        .map(|descriptor| descriptor.id().as_str())
        .collect();
    assert_eq!(ids, ["weather_lookup"]);
}

#[rstest]
fn later_units_replace_earlier_duplicates(workspace: Workspace) {
    workspace.write_manifest("1_first.json", &builtin("Shared", "echo"));
    workspace.write_manifest("2_second.json", &builtin("shared", "uppercase"));

    let report = discovery()
        .discover(&workspace.tools_dir())
        .expect("scan succeeds");

    assert_eq!(report.snapshot.len(), 1);
    let replaced = report.replaced.first().expect("collision reported");
    assert_eq!(replaced.id.as_str(), "shared");
    assert_eq!(replaced.previous_file, "1_first.json");
    assert_eq!(replaced.replacing_file, "2_second.json");
    let descriptor = report
        .snapshot
        .get("shared")
        .expect("shared tool")
        .descriptor();
    assert_eq!(descriptor.description(), "shared tool");
}

#[rstest]
fn repeated_scans_produce_the_same_catalog(workspace: Workspace) {
    workspace.write_manifest("b.json", &builtin("Bravo", "echo"));
    workspace.write_manifest("a.json", &builtin("Alpha", "echo"));

    let first = discovery()
        .discover(&workspace.tools_dir())
        .expect("first scan");
    let second = discovery()
        .discover(&workspace.tools_dir())
        .expect("second scan");

    let first_ids: Vec<_> = first.snapshot.descriptors().map(|d| d.id().clone()).collect();
    let second_ids: Vec<_> = second.snapshot.descriptors().map(|d| d.id().clone()).collect();
    assert_eq!(first_ids, second_ids);
    assert!(
        first
            .snapshot
            .descriptors()
            .all(|descriptor| descriptor.kind() == ToolKind::Local)
    );
}

#[rstest]
#[case::missing_schema(json!({"name": "x", "entry": {"kind": "builtin", "builtin": "echo"}}))]
#[case::blank_name(json!({"name": "  ", "input_schema": {}, "entry": {"kind": "builtin", "builtin": "echo"}}))]
#[case::unknown_entry_kind(json!({"name": "x", "input_schema": {}, "entry": {"kind": "plugin"}}))]
fn contract_violations_are_skipped(workspace: Workspace, #[case] body: serde_json::Value) {
    workspace.write_manifest("bad.json", &body);
    workspace.write_manifest("good.json", &builtin("Good", "echo"));

    let report = discovery()
        .discover(&workspace.tools_dir())
        .expect("scan succeeds");

    assert_eq!(report.snapshot.len(), 1);
    assert_eq!(report.skipped.len(), 1);
}

#[rstest]
fn scanning_does_not_modify_the_directory(workspace: Workspace) {
    workspace.write_manifest("a.json", &builtin("Alpha", "echo"));
    workspace.write_tool_file("broken.json", "[]");
    let before = directory_listing(&workspace);

    discovery()
        .discover(&workspace.tools_dir())
        .expect("scan succeeds");

    assert_eq!(directory_listing(&workspace), before);
}

fn directory_listing(workspace: &Workspace) -> Vec<(String, u64)> {
    let mut listing: Vec<(String, u64)> = std::fs::read_dir(workspace.tools_dir())
        .expect("list tools directory")
        .map(|listed| {
            let entry = listed.expect("directory entry");
            let size = entry.metadata().expect("metadata").len();
            (entry.file_name().to_string_lossy().into_owned(), size)
        })
        .collect();
    listing.sort();
    listing
}
