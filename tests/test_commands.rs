mod helpers;

use anyhow::Result;
use clap::Parser;
use conveyor_filters::application::StaticSession;
use conveyor_filters::cli::args::Args;
use conveyor_filters::infrastructure::SqliteRepository;
use helpers::TestDatabase;

fn run_as(repo: &mut SqliteRepository, user: &str, argv: &[&str]) -> Result<String> {
    let mut full = vec!["conveyor-filters"];
    full.extend_from_slice(argv);
    let args = Args::try_parse_from(full)?;
    conveyor_filters::execute(repo, &StaticSession::signed_in(user), 2, args.command)
}

#[test]
fn given_created_filters_when_browsing_as_json_then_pages_with_cursor() -> Result<()> {
    // Arrange
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    for name in ["a", "b", "c"] {
        run_as(&mut repo, "alice", &["create", name, "--payload", "{}", "--visibility", "public"])?;
    }

    // Act
    let first = run_as(&mut repo, "bob", &["browse", "--json"])?;
    let first: serde_json::Value = serde_json::from_str(&first)?;
    let cursor = first["next_cursor"].as_str().expect("more pages").to_string();
    let second = run_as(&mut repo, "bob", &["browse", "--json", "--cursor", &cursor])?;
    let second: serde_json::Value = serde_json::from_str(&second)?;

    // Assert
    assert_eq!(first["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(second["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(second["items"][0]["name"], "c");
    assert!(second["next_cursor"].is_null());
    Ok(())
}

#[test]
fn given_category_workflow_when_listing_then_shows_assigned_filter() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let filter_id = run_as(&mut repo, "alice", &["create", "iron", "--payload", "{}"])?;
    let category_id = run_as(&mut repo, "alice", &["category", "add", "Smelting"])?;
    let (filter_id, category_id) = (filter_id.trim(), category_id.trim());

    run_as(&mut repo, "alice", &["assign", filter_id, "--category", category_id])?;
    let listed = run_as(&mut repo, "alice", &["list", "--category", category_id, "--json"])?;
    let loose = run_as(&mut repo, "alice", &["list", "--uncategorized"])?;

    let listed: serde_json::Value = serde_json::from_str(&listed)?;
    assert_eq!(listed[0]["name"], "iron");
    assert_eq!(loose, "no filters\n");
    Ok(())
}

#[test]
fn given_export_command_when_run_then_prints_payload_and_counts() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let payload = r#"{"rules":["iron-plate"]}"#;
    let id = run_as(&mut repo, "alice", &["create", "iron", "--payload", payload, "--visibility", "public"])?;
    let id = id.trim();

    let exported = run_as(&mut repo, "bob", &["export", id])?;
    let shown = run_as(&mut repo, "bob", &["show", id, "--json"])?;

    assert_eq!(exported.trim(), payload);
    let shown: serde_json::Value = serde_json::from_str(&shown)?;
    assert_eq!(shown["export_count"], 1);
    Ok(())
}

#[test]
fn given_selector_without_mine_when_browsing_then_errors() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;

    let result = run_as(&mut repo, "alice", &["browse", "--uncategorized"]);

    assert!(result.is_err());
    Ok(())
}

#[test]
fn given_list_without_selector_when_running_then_errors() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;

    let result = run_as(&mut repo, "alice", &["list"]);

    assert!(result.is_err());
    Ok(())
}

#[test]
fn given_foreign_filter_when_deleting_via_command_then_reports_not_found() -> Result<()> {
    let db = TestDatabase::new()?;
    let mut repo = db.open_repository()?;
    let id = run_as(&mut repo, "bob", &["create", "mine", "--payload", "{}"])?;

    let err = run_as(&mut repo, "alice", &["delete", id.trim()]).unwrap_err();

    assert_eq!(err.to_string(), format!("Filter not found: {}", id.trim()));
    Ok(())
}
