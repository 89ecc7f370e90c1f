use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use form_saver::cli::commands::{
    cmd_data_clear_all, cmd_data_clear_site, cmd_data_show, cmd_init, cmd_relay, cmd_sites_add,
    cmd_sites_list, cmd_sites_remove, cmd_sites_toggle, cmd_stats,
};
use form_saver::cli::config::{
    AppConfig, Cli, Commands, DataCommand, ConfigError, SitesCommand, read_config, resolve_store_path,
};
use form_saver::page::page_id::PageIdentifier;
use form_saver::snapshot::snapshot_model::{FieldSnapshot, PageSnapshot, VariantValue};
use form_saver::store::adapter::StoreAdapter;
use form_saver::store::store::MemoryStore;
use form_saver::trace::subscriber::level_for_verbosity;
use serde_json::{Value, json};

fn adapter() -> StoreAdapter<MemoryStore> {
    StoreAdapter::new(Arc::new(MemoryStore::new()))
}

fn email_snapshot(url: &str) -> PageSnapshot {
    let mut snapshot = PageSnapshot {
        fields: Default::default(),
        saved_at: 42,
        source_url: url.to_string(),
    };
    snapshot.fields.insert(
        "id:email".into(),
        FieldSnapshot {
            tag: "INPUT".into(),
            field_type: "email".into(),
            value: VariantValue::Text("ada@example.com".into()),
        },
    );
    snapshot
}

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_sites_commands() {
    let cli = Cli::parse_from(["form-saver", "sites", "add", "https://example.com/login"]);
    match cli.command {
        Commands::Sites {
            action: SitesCommand::Add { site },
        } => assert_eq!(site, "https://example.com/login"),
        _ => panic!("Expected sites add"),
    }

    let cli = Cli::parse_from(["form-saver", "sites", "toggle", "example.com"]);
    assert!(matches!(
        cli.command,
        Commands::Sites {
            action: SitesCommand::Toggle { .. }
        }
    ));

    let cli = Cli::parse_from(["form-saver", "sites", "list"]);
    assert!(matches!(
        cli.command,
        Commands::Sites {
            action: SitesCommand::List
        }
    ));
}

#[test]
fn cli_parse_data_commands() {
    let cli = Cli::parse_from(["form-saver", "data", "clear-site", "example.com"]);
    match cli.command {
        Commands::Data {
            action: DataCommand::ClearSite { site, yes },
        } => {
            assert_eq!(site, "example.com");
            assert!(!yes, "confirmation defaults off");
        }
        _ => panic!("Expected data clear-site"),
    }

    let cli = Cli::parse_from(["form-saver", "data", "clear-all", "--yes"]);
    assert!(matches!(
        cli.command,
        Commands::Data {
            action: DataCommand::ClearAll { yes: true }
        }
    ));

    let cli = Cli::parse_from(["form-saver", "data", "show", "https://example.com/a"]);
    assert!(matches!(
        cli.command,
        Commands::Data {
            action: DataCommand::Show { .. }
        }
    ));
}

#[test]
fn cli_parse_global_flags() {
    let cli = Cli::parse_from([
        "form-saver",
        "-vv",
        "--store",
        "/tmp/s.json",
        "--config",
        "alt.yaml",
        "stats",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.store.as_deref(), Some("/tmp/s.json"));
    assert_eq!(cli.config.as_deref(), Some("alt.yaml"));
    assert!(matches!(cli.command, Commands::Stats));

    let cli = Cli::parse_from(["form-saver", "relay", "-v"]);
    assert_eq!(cli.verbose, 1, "global flag after subcommand");
    assert!(matches!(cli.command, Commands::Relay));
}

#[test]
fn cli_rejects_missing_subcommand() {
    assert!(Cli::try_parse_from(["form-saver"]).is_err());
    assert!(Cli::try_parse_from(["form-saver", "sites", "add"]).is_err());
}

#[test]
fn verbosity_overrides_configured_level() {
    assert_eq!(level_for_verbosity(0, "warn"), "warn");
    assert_eq!(level_for_verbosity(1, "warn"), "debug");
    assert_eq!(level_for_verbosity(4, "warn"), "trace");
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_load_missing_file() {
    let config = read_config(Some("nonexistent_file_that_does_not_exist.yaml")).unwrap();
    assert_eq!(config.store.path, "form-saver-store.json");
    assert_eq!(config.agent.autosave_delay_ms, 500);
    assert_eq!(config.logging.level, "info");
    assert!(config.trace.path.is_none());
}

#[test]
fn config_default_timing_matches_agent() {
    let agent = AppConfig::default().agent.to_agent_config();
    assert_eq!(agent.autosave_delay, Duration::from_millis(500));
    assert_eq!(agent.rebind_delay, Duration::from_millis(1000));
    assert_eq!(agent.retry_interval, Duration::from_millis(1000));
    assert_eq!(agent.max_restore_attempts, 10);
    assert_eq!(agent, Default::default());
}

#[test]
fn config_partial_yaml_file() {
    let dir = std::env::temp_dir().join("form_saver_cli_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("partial.yaml");
    std::fs::write(
        &path,
        r#"
store:
  path: "/var/lib/form-saver/store.json"
agent:
  autosave_delay_ms: 250
trace:
  path: "trace.jsonl"
"#,
    )
    .unwrap();

    let config = read_config(path.to_str()).unwrap();
    assert_eq!(config.store.path, "/var/lib/form-saver/store.json");
    assert_eq!(config.agent.autosave_delay_ms, 250);
    // Unset fields keep their defaults
    assert_eq!(config.agent.rebind_delay_ms, 1000);
    assert_eq!(config.agent.max_restore_attempts, 10);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.trace.path.as_deref(), Some("trace.jsonl"));
}

#[test]
fn config_malformed_yaml_is_reported() {
    let dir = std::env::temp_dir().join("form_saver_cli_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("malformed.yaml");
    std::fs::write(&path, "agent: [this is: not a map").unwrap();

    let err = read_config(path.to_str()).unwrap_err();
    let ConfigError::Malformed { path: reported, .. } = &err;
    assert_eq!(reported.as_str(), path.to_str().unwrap());
    assert!(err.to_string().starts_with("malformed config"));
}

#[test]
fn store_path_resolution_order() {
    let mut config = AppConfig::default();
    assert_eq!(resolve_store_path(None, &config), "form-saver-store.json");

    config.store.path = "from-config.json".into();
    assert_eq!(resolve_store_path(None, &config), "from-config.json");
    assert_eq!(resolve_store_path(Some("flag.json"), &config), "flag.json");
}

// ============================================================================
// Command Tests (in-memory store)
// ============================================================================

#[tokio::test]
async fn init_is_idempotent() {
    let store = adapter();
    assert_eq!(cmd_init(&store).await.unwrap(), "Store initialized");
    assert_eq!(cmd_init(&store).await.unwrap(), "Store already initialized");
}

#[tokio::test]
async fn site_commands_normalize_urls_to_hosts() {
    let store = adapter();
    assert_eq!(cmd_sites_list(&store).await.unwrap(), "No sites protected yet");

    assert_eq!(
        cmd_sites_add(&store, "https://example.com/login?next=/").await.unwrap(),
        "Protecting example.com"
    );
    assert_eq!(
        cmd_sites_add(&store, "example.com").await.unwrap(),
        "example.com is already protected"
    );
    assert_eq!(
        cmd_sites_toggle(&store, "shop.test").await.unwrap(),
        "shop.test: Enabled"
    );
    assert_eq!(
        cmd_sites_list(&store).await.unwrap(),
        "example.com\nshop.test"
    );
    assert_eq!(
        cmd_sites_toggle(&store, "https://shop.test/cart").await.unwrap(),
        "shop.test: Disabled"
    );
    assert_eq!(
        cmd_sites_remove(&store, "example.com").await.unwrap(),
        "No longer protecting example.com"
    );
    assert_eq!(
        cmd_sites_remove(&store, "example.com").await.unwrap(),
        "example.com was not protected"
    );
}

#[tokio::test]
async fn data_show_uses_canonical_page_id() {
    let store = adapter();
    assert_eq!(
        cmd_data_show(&store, "https://example.com/a").await.unwrap(),
        "No saved data for this page"
    );

    let page = PageIdentifier::from_url("https://example.com/a").unwrap();
    store
        .save_page(&page, email_snapshot("https://example.com/a"))
        .await
        .unwrap();

    let shown = cmd_data_show(&store, "https://example.com/a?utm_source=mail")
        .await
        .unwrap();
    let shown: Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(shown["data"]["id:email"]["value"], json!("ada@example.com"));
    assert_eq!(shown["savedAt"], json!(42));

    assert!(cmd_data_show(&store, "not a url").await.is_err());
}

#[tokio::test]
async fn destructive_commands_require_confirmation() {
    let store = adapter();
    store.add_site("example.com").await.unwrap();
    for url in ["https://example.com/a", "https://example.com/b"] {
        let page = PageIdentifier::from_url(url).unwrap();
        store.save_page(&page, email_snapshot(url)).await.unwrap();
    }
    assert_eq!(
        cmd_stats(&store).await.unwrap(),
        "Protected sites: 1\nSaved forms: 2"
    );

    let refused = cmd_data_clear_site(&store, "example.com", false).await.unwrap();
    assert!(refused.contains("--yes"));
    assert_eq!(store.form_data().await.unwrap().len(), 2);

    assert_eq!(
        cmd_data_clear_site(&store, "https://example.com/", true).await.unwrap(),
        "Cleared 2 saved pages for example.com"
    );

    let refused = cmd_data_clear_all(&store, false).await.unwrap();
    assert!(refused.contains("--yes"));
    assert_eq!(store.protected_sites().await.unwrap().len(), 1);

    cmd_data_clear_all(&store, true).await.unwrap();
    assert_eq!(
        cmd_stats(&store).await.unwrap(),
        "Protected sites: 0\nSaved forms: 0"
    );
}

#[tokio::test]
async fn relay_command_answers_each_line() {
    let store = adapter();
    let input = concat!(
        r#"{"action":"saveFormData","pageId":"https://example.com/a","data":{"data":{"id:email":{"tag":"INPUT","type":"email","value":"x@y.z"}},"savedAt":1,"url":"https://example.com/a"}}"#,
        "\n\n",
        r#"{"action":"getFormData","pageId":"https://example.com/a"}"#,
        "\n",
        "garbage\n",
    );
    let mut output = Vec::new();

    let handled = cmd_relay(&store, input.as_bytes(), &mut output).await.unwrap();
    assert_eq!(handled, 3, "blank lines are skipped");

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines[0], json!({"success": true}));
    assert_eq!(lines[1]["data"]["data"]["id:email"]["value"], json!("x@y.z"));
    assert_eq!(lines[2]["success"], json!(false));
}
