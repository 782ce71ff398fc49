// tests/config_loading.rs

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use watchcron::config::{load_and_validate, load_from_path, RawRuleFile, RuleSet, RuleSource, TomlRuleSource};
use watchcron::errors::WatchcronError;
use watchcron::{EventMask, Rule};

fn write_table(dir: &TempDir, user: &str, body: &str) -> PathBuf {
    let path = dir.path().join(format!("{user}.toml"));
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn parses_a_full_table() {
    let dir = TempDir::new().unwrap();
    let path = write_table(
        &dir,
        "alice",
        r#"
[[rule]]
path = "/srv/inbox"
events = ["IN_CLOSE_WRITE", "moved_to"]
command = "/usr/local/bin/ingest $@/$#"
no_loop = true

[[rule]]
path = "/etc/hosts"
events = ["IN_MODIFY", "IN_NO_LOOP"]
command = "logger hosts changed"

[[rule]]
path = "/var/spool"
events = ["IN_ALL_EVENTS"]
command = "true"
"#,
    );

    let rules = load_and_validate(&path).unwrap();
    assert_eq!(rules.len(), 3);
    assert_eq!(
        rules.rules()[0],
        Rule::new(
            "/srv/inbox",
            EventMask::CLOSE_WRITE | EventMask::MOVED_TO,
            "/usr/local/bin/ingest $@/$#",
            true
        )
    );
    assert_eq!(rules.rules()[1].mask, EventMask::MODIFY);
    assert!(rules.rules()[1].no_loop);
    assert_eq!(rules.rules()[2].mask, EventMask::ALL_EVENTS);
    assert!(!rules.rules()[2].no_loop);
}

#[test]
fn empty_file_is_an_empty_table() {
    let dir = TempDir::new().unwrap();
    let path = write_table(&dir, "bob", "");
    assert!(load_and_validate(&path).unwrap().is_empty());
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_table(
        &dir,
        "bob",
        r#"
[[rule]]
path = "/tmp"
events = ["IN_CREATE"]
command = "true"
recursive = true
"#,
    );
    assert!(matches!(load_from_path(&path), Err(WatchcronError::TomlError(_))));
}

#[test]
fn validation_errors() {
    let cases = [
        (r#"path = "relative/dir""#, r#"events = ["IN_CREATE"]"#, r#"command = "true""#),
        (r#"path = "/tmp""#, r#"events = ["IN_CREATE"]"#, r#"command = "   ""#),
        (r#"path = "/tmp""#, r#"events = []"#, r#"command = "true""#),
        (r#"path = "/tmp""#, r#"events = ["IN_NO_LOOP"]"#, r#"command = "true""#),
        (r#"path = "/tmp""#, r#"events = ["IN_DONT_FOLLOW"]"#, r#"command = "true""#),
    ];

    for (path, events, command) in cases {
        let body = format!("[[rule]]\n{path}\n{events}\n{command}\n");
        let raw: RawRuleFile = toml::from_str(&body).unwrap();
        let result = RuleSet::try_from(raw);
        assert!(
            matches!(result, Err(WatchcronError::ConfigError(_))),
            "expected ConfigError for:\n{body}\ngot {result:?}"
        );
    }
}

#[test]
fn unknown_event_name_is_reported() {
    let body = "[[rule]]\npath = \"/tmp\"\nevents = [\"IN_EXPLODE\"]\ncommand = \"true\"\n";
    let raw: RawRuleFile = toml::from_str(body).unwrap();
    match RuleSet::try_from(raw) {
        Err(WatchcronError::UnknownEvent(name)) => assert_eq!(name, "IN_EXPLODE"),
        other => panic!("expected UnknownEvent, got {other:?}"),
    }
}

#[test]
fn dont_follow_is_kept_alongside_real_events() {
    let body =
        "[[rule]]\npath = \"/tmp/link\"\nevents = [\"IN_ATTRIB\", \"IN_DONT_FOLLOW\"]\ncommand = \"true\"\n";
    let raw: RawRuleFile = toml::from_str(body).unwrap();
    let rules = RuleSet::try_from(raw).unwrap();
    assert_eq!(rules.rules()[0].mask, EventMask::ATTRIB | EventMask::DONT_FOLLOW);
}

#[test]
fn toml_source_lists_users_and_loads_tables() {
    let dir = TempDir::new().unwrap();
    write_table(
        &dir,
        "zoe",
        "[[rule]]\npath = \"/tmp\"\nevents = [\"IN_CREATE\"]\ncommand = \"true\"\n",
    );
    write_table(&dir, "adam", "");
    fs::write(dir.path().join("README"), "not a table").unwrap();
    fs::create_dir(dir.path().join("nested.toml")).unwrap();

    let source = TomlRuleSource::new(dir.path());
    assert_eq!(source.users().unwrap(), vec!["adam", "zoe"]);
    assert_eq!(source.table_path("zoe"), dir.path().join("zoe.toml"));

    let rules = source.load_rules("zoe").unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].path, PathBuf::from("/tmp"));
    assert!(source.load_rules("adam").unwrap().is_empty());
}

#[test]
fn missing_table_means_no_rules() {
    let dir = TempDir::new().unwrap();
    let source = TomlRuleSource::new(dir.path());
    assert!(source.load_rules("nobody").unwrap().is_empty());
}

#[test]
fn broken_table_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_table(&dir, "carol", "[[rule]\npath = ");
    let source = TomlRuleSource::new(dir.path());
    assert!(matches!(source.load_rules("carol"), Err(WatchcronError::TomlError(_))));
}

#[test]
fn missing_table_dir_cannot_be_listed() {
    let dir = TempDir::new().unwrap();
    let source = TomlRuleSource::new(dir.path().join("absent"));
    assert!(source.users().is_err());
}
