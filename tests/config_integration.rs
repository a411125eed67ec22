use std::path::PathBuf;

use mdpad::config::{ConfigFlags, ThemeMode, load_config_flags, parse_flag_tokens};
use mdpad::scroll::SettleStrategy;

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mdpadrc");
    let content = r#"
# comment
--allow-html

--theme light
   
--render-debug-log=render.log
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.allow_html);
    assert_eq!(flags.theme, Some(ThemeMode::Light));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mdpadrc");
    let content = "--storage-dir docs\n--theme light\n--settle-ms 80\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "mdpad".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--scroll-end".to_string(),
        "list".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert_eq!(
        effective.storage_dir,
        Some(PathBuf::from("docs")),
        "file config should be preserved when CLI does not override"
    );
    assert_eq!(effective.theme, Some(ThemeMode::Dark), "cli should override theme");
    assert_eq!(effective.settle_strategy(), SettleStrategy::ScrollEnd);
}

#[test]
fn test_settle_ms_from_file_sets_timer() {
    let flags = parse_flag_tokens(&["--settle-ms".to_string(), "250".to_string()]);
    assert_eq!(flags.settle_strategy(), SettleStrategy::Timeout { ms: 250 });
}

#[test]
fn test_unparsable_values_are_ignored() {
    let flags = parse_flag_tokens(&[
        "--settle-ms=soon".to_string(),
        "--theme=sepia".to_string(),
    ]);
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}
