//! Layered flag configuration.
//!
//! Defaults live in flag files holding plain CLI tokens (`#` comments and
//! blank lines ignored): a global file in the platform config directory and
//! a `.mdpadrc` override in the working directory. Command-line flags win
//! over both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::highlight::HighlightBackground;
use crate::render::RenderOptions;
use crate::scroll::{DEFAULT_SETTLE_TIMEOUT_MS, SettleStrategy};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    /// Highlight palette override; `Auto` keeps the default.
    pub const fn background(self) -> Option<HighlightBackground> {
        match self {
            Self::Auto => None,
            Self::Light => Some(HighlightBackground::Light),
            Self::Dark => Some(HighlightBackground::Dark),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub storage_dir: Option<PathBuf>,
    pub theme: Option<ThemeMode>,
    pub allow_html: bool,
    pub scroll_end: bool,
    pub settle_ms: Option<u64>,
    pub perf: bool,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge with `other` taking precedence for valued options.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            storage_dir: other.storage_dir.clone().or_else(|| self.storage_dir.clone()),
            theme: other.theme.or(self.theme),
            allow_html: self.allow_html || other.allow_html,
            scroll_end: self.scroll_end || other.scroll_end,
            settle_ms: other.settle_ms.or(self.settle_ms),
            perf: self.perf || other.perf,
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            allow_html: self.allow_html,
        }
    }

    pub fn settle_strategy(&self) -> SettleStrategy {
        if self.scroll_end {
            SettleStrategy::ScrollEnd
        } else {
            SettleStrategy::Timeout {
                ms: self.settle_ms.unwrap_or(DEFAULT_SETTLE_TIMEOUT_MS),
            }
        }
    }

    pub fn storage_dir_or_default(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("mdpad").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("mdpad")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("mdpad").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("mdpad").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".mdpadrc")
}

/// Where documents are persisted when no `--storage-dir` is given.
pub fn default_storage_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("LOCALAPPDATA") {
            return PathBuf::from(appdata).join("mdpad").join("documents");
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("mdpad");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".local").join("share").join("mdpad");
        }
    }

    PathBuf::from(".mdpad")
}

/// Read a flags file; a missing file yields defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` as the defaults file at `path`.
///
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# mdpad defaults (saved with --save)".to_string()];
    if let Some(dir) = &flags.storage_dir {
        lines.push(format!("--storage-dir {}", dir.display()));
    }
    if let Some(theme) = flags.theme {
        let theme_str = match theme {
            ThemeMode::Auto => "auto",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        };
        lines.push(format!("--theme {theme_str}"));
    }
    if flags.allow_html {
        lines.push("--allow-html".to_string());
    }
    if flags.scroll_end {
        lines.push("--scroll-end".to_string());
    }
    if let Some(ms) = flags.settle_ms {
        lines.push(format!("--settle-ms {ms}"));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove the defaults file at `path` if present.
///
/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from raw tokens, ignoring everything else.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let takes_value = matches!(
            name,
            "--storage-dir" | "--theme" | "--settle-ms" | "--render-debug-log"
        );
        let value = if takes_value && inline.is_none() {
            i += 1;
            tokens.get(i).map(String::as_str)
        } else {
            inline
        };

        match (name, value) {
            ("--allow-html", _) => flags.allow_html = true,
            ("--scroll-end", _) => flags.scroll_end = true,
            ("--perf", _) => flags.perf = true,
            ("--storage-dir", Some(v)) => flags.storage_dir = Some(PathBuf::from(v)),
            ("--theme", Some(v)) => flags.theme = parse_theme(v),
            ("--settle-ms", Some(v)) => flags.settle_ms = v.parse().ok(),
            ("--render-debug-log", Some(v)) => flags.render_debug_log = Some(PathBuf::from(v)),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = vec![
            "mdpad".to_string(),
            "--storage-dir".to_string(),
            "/tmp/docs".to_string(),
            "--allow-html".to_string(),
            "--theme".to_string(),
            "dark".to_string(),
            "--settle-ms=250".to_string(),
            "--render-debug-log=render.log".to_string(),
            "show".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.storage_dir, Some(PathBuf::from("/tmp/docs")));
        assert!(flags.allow_html);
        assert_eq!(flags.theme, Some(ThemeMode::Dark));
        assert_eq!(flags.settle_ms, Some(250));
        assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
        assert!(!flags.scroll_end);
    }

    #[test]
    fn test_settle_strategy_prefers_scroll_end() {
        let flags = ConfigFlags {
            scroll_end: true,
            settle_ms: Some(40),
            ..ConfigFlags::default()
        };
        assert_eq!(flags.settle_strategy(), SettleStrategy::ScrollEnd);

        let timer = ConfigFlags::default();
        assert_eq!(
            timer.settle_strategy(),
            SettleStrategy::Timeout {
                ms: DEFAULT_SETTLE_TIMEOUT_MS
            }
        );
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            perf: true,
            theme: Some(ThemeMode::Light),
            settle_ms: Some(80),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            allow_html: true,
            theme: Some(ThemeMode::Dark),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.perf);
        assert!(merged.allow_html);
        assert_eq!(merged.theme, Some(ThemeMode::Dark));
        assert_eq!(merged.settle_ms, Some(80));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".mdpadrc");
        let flags = ConfigFlags {
            storage_dir: Some(PathBuf::from("docs")),
            theme: Some(ThemeMode::Dark),
            allow_html: true,
            scroll_end: true,
            settle_ms: Some(120),
            perf: true,
            render_debug_log: Some(PathBuf::from("render.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_theme_background_mapping() {
        assert_eq!(ThemeMode::Auto.background(), None);
        assert_eq!(ThemeMode::Dark.background(), Some(HighlightBackground::Dark));
    }
}
