//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--cache-root`, `--no-highlight`, `-b`)
//! 2. `--config <path>`
//! 3. `$GHC_SHELL_CONFIG` environment variable (path to config file)
//! 4. Project-local `.ghc-shell.toml` in the current working directory
//! 5. Global `~/.config/ghc-shell/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

// ── Section configs ──────────────────────────────────────────────────────────

/// General settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory under which per-repository cache directories are created.
    pub cache_root: Option<String>,
    /// Branch used when `-b` is not given.
    pub default_branch: Option<String>,
}

/// Remote API settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the GitHub REST API.
    pub api_base: Option<String>,
    /// `User-Agent` header sent with every request.
    pub user_agent: Option<String>,
    /// Show a percentage while downloading file content.
    pub show_progress: Option<bool>,
}

/// Output settings for `cat`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DisplayConfig {
    /// Syntax highlighting on/off.
    pub highlight: Option<bool>,
    /// Syntax highlighting theme (syntect theme name).
    pub syntax_theme: Option<String>,
    /// Spaces per tab.
    pub tab_width: Option<usize>,
}

/// Shell behaviour.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ShellConfig {
    /// Programs that open a fetched file: `<program> <path>`.
    pub open_with: Option<Vec<String>>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub remote: RemoteConfig,
    pub display: DisplayConfig,
    pub shell: ShellConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "ghc-shell";
pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";
pub const DEFAULT_TAB_WIDTH: usize = 4;
pub const DEFAULT_OPEN_WITH: &[&str] = &["subl", "atom", "code"];

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("GHC_SHELL_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".ghc-shell.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("ghc-shell").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning logged).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => {
            log::debug!("loaded config {}", path.display());
            Some(cfg)
        }
        Err(e) => {
            log::warn!("failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                cache_root: other
                    .general
                    .cache_root
                    .clone()
                    .or(self.general.cache_root),
                default_branch: other
                    .general
                    .default_branch
                    .clone()
                    .or(self.general.default_branch),
            },
            remote: RemoteConfig {
                api_base: other.remote.api_base.clone().or(self.remote.api_base),
                user_agent: other.remote.user_agent.clone().or(self.remote.user_agent),
                show_progress: other.remote.show_progress.or(self.remote.show_progress),
            },
            display: DisplayConfig {
                highlight: other.display.highlight.or(self.display.highlight),
                syntax_theme: other
                    .display
                    .syntax_theme
                    .clone()
                    .or(self.display.syntax_theme),
                tab_width: other.display.tab_width.or(self.display.tab_width),
            },
            shell: ShellConfig {
                open_with: other.shell.open_with.clone().or(self.shell.open_with),
            },
        }
    }

    /// Merge every config source, lowest priority first.
    ///
    /// `explicit` is the `--config` path; `flags` holds values given on the
    /// command line.
    pub fn load(explicit: Option<&Path>, flags: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(path) = explicit {
            match load_file(path) {
                Some(file_cfg) => config = config.merge(&file_cfg),
                None => log::warn!("config file {} not loaded", path.display()),
            }
        }

        if let Some(flags) = flags {
            config = config.merge(flags);
        }

        config
    }

    // ── Getters ─────────────────────────────────────────────────────────────

    /// Directory holding the cache directories; the working directory by default.
    pub fn cache_root(&self) -> PathBuf {
        self.general
            .cache_root
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn default_branch(&self) -> &str {
        self.general
            .default_branch
            .as_deref()
            .unwrap_or(DEFAULT_BRANCH)
    }

    pub fn api_base(&self) -> &str {
        self.remote.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn user_agent(&self) -> &str {
        self.remote.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn show_progress(&self) -> bool {
        self.remote.show_progress.unwrap_or(true)
    }

    pub fn highlight(&self) -> bool {
        self.display.highlight.unwrap_or(true)
    }

    pub fn syntax_theme_name(&self) -> &str {
        self.display
            .syntax_theme
            .as_deref()
            .unwrap_or(DEFAULT_SYNTAX_THEME)
    }

    pub fn tab_width(&self) -> usize {
        self.display.tab_width.unwrap_or(DEFAULT_TAB_WIDTH)
    }

    pub fn open_with(&self) -> Vec<String> {
        self.shell.open_with.clone().unwrap_or_else(|| {
            DEFAULT_OPEN_WITH.iter().map(|s| s.to_string()).collect()
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.cache_root(), PathBuf::from("."));
        assert_eq!(cfg.default_branch(), "master");
        assert_eq!(cfg.api_base(), "https://api.github.com");
        assert_eq!(cfg.user_agent(), "ghc-shell");
        assert!(cfg.show_progress());
        assert!(cfg.highlight());
        assert_eq!(cfg.syntax_theme_name(), "base16-ocean.dark");
        assert_eq!(cfg.tab_width(), 4);
        assert_eq!(cfg.open_with(), vec!["subl", "atom", "code"]);
    }

    #[test]
    fn full_file_parses() {
        let toml = r#"
[general]
cache_root = "/var/cache/ghc"
default_branch = "main"

[remote]
api_base = "https://github.example.com/api/v3"
user_agent = "custom"
show_progress = false

[display]
highlight = false
syntax_theme = "Solarized (dark)"
tab_width = 2

[shell]
open_with = ["vim"]
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.cache_root(), PathBuf::from("/var/cache/ghc"));
        assert_eq!(cfg.default_branch(), "main");
        assert_eq!(cfg.api_base(), "https://github.example.com/api/v3");
        assert_eq!(cfg.user_agent(), "custom");
        assert!(!cfg.show_progress());
        assert!(!cfg.highlight());
        assert_eq!(cfg.syntax_theme_name(), "Solarized (dark)");
        assert_eq!(cfg.tab_width(), 2);
        assert_eq!(cfg.open_with(), vec!["vim"]);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: AppConfig = toml::from_str("[display]\ntab_width = 8\n").expect("parse failed");
        assert_eq!(cfg.tab_width(), 8);
        assert_eq!(cfg.default_branch(), "master");
        assert!(cfg.highlight());
    }

    #[test]
    fn merge_prefers_other_side() {
        let base = AppConfig {
            general: GeneralConfig {
                default_branch: Some("main".into()),
                cache_root: Some("/base".into()),
            },
            ..Default::default()
        };
        let over = AppConfig {
            general: GeneralConfig {
                default_branch: Some("dev".into()),
                ..Default::default()
            },
            display: DisplayConfig {
                highlight: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = base.merge(&over);
        assert_eq!(merged.default_branch(), "dev");
        assert_eq!(merged.cache_root(), PathBuf::from("/base"));
        assert!(!merged.highlight());
    }

    #[test]
    fn unparseable_file_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        assert!(load_file(&cfg_path).is_none());
    }

    #[test]
    fn cli_flags_beat_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            "[general]\ndefault_branch = \"main\"\n\n[display]\ntab_width = 2\n",
        )
        .expect("write");

        let cli_overrides = AppConfig {
            display: DisplayConfig {
                tab_width: Some(8),
                ..Default::default()
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        assert_eq!(cfg.tab_width(), 8);
        assert_eq!(cfg.default_branch(), "main");
    }
}
