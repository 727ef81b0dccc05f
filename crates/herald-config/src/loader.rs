use crate::schema::HeraldConfig;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Jsonc,
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "jsonc" => Some(Self::Jsonc),
            "json" => Some(Self::Json),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: HeraldConfig,
    pub path: PathBuf,
    pub format: ConfigFormat,
}

pub fn load_config(config_path: Option<&Path>) -> Result<HeraldConfig> {
    resolve_config(config_path).map(|r| r.config)
}

pub fn resolve_config(config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let path = config_path
        .map(Path::to_path_buf)
        .or_else(find_config_file)
        .ok_or_else(|| anyhow!("No configuration file found"))?;

    load_config_from_file(&path)
}

/// Loads the explicit path when given, otherwise the first discovered file,
/// otherwise the built-in defaults.
pub fn load_or_default(config_path: Option<&Path>) -> Result<HeraldConfig> {
    match config_path.map(Path::to_path_buf).or_else(find_config_file) {
        Some(path) => load_config_from_file(&path).map(|r| r.config),
        None => Ok(HeraldConfig::default()),
    }
}

pub fn load_config_from_file(path: &Path) -> Result<ResolvedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| anyhow!("Unknown config format for: {}", path.display()))?;

    let config = expand_env_vars(parse_config_content(&content, format)?);
    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(ResolvedConfig {
        config,
        path: path.to_path_buf(),
        format,
    })
}

fn parse_config_content(content: &str, format: ConfigFormat) -> Result<HeraldConfig> {
    match format {
        ConfigFormat::Jsonc => json5::from_str(content).context("Failed to parse JSONC"),
        ConfigFormat::Json => serde_json::from_str(content).context("Failed to parse JSON"),
        ConfigFormat::Yaml => serde_yaml_ng::from_str(content).context("Failed to parse YAML"),
    }
}

const CONFIG_CANDIDATES: &[&str] = &[
    "herald.jsonc",
    "herald.json",
    "herald.yml",
    "herald.yaml",
    ".herald.jsonc",
    ".herald.json",
    ".herald.yml",
    ".herald.yaml",
];

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::new()];
    if let Ok(home) = env::var("HOME") {
        dirs.push(PathBuf::from(home).join(".config").join("herald"));
    }
    dirs
}

fn find_config_file() -> Option<PathBuf> {
    find_all_config_files().into_iter().next()
}

/// Every existing config file, current directory first, then the global one.
pub fn find_all_config_files() -> Vec<PathBuf> {
    search_dirs()
        .iter()
        .flat_map(|dir| CONFIG_CANDIDATES.iter().map(move |name| dir.join(name)))
        .filter(|path| path.exists())
        .collect()
}

fn expand_env_vars(mut config: HeraldConfig) -> HeraldConfig {
    config.telemetry.level = expand_env_string(&config.telemetry.level);
    config
}

/// Replaces `$VAR` and `${VAR}` with the variable's value, or nothing if unset.
fn expand_env_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let mut name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if !(c.is_ascii_alphanumeric() || c == '_') {
                    break;
                }
                name.push(c);
                chars.next();
            }
        }

        if name.is_empty() {
            result.push('$');
        } else {
            result.push_str(&env::var(&name).unwrap_or_default());
        }
    }

    result
}
