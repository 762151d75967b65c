use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "roster.toml";
const DEFAULT_REPORTS_DIR: &str = "reports";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser, Debug, Default)]
#[command(name = "roster", version, about = "Lecture roster and curve-grading console")]
pub struct Cli {
    /// TOML settings file (defaults to ./roster.toml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory that `export` writes `<lecture>.csv` into.
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,
    /// Emit one JSON object per input line instead of text.
    #[arg(long)]
    pub json: bool,
    /// Suppress banners and prompts in text mode.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    reports_dir: Option<PathBuf>,
    output: Option<OutputFormat>,
    quiet: Option<bool>,
    log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub reports_dir: PathBuf,
    pub output: OutputFormat,
    pub quiet: bool,
    pub log_level: String,
}

impl Config {
    /// Layer CLI flags over the settings file over built-in defaults.
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => load_file(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    load_file(implicit)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Ok(merge(cli, file))
    }
}

fn load_file(path: &Path) -> anyhow::Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
    parse_file(&content).with_context(|| format!("invalid config {}", path.to_string_lossy()))
}

fn parse_file(content: &str) -> anyhow::Result<FileConfig> {
    Ok(toml::from_str(content)?)
}

fn merge(cli: Cli, file: FileConfig) -> Config {
    let output = if cli.json {
        OutputFormat::Json
    } else {
        file.output.unwrap_or_default()
    };
    Config {
        reports_dir: cli
            .reports_dir
            .or(file.reports_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR)),
        output,
        quiet: cli.quiet || file.quiet.unwrap_or(false),
        log_level: file
            .log_level
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_or_flags() {
        let cfg = merge(Cli::default(), FileConfig::default());
        assert_eq!(cfg.reports_dir, PathBuf::from("reports"));
        assert_eq!(cfg.output, OutputFormat::Text);
        assert!(!cfg.quiet);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn file_values_apply_and_flags_win() {
        let file = parse_file(
            r#"
reports_dir = "out/exports"
output = "json"
quiet = true
log_level = "debug"
"#,
        )
        .expect("parse config");
        let cli = Cli {
            reports_dir: Some(PathBuf::from("elsewhere")),
            ..Cli::default()
        };
        let cfg = merge(cli, file);
        assert_eq!(cfg.reports_dir, PathBuf::from("elsewhere"));
        assert_eq!(cfg.output, OutputFormat::Json);
        assert!(cfg.quiet);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn json_flag_overrides_text_file_setting() {
        let file = parse_file("output = \"text\"\n").expect("parse config");
        let cli = Cli {
            json: true,
            ..Cli::default()
        };
        assert_eq!(merge(cli, file).output, OutputFormat::Json);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_file("colour = true\n").is_err());
        assert!(parse_file("output = \"xml\"\n").is_err());
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from(["roster", "--json", "--reports-dir", "r", "--quiet"])
            .expect("parse args");
        assert!(cli.json);
        assert!(cli.quiet);
        assert_eq!(cli.reports_dir, Some(PathBuf::from("r")));
    }
}
