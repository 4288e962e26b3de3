use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::dataset::DatasetKind;
use crate::normalize::{NameNormalizer, NameRule};

// Default rule sets are compiled into the binary
const MOLDED_FIBER_RULES: &str = include_str!("../default_rules/molded_fiber.rules");
const DRY_FORMING_RULES: &str = include_str!("../default_rules/dry_forming.rules");

pub fn default_rules_text(kind: DatasetKind) -> &'static str {
    match kind {
        DatasetKind::MoldedFiber => MOLDED_FIBER_RULES,
        DatasetKind::DryForming => DRY_FORMING_RULES,
    }
}

/// Rule file looked up in the working directory when no path is given.
pub fn local_rules_path(kind: DatasetKind) -> PathBuf {
    PathBuf::from(format!("{}.rules", kind.slug()))
}

#[derive(Debug, PartialEq, Eq)]
enum RuleLine {
    Rule(NameRule),
    Exclude(String),
}

fn parse_line(line: &str, rule_re: &Regex) -> Option<RuleLine> {
    if let Some(name) = line.strip_prefix('!') {
        let name = name.trim();
        return (!name.is_empty()).then(|| RuleLine::Exclude(name.to_string()));
    }

    let captures = rule_re.captures(line)?;
    Some(RuleLine::Rule(NameRule::new(
        &captures["pattern"],
        &captures["canonical"],
    )))
}

/// Parses rule file content. With `strict`, the first malformed line is an
/// error; otherwise malformed lines are logged and skipped.
pub fn parse_rules(content: &str, strict: bool) -> Result<NameNormalizer> {
    let rule_re = Regex::new(r"^(?P<pattern>.+?)\s*=>\s*(?P<canonical>\S.*)$")
        .context("Failed to compile rule line pattern")?;

    let mut rules = Vec::new();
    let mut exclusions = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line, &rule_re) {
            Some(RuleLine::Rule(rule)) => rules.push(rule),
            Some(RuleLine::Exclude(name)) => exclusions.push(name),
            None if strict => {
                anyhow::bail!("Invalid rule at line {}: {:?}", line_num + 1, line)
            }
            None => {
                warn!(action = "parse", component = "name_rule", line_number = line_num + 1, rule_line = line, "Invalid rule skipped")
            }
        }
    }

    Ok(NameNormalizer::new(rules, exclusions))
}

pub fn load_rules(kind: DatasetKind, rules_path: Option<&Path>) -> Result<NameNormalizer> {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "rule_loading",
        dataset = kind.slug(),
        "Starting name rule loading"
    );

    let normalizer = if let Some(path) = rules_path {
        info!(action = "load", component = "rule_file", file_path = ?path, "Loading rules from specified file");
        if !path.exists() {
            anyhow::bail!("Rule file not found: {:?}", path);
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        parse_rules(&content, true).with_context(|| format!("Invalid rule file {:?}", path))?
    } else {
        let local_file = local_rules_path(kind);
        let mut normalizer = NameNormalizer::default();
        if local_file.exists() {
            info!(action = "load", component = "local_rule_file", file_path = ?local_file, "Loading rules from working directory");
            let content = fs::read_to_string(&local_file)
                .with_context(|| format!("Failed to read {:?}", local_file))?;
            normalizer = parse_rules(&content, false)?;
        }

        if normalizer.is_empty() {
            info!(
                action = "load",
                component = "embedded_rules",
                dataset = kind.slug(),
                "Using embedded default rules"
            );
            normalizer = parse_rules(default_rules_text(kind), true)
                .context("Failed to parse embedded default rules")?;
        }
        normalizer
    };

    info!(
        action = "complete",
        component = "rule_loading",
        dataset = kind.slug(),
        rule_count = normalizer.rules().len(),
        exclusion_count = normalizer.exclusions().len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Name rules ready"
    );
    Ok(normalizer)
}

/// Writes the embedded rule sets to `dir` so they can be edited.
pub fn init_default_rules(dir: &Path) -> Result<Vec<PathBuf>> {
    let targets: Vec<(DatasetKind, PathBuf)> = DatasetKind::ALL
        .iter()
        .map(|kind| (*kind, dir.join(local_rules_path(*kind))))
        .collect();

    if let Some((_, existing)) = targets.iter().find(|(_, path)| path.exists()) {
        anyhow::bail!(
            "{:?} already exists. Remove it first if you want to reinitialize.",
            existing
        );
    }

    for (kind, path) in &targets {
        fs::write(path, default_rules_text(*kind))
            .with_context(|| format!("Failed to write {:?}", path))?;
    }

    Ok(targets.into_iter().map(|(_, path)| path).collect())
}
