use std::collections::HashSet;

// `pattern` is stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRule {
    pub pattern: String,
    pub canonical: String,
}

impl NameRule {
    pub fn new(pattern: &str, canonical: &str) -> Self {
        Self {
            pattern: pattern.to_lowercase(),
            canonical: canonical.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NameNormalizer {
    rules: Vec<NameRule>,
    exclusions: HashSet<String>,
}

impl NameNormalizer {
    pub fn new(rules: Vec<NameRule>, exclusions: impl IntoIterator<Item = String>) -> Self {
        Self {
            rules,
            exclusions: exclusions.into_iter().collect(),
        }
    }

    pub fn rules(&self) -> &[NameRule] {
        &self.rules
    }

    pub fn exclusions(&self) -> &HashSet<String> {
        &self.exclusions
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.exclusions.is_empty()
    }

    pub fn canonical_name(&self, raw: &str) -> String {
        let lowered = raw.to_lowercase();
        self.rules
            .iter()
            .find(|rule| lowered.contains(rule.pattern.as_str()))
            .map(|rule| rule.canonical.clone())
            .unwrap_or_else(|| raw.to_string())
    }

    pub fn normalize_applicant(&self, raw: Option<&str>) -> Option<String> {
        raw.map(|name| self.canonical_name(name))
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclusions.contains(name)
    }
}
