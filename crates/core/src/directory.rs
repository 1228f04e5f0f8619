use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Lookup tables fetched by a collaborator before evaluation.
///
/// Every lookup degrades instead of failing: names fall back to the raw
/// code, links to `None`, categories to the uncategorized label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directories {
    /// Client or product code to display name.
    pub names: HashMap<String, String>,
    /// Client code to external reference link.
    pub links: HashMap<String, String>,
    /// Product code to category label.
    pub categories: HashMap<String, String>,
    pub uncategorized_label: String,
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            names: HashMap::new(),
            links: HashMap::new(),
            categories: HashMap::new(),
            uncategorized_label: DEFAULT_UNCATEGORIZED_LABEL.to_string(),
        }
    }
}

impl Directories {
    pub fn with_uncategorized_label(mut self, label: impl Into<String>) -> Self {
        self.uncategorized_label = label.into();
        self
    }

    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        lookup(&self.names, code).unwrap_or(code)
    }

    pub fn link(&self, code: &str) -> Option<&str> {
        lookup(&self.links, code)
    }

    pub fn category(&self, product_code: &str) -> &str {
        lookup(&self.categories, product_code).unwrap_or(&self.uncategorized_label)
    }
}

fn lookup<'a>(map: &'a HashMap<String, String>, code: &str) -> Option<&'a str> {
    map.get(code).map(|value| value.trim()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Directories, DEFAULT_UNCATEGORIZED_LABEL};

    #[test]
    fn missing_entries_fall_back_to_identity() {
        let directories = Directories::default();

        assert_eq!(directories.display_name("P-100"), "P-100");
        assert_eq!(directories.link("C1"), None);
        assert_eq!(directories.category("P-100"), DEFAULT_UNCATEGORIZED_LABEL);
    }

    #[test]
    fn blank_entries_count_as_missing() {
        let mut directories = Directories::default().with_uncategorized_label("Misc");
        directories.names.insert("P-1".to_string(), "  ".to_string());
        directories.categories.insert("P-1".to_string(), "Paint".to_string());
        directories.links.insert("C1".to_string(), "https://crm.example/c/1".to_string());

        assert_eq!(directories.display_name("P-1"), "P-1");
        assert_eq!(directories.category("P-1"), "Paint");
        assert_eq!(directories.category("P-2"), "Misc");
        assert_eq!(directories.link("C1"), Some("https://crm.example/c/1"));
    }
}
