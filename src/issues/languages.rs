use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::Value;

pub const OTHER: &str = "Other";

/// Lower-cased extension (with dot) to language label.
const EXTENSIONS: &[(&str, &str)] = &[
    (".rb", "Ruby"),
    (".erb", "Ruby"),
    (".rake", "Ruby"),
    (".py", "Python"),
    (".js", "JavaScript"),
    (".jsx", "JavaScript"),
    (".mjs", "JavaScript"),
    (".ts", "TypeScript"),
    (".tsx", "TypeScript"),
    (".java", "Java"),
    (".kt", "Kotlin"),
    (".scala", "Scala"),
    (".go", "Go"),
    (".rs", "Rust"),
    (".c", "C"),
    (".h", "C"),
    (".cpp", "C++"),
    (".cc", "C++"),
    (".hpp", "C++"),
    (".cs", "C#"),
    (".php", "PHP"),
    (".swift", "Swift"),
    (".m", "Objective-C"),
    (".ex", "Elixir"),
    (".exs", "Elixir"),
    (".erl", "Erlang"),
    (".hs", "Haskell"),
    (".clj", "Clojure"),
    (".dart", "Dart"),
    (".lua", "Lua"),
    (".sh", "Shell"),
    (".vue", "Vue"),
    (".html", "HTML"),
    (".css", "CSS"),
    (".scss", "SCSS"),
    (".sass", "Sass"),
    (".json", "JSON"),
    (".yml", "YAML"),
    (".yaml", "YAML"),
    (".xml", "XML"),
    (".md", "Markdown"),
    (".sql", "SQL"),
];

/// Per-language issue counts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LanguageCounts {
    counts: BTreeMap<String, usize>,
}

impl LanguageCounts {
    #[allow(dead_code)] // Used by tests
    pub fn get(&self, label: &str) -> Option<usize> {
        self.counts.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries sorted by label.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(label, count)| (label.as_str(), *count))
    }

    fn increment(&mut self, label: &str) {
        *self.counts.entry(label.to_string()).or_insert(0) += 1;
    }
}

pub fn language_for_extension(extension: &str) -> Option<&'static str> {
    EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, language)| *language)
}

/// Lower-cased `.ext` of a path, or None when the file name has no extension.
fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

/// Count issues per language from their `attributes.location.path`.
///
/// Unknown extensions fall into a single bucket labelled
/// `Other (extensions: .a, .b)` listing every distinct extension seen.
pub fn count_languages(issues: &[Value]) -> LanguageCounts {
    let mut counts = LanguageCounts::default();
    let mut unknown = BTreeSet::new();

    for issue in issues {
        let Some(path) = issue
            .pointer("/attributes/location/path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
        else {
            continue;
        };

        match extension_of(path) {
            Some(ext) => match language_for_extension(&ext) {
                Some(language) => counts.increment(language),
                None => {
                    counts.increment(OTHER);
                    unknown.insert(ext);
                }
            },
            None => counts.increment(OTHER),
        }
    }

    if !unknown.is_empty() {
        if let Some(other) = counts.counts.remove(OTHER) {
            let exts: Vec<_> = unknown.into_iter().collect();
            let label = format!("{} (extensions: {})", OTHER, exts.join(", "));
            counts.counts.insert(label, other);
        }
    }

    counts
}
