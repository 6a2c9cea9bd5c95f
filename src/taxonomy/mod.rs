//! Skill synonym table and free-text term extraction.
//!
//! The table is built once at startup and shared by reference. Expansion follows
//! listed synonyms exactly one hop; `a -> b` and `b -> c` never yield `a -> c`.

mod terms;

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use anyhow::Context;
use serde::Deserialize;

pub use terms::{extract_terms, normalize, phrase_contains, split_compound};

const BUILTIN: &[(&str, &[&str])] = &[
    ("ai", &["artificial intelligence"]),
    ("artificial intelligence", &["ai"]),
    ("ml", &["machine learning"]),
    ("machine learning", &["ml"]),
    ("ds", &["data science"]),
    ("data science", &["ds"]),
    ("web dev", &["web development"]),
    ("web development", &["web dev"]),
    ("app dev", &["app development", "mobile app development"]),
    ("app development", &["app dev"]),
    ("js", &["javascript"]),
    ("javascript", &["js"]),
    ("ts", &["typescript"]),
    ("typescript", &["ts"]),
    ("cpp", &["c++"]),
    ("c++", &["cpp"]),
    ("react", &["reactjs", "react.js"]),
    ("reactjs", &["react"]),
    ("node", &["nodejs", "node.js"]),
    ("nodejs", &["node"]),
    ("ui/ux", &["user interface", "user experience", "ui", "ux"]),
    ("ui", &["ui/ux", "user interface"]),
    ("ux", &["ui/ux", "user experience"]),
    ("py", &["python"]),
    ("python", &["py"]),
    ("nlp", &["natural language processing"]),
    ("natural language processing", &["nlp"]),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    synonyms: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Deserialize)]
struct TaxonomyFile {
    #[serde(default)]
    synonyms: BTreeMap<String, Vec<String>>,
}

impl Taxonomy {
    /// The platform's curated table.
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN
                .iter()
                .map(|(term, synonyms)| (*term, synonyms.iter().copied())),
        )
    }

    pub fn from_entries<I, K, S, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: AsRef<str>,
        S: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let mut synonyms: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (term, listed) in entries {
            let term = normalize(term.as_ref());
            if term.is_empty() {
                continue;
            }
            let entry = synonyms.entry(term).or_default();
            entry.extend(
                listed
                    .into_iter()
                    .map(|synonym| normalize(synonym.as_ref()))
                    .filter(|synonym| !synonym.is_empty()),
            );
        }

        Self { synonyms }
    }

    /// Parses a `[synonyms]` table, e.g.
    ///
    /// ```toml
    /// [synonyms]
    /// ai = ["artificial intelligence"]
    /// "artificial intelligence" = ["ai"]
    /// ```
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        let file: TaxonomyFile = toml::from_str(source).context("parse skill taxonomy")?;
        Ok(Self::from_entries(file.synonyms))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("read skill taxonomy {}", path.display()))?;
        Self::from_toml_str(&source)
    }

    pub fn synonyms(&self, term: &str) -> impl Iterator<Item = &str> {
        self.synonyms
            .get(&normalize(term))
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Each normalized input plus its directly listed synonyms.
    pub fn expand<I, S>(&self, terms: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut expanded = BTreeSet::new();
        for term in terms {
            let term = normalize(term.as_ref());
            if term.is_empty() {
                continue;
            }
            if let Some(synonyms) = self.synonyms.get(&term) {
                expanded.extend(synonyms.iter().cloned());
            }
            expanded.insert(term);
        }
        expanded
    }

    /// Every term the table mentions, as a key or as a synonym.
    pub fn known_terms(&self) -> BTreeSet<String> {
        self.synonyms
            .iter()
            .flat_map(|(term, synonyms)| std::iter::once(term).chain(synonyms))
            .cloned()
            .collect()
    }

    /// Known terms mentioned anywhere in free prose, matched on whole words.
    pub fn scan_prose(&self, text: &str) -> BTreeSet<String> {
        let words = terms::prose_words(text);
        if words.is_empty() {
            return BTreeSet::new();
        }

        self.known_terms()
            .into_iter()
            .filter(|term| phrase_contains(&words, term))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.synonyms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(terms: &[&str]) -> BTreeSet<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn builtin_pairs_expand_both_ways() {
        let taxonomy = Taxonomy::builtin();
        for (term, synonyms) in BUILTIN {
            for synonym in *synonyms {
                assert!(taxonomy.expand([*term]).contains(*synonym), "{term} -> {synonym}");
                // only pairs the table lists in both directions are symmetric
                if taxonomy.synonyms(synonym).any(|back| back == *term) {
                    assert!(taxonomy.expand([*synonym]).contains(*term), "{synonym} -> {term}");
                }
            }
        }
        assert!(taxonomy.expand(["ai"]).contains("artificial intelligence"));
        assert!(taxonomy.expand(["artificial intelligence"]).contains("ai"));
    }

    #[test]
    fn expansion_normalizes_and_keeps_input() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(taxonomy.expand(["  Py "]), set(&["py", "python"]));
        assert_eq!(taxonomy.expand(["Rust"]), set(&["rust"]));
        assert!(taxonomy.expand(["", "   "]).is_empty());
    }

    #[test]
    fn expansion_is_one_hop() {
        let taxonomy = Taxonomy::from_entries([("a", ["b"]), ("b", ["c"])]);
        assert_eq!(taxonomy.expand(["a"]), set(&["a", "b"]));
    }

    #[test]
    fn app_dev_is_not_symmetric_for_mobile() {
        let taxonomy = Taxonomy::builtin();
        assert!(taxonomy.expand(["app dev"]).contains("mobile app development"));
        assert_eq!(
            taxonomy.expand(["mobile app development"]),
            set(&["mobile app development"])
        );
    }

    #[test]
    fn loads_from_toml() {
        let taxonomy = Taxonomy::from_toml_str(
            r#"
            [synonyms]
            "Computer Vision" = ["cv"]
            cv = ["computer vision"]
            "#,
        )
        .unwrap();

        assert_eq!(taxonomy.len(), 2);
        assert!(taxonomy.expand(["CV"]).contains("computer vision"));
        assert!(Taxonomy::from_toml_str("synonyms = 3").is_err());
    }

    #[test]
    fn known_terms_cover_keys_and_synonyms() {
        let known = Taxonomy::builtin().known_terms();
        assert!(known.contains("react.js"));
        assert!(known.contains("mobile app development"));
        assert!(known.contains("py"));
    }

    #[test]
    fn scans_prose_for_known_terms() {
        let taxonomy = Taxonomy::builtin();
        let found = taxonomy.scan_prose("A React dashboard for students, built on Node.js.");
        assert_eq!(found, set(&["node.js", "react"]));
    }
}
