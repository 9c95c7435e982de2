//! Language classification
//!
//! Maps file extensions to a language tag and support tier. Classification
//! is a pure function of the path: no I/O, no error path. Unrecognized
//! extensions map to `Unknown` / `RecognitionOnly`. Adding a language is a
//! table edit, not new control flow.

use serde::{Deserialize, Serialize};

/// Language tag assigned to a file. Immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Typescript,
    Java,
    Go,
    Rust,
    C,
    Cpp,
    Csharp,
    Php,
    Ruby,
    Swift,
    Kotlin,
    Sql,
    Bash,
    Yaml,
    Json,
    Xml,
    Html,
    Css,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Csharp => "csharp",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Sql => "sql",
            Language::Bash => "bash",
            Language::Yaml => "yaml",
            Language::Json => "json",
            Language::Xml => "xml",
            Language::Html => "html",
            Language::Css => "css",
            Language::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Depth of analysis available for a language.
///
/// Full-tier languages get external tools plus whatever structural
/// (syntax-tree) checks the catalog carries for them; basic tier gets
/// pattern rules only; recognition-only languages are counted but not
/// rule-checked. A deliberate accuracy/cost trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupportTier {
    Full,
    Basic,
    RecognitionOnly,
}

/// Extension -> (language, tier) table. Case-insensitive on lookup.
const EXTENSION_TABLE: &[(&str, Language, SupportTier)] = &[
    ("py", Language::Python, SupportTier::Full),
    ("pyw", Language::Python, SupportTier::Full),
    ("js", Language::Javascript, SupportTier::Basic),
    ("jsx", Language::Javascript, SupportTier::Basic),
    ("mjs", Language::Javascript, SupportTier::Basic),
    ("ts", Language::Typescript, SupportTier::Basic),
    ("tsx", Language::Typescript, SupportTier::Basic),
    ("java", Language::Java, SupportTier::Basic),
    ("go", Language::Go, SupportTier::Basic),
    ("yml", Language::Yaml, SupportTier::Full),
    ("yaml", Language::Yaml, SupportTier::Full),
    ("rs", Language::Rust, SupportTier::RecognitionOnly),
    ("c", Language::C, SupportTier::RecognitionOnly),
    ("h", Language::C, SupportTier::RecognitionOnly),
    ("cpp", Language::Cpp, SupportTier::RecognitionOnly),
    ("cc", Language::Cpp, SupportTier::RecognitionOnly),
    ("cxx", Language::Cpp, SupportTier::RecognitionOnly),
    ("hpp", Language::Cpp, SupportTier::RecognitionOnly),
    ("cs", Language::Csharp, SupportTier::RecognitionOnly),
    ("php", Language::Php, SupportTier::RecognitionOnly),
    ("rb", Language::Ruby, SupportTier::RecognitionOnly),
    ("swift", Language::Swift, SupportTier::RecognitionOnly),
    ("kt", Language::Kotlin, SupportTier::RecognitionOnly),
    ("sql", Language::Sql, SupportTier::RecognitionOnly),
    ("sh", Language::Bash, SupportTier::RecognitionOnly),
    ("bash", Language::Bash, SupportTier::RecognitionOnly),
    ("json", Language::Json, SupportTier::RecognitionOnly),
    ("xml", Language::Xml, SupportTier::RecognitionOnly),
    ("html", Language::Html, SupportTier::RecognitionOnly),
    ("htm", Language::Html, SupportTier::RecognitionOnly),
    ("css", Language::Css, SupportTier::RecognitionOnly),
    ("scss", Language::Css, SupportTier::RecognitionOnly),
    ("less", Language::Css, SupportTier::RecognitionOnly),
];

/// Classify a path by its extension (case-insensitive).
pub fn classify(path: &std::path::Path) -> (Language, SupportTier) {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if let Some(ext) = ext {
        for (table_ext, lang, tier) in EXTENSION_TABLE {
            if *table_ext == ext {
                return (*lang, *tier);
            }
        }
    }

    (Language::Unknown, SupportTier::RecognitionOnly)
}

/// Classify a language name string, for the snippet-analysis entry point
/// where the caller names the language instead of a file extension.
pub fn classify_name(name: &str) -> (Language, SupportTier) {
    let lower = name.to_ascii_lowercase();
    for (_, lang, tier) in EXTENSION_TABLE {
        if lang.as_str() == lower {
            return (*lang, *tier);
        }
    }
    (Language::Unknown, SupportTier::RecognitionOnly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_python_is_full_tier() {
        let (lang, tier) = classify(Path::new("src/app.py"));
        assert_eq!(lang, Language::Python);
        assert_eq!(tier, SupportTier::Full);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let (lang, _) = classify(Path::new("Setup.PY"));
        assert_eq!(lang, Language::Python);
        let (lang, _) = classify(Path::new("playbook.YML"));
        assert_eq!(lang, Language::Yaml);
    }

    #[test]
    fn test_unrecognized_extension_maps_to_unknown() {
        let (lang, tier) = classify(Path::new("photo.webp"));
        assert_eq!(lang, Language::Unknown);
        assert_eq!(tier, SupportTier::RecognitionOnly);

        // No extension at all
        let (lang, tier) = classify(Path::new("Makefile"));
        assert_eq!(lang, Language::Unknown);
        assert_eq!(tier, SupportTier::RecognitionOnly);
    }

    #[test]
    fn test_yaml_is_full_tier() {
        // YAML carries external linters (yamllint, ansible-lint), so it
        // sits in the full tier alongside python.
        let (lang, tier) = classify(Path::new("deploy/site.yml"));
        assert_eq!(lang, Language::Yaml);
        assert_eq!(tier, SupportTier::Full);
    }

    #[test]
    fn test_basic_tier_languages() {
        assert_eq!(
            classify(Path::new("a.ts")),
            (Language::Typescript, SupportTier::Basic)
        );
        assert_eq!(
            classify(Path::new("a.java")),
            (Language::Java, SupportTier::Basic)
        );
        assert_eq!(
            classify(Path::new("a.go")),
            (Language::Go, SupportTier::Basic)
        );
    }

    #[test]
    fn test_classify_name() {
        assert_eq!(classify_name("python"), (Language::Python, SupportTier::Full));
        assert_eq!(
            classify_name("YAML"),
            (Language::Yaml, SupportTier::Full)
        );
        assert_eq!(
            classify_name("cobol"),
            (Language::Unknown, SupportTier::RecognitionOnly)
        );
    }
}
