// ABOUTME: Maps file extensions to Tree-sitter grammars and builds configured parsers.
// ABOUTME: Only JavaScript/TypeScript get full fact extraction; the rest are discovery-only.
use grafema_core::Language;
use std::collections::HashMap;
use tree_sitter::Parser;

pub struct LanguageConfig {
    pub language: tree_sitter::Language,
    pub file_extensions: Vec<&'static str>,
    /// Whether `ModuleAnalyzer` runs the full visitor over this language, or
    /// only extracts import/export edges for dependency discovery.
    pub full_surface: bool,
}

pub struct LanguageRegistry {
    configs: HashMap<Language, LanguageConfig>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut configs = HashMap::new();

        configs.insert(
            Language::TypeScript,
            LanguageConfig {
                language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                file_extensions: vec!["ts", "tsx"],
                full_surface: true,
            },
        );

        configs.insert(
            Language::JavaScript,
            LanguageConfig {
                language: tree_sitter_javascript::LANGUAGE.into(),
                file_extensions: vec!["js", "jsx", "mjs", "cjs"],
                full_surface: true,
            },
        );

        configs.insert(
            Language::Rust,
            LanguageConfig {
                language: tree_sitter_rust::LANGUAGE.into(),
                file_extensions: vec!["rs"],
                full_surface: false,
            },
        );

        configs.insert(
            Language::Python,
            LanguageConfig {
                language: tree_sitter_python::LANGUAGE.into(),
                file_extensions: vec!["py", "pyi"],
                full_surface: false,
            },
        );

        configs.insert(
            Language::Go,
            LanguageConfig {
                language: tree_sitter_go::LANGUAGE.into(),
                file_extensions: vec!["go"],
                full_surface: false,
            },
        );

        Self { configs }
    }

    pub fn detect_language(&self, file_path: &str) -> Option<Language> {
        let extension = std::path::Path::new(file_path).extension()?.to_str()?;
        for (lang, config) in &self.configs {
            if config.file_extensions.contains(&extension) {
                return Some(*lang);
            }
        }
        None
    }

    pub fn get_config(&self, language: &Language) -> Option<&LanguageConfig> {
        self.configs.get(language)
    }

    pub fn create_parser(&self, language: &Language) -> Option<Parser> {
        let config = self.get_config(language)?;
        let mut parser = Parser::new();
        parser.set_language(&config.language).ok()?;
        Some(parser)
    }

    pub fn has_full_surface(&self, language: &Language) -> bool {
        self.configs.get(language).map(|c| c.full_surface).unwrap_or(false)
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_typescript_by_extension() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.detect_language("src/index.ts"), Some(Language::TypeScript));
        assert_eq!(registry.detect_language("src/app.tsx"), Some(Language::TypeScript));
    }

    #[test]
    fn javascript_and_typescript_have_full_surface() {
        let registry = LanguageRegistry::new();
        assert!(registry.has_full_surface(&Language::JavaScript));
        assert!(registry.has_full_surface(&Language::TypeScript));
        assert!(!registry.has_full_surface(&Language::Python));
    }

    #[test]
    fn unknown_extension_yields_none() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.detect_language("README.md"), None);
    }
}
