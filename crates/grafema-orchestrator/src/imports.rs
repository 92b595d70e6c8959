//! Lightweight import-specifier extraction used only by the Indexing
//! phase's reachability walk. Deliberately *not* a full
//! parse: Indexing only needs "what files does this one reference", not
//! the rich fact surface `grafema-analyzer`'s single-traversal visitor
//! produces during Analysis — running the full visitor twice per file
//! would violate the single-traversal performance contract it exists to
//! uphold.

use regex::Regex;

/// Every module specifier this source statically references: ES `import`
/// (default/named/namespace/side-effect), `export ... from`, CommonJS
/// `require(...)`, and dynamic `import(...)`.
pub fn extract_specifiers(source: &str) -> Vec<String> {
    let patterns = [
        r#"(?:import|export)\s+(?:[^'";]+\s+from\s+)?['"]([^'"]+)['"]"#,
        r#"require\(\s*['"]([^'"]+)['"]\s*\)"#,
        r#"import\(\s*['"]([^'"]+)['"]\s*\)"#,
    ];

    let mut found = Vec::new();
    for pattern in patterns {
        let re = Regex::new(pattern).expect("static regex");
        for cap in re.captures_iter(source) {
            if let Some(m) = cap.get(1) {
                found.push(m.as_str().to_string());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_named_and_default_imports() {
        let src = r#"
            import { a } from "./a";
            import b from './b';
            import * as c from "../c";
        "#;
        let specs = extract_specifiers(src);
        assert!(specs.contains(&"./a".to_string()));
        assert!(specs.contains(&"./b".to_string()));
        assert!(specs.contains(&"../c".to_string()));
    }

    #[test]
    fn extracts_require_and_dynamic_import() {
        let src = r#"
            const d = require('./d');
            async function f() { const e = await import('./e'); }
        "#;
        let specs = extract_specifiers(src);
        assert!(specs.contains(&"./d".to_string()));
        assert!(specs.contains(&"./e".to_string()));
    }

    #[test]
    fn extracts_export_from() {
        let specs = extract_specifiers(r#"export { x } from "./x";"#);
        assert!(specs.contains(&"./x".to_string()));
    }

    #[test]
    fn side_effect_import_has_no_specifier_bug() {
        let specs = extract_specifiers(r#"import "./polyfill";"#);
        assert!(specs.contains(&"./polyfill".to_string()));
    }
}
