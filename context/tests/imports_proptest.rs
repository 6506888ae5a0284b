use context::extract_imports;
use proptest::prelude::*;
use std::collections::HashSet;

fn first_seen(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|name| seen.insert((*name).clone()))
        .cloned()
        .collect()
}

proptest! {
    #[test]
    fn c_includes_are_first_seen_ordered(
        headers in prop::collection::vec(("[a-z][a-z0-9_]{0,8}", any::<bool>()), 0..24)
    ) {
        let source: String = headers
            .iter()
            .map(|(name, system)| {
                if *system {
                    format!("#include <{name}.h>\n")
                } else {
                    format!("#include \"{name}.h\"\n")
                }
            })
            .collect();
        let names: Vec<String> = headers.iter().map(|(name, _)| format!("{name}.h")).collect();

        prop_assert_eq!(extract_imports(&source, "c"), first_seen(&names));
    }

    #[test]
    fn javascript_static_and_require_interleave_in_source_order(
        modules in prop::collection::vec(("[a-z][a-z0-9-]{0,10}", any::<bool>()), 0..24)
    ) {
        let source: String = modules
            .iter()
            .enumerate()
            .map(|(n, (name, static_import))| {
                if *static_import {
                    format!("import '{name}';\n")
                } else {
                    format!("const m{n} = require('{name}');\n")
                }
            })
            .collect();
        let names: Vec<String> = modules.iter().map(|(name, _)| name.clone()).collect();

        prop_assert_eq!(extract_imports(&source, "javascript"), first_seen(&names));
    }

    #[test]
    fn any_source_yields_unique_non_empty_targets(
        source in "\\PC{0,400}",
        language in prop::sample::select(vec![
            "rust", "python", "javascript", "go", "java", "cpp", "csharp", "ruby", "php"
        ])
    ) {
        let imports = extract_imports(&source, language);
        let unique: HashSet<&String> = imports.iter().collect();

        prop_assert_eq!(unique.len(), imports.len());
        prop_assert!(imports.iter().all(|target| !target.is_empty()));
    }
}
