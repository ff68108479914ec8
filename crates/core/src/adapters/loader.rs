// ABOUTME: Loader for site adapter registries from embedded JSON data or a user file.
// ABOUTME: Provides load_builtin_registry() and load_registry_file().

use std::fs;
use std::path::Path;

use crate::adapters::registry::AdapterRegistry;
use crate::error::WatchError;

/// Embedded JSON containing the builtin retailer adapters.
const BUILTIN_ADAPTERS_JSON: &str = include_str!("../../data/adapters.json");

/// Loads the builtin adapter registry from embedded JSON.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed.
pub fn load_builtin_registry() -> AdapterRegistry {
    AdapterRegistry::from_json(BUILTIN_ADAPTERS_JSON).expect("failed to parse builtin adapters")
}

/// Loads adapters from a JSON file on top of the builtin set.
///
/// File adapters replace builtin adapters with the same id; new ids are
/// checked after the builtin ones.
pub fn load_registry_file(path: &Path) -> Result<AdapterRegistry, WatchError> {
    let shown = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|e| {
        WatchError::source_list(&shown, "LoadAdapters", Some(anyhow::anyhow!(e)))
    })?;
    let custom = AdapterRegistry::from_json(&text).map_err(|mut e| {
        e.url = shown.clone();
        e
    })?;

    let mut registry = load_builtin_registry();
    registry.extend(custom.iter().cloned());
    tracing::debug!(path = %shown, adapters = registry.len(), "loaded adapter file");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_covers_known_sites() {
        let registry = load_builtin_registry();
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["amazon", "flipkart", "agarolifestyle", "lifelongindiaonline"]
        );
    }

    #[test]
    fn builtin_amazon_has_fraction_selector() {
        let registry = load_builtin_registry();
        let amazon = registry.get("amazon").unwrap();
        assert_eq!(amazon.fraction.as_deref(), Some("span.a-price-fraction"));
    }

    #[test]
    fn builtin_flipkart_has_fallback() {
        let registry = load_builtin_registry();
        let flipkart = registry.get("flipkart").unwrap();
        assert!(flipkart.selectors.len() >= 2);
    }

    #[test]
    fn file_adapters_extend_and_override_builtin() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("adapters.json");
        fs::write(
            &path,
            r#"[
                {"id": "flipkart", "selectors": ["span.fk-price"]},
                {"id": "croma", "selectors": ["span.amount"], "strip": ["₹", ","]}
            ]"#,
        )
        .unwrap();

        let registry = load_registry_file(&path).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get("flipkart").unwrap().selectors, vec!["span.fk-price"]);
        assert_eq!(
            registry.resolve("https://www.croma.com/p/1").unwrap().id,
            "croma"
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_registry_file(Path::new("/nonexistent/adapters.json")).unwrap_err();
        assert_eq!(err.op, "LoadAdapters");
    }
}
