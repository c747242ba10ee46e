//! Name-to-constructor table of the built-in adapters.

use super::{Acgrip, Adapter, AdapterSettings, Comicat, Dmhy, Miobt, Nyaa, Tokyotosho};
use crate::error::{AppError, Result};

/// Builds an adapter from its settings.
pub type AdapterConstructor = fn(AdapterSettings) -> Box<dyn Adapter>;

fn dmhy(settings: AdapterSettings) -> Box<dyn Adapter> {
    Box::new(Dmhy::new(settings))
}

fn acgrip(settings: AdapterSettings) -> Box<dyn Adapter> {
    Box::new(Acgrip::new(settings))
}

fn nyaa(settings: AdapterSettings) -> Box<dyn Adapter> {
    Box::new(Nyaa::new(settings))
}

fn tokyotosho(settings: AdapterSettings) -> Box<dyn Adapter> {
    Box::new(Tokyotosho::new(settings))
}

fn miobt(settings: AdapterSettings) -> Box<dyn Adapter> {
    Box::new(Miobt::new(settings))
}

fn comicat(settings: AdapterSettings) -> Box<dyn Adapter> {
    Box::new(Comicat::new(settings))
}

static ADAPTERS: &[(&str, AdapterConstructor)] = &[
    ("Dmhy", dmhy),
    ("Acgrip", acgrip),
    ("Nyaa", nyaa),
    ("Tokyotosho", tokyotosho),
    ("Miobt", miobt),
    ("Comicat", comicat),
];

/// Registered adapter names, in registration order.
pub fn names() -> impl Iterator<Item = &'static str> {
    ADAPTERS.iter().map(|(name, _)| *name)
}

/// Look up an adapter constructor.
///
/// The name is title-cased first, so `dmhy`, `DMHY` and `Dmhy` all resolve.
pub fn resolve(name: &str) -> Result<AdapterConstructor> {
    let wanted = title_case(name.trim());
    ADAPTERS
        .iter()
        .find(|(registered, _)| *registered == wanted)
        .map(|(_, constructor)| *constructor)
        .ok_or_else(|| AppError::PluginNotFound(name.to_string()))
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_insensitive() {
        for name in ["dmhy", "DMHY", "Dmhy", " nyaa "] {
            assert!(resolve(name).is_ok(), "{name} should resolve");
        }
        let adapter = resolve("tokyoTOSHO").unwrap()(AdapterSettings::default());
        assert_eq!(adapter.name(), "Tokyotosho");
    }

    #[test]
    fn test_resolve_unknown() {
        let err = resolve("piratebay").err().unwrap();
        assert!(matches!(err, AppError::PluginNotFound(name) if name == "piratebay"));
        assert!(resolve("").is_err());
    }

    #[test]
    fn test_every_name_builds_its_adapter() {
        let names: Vec<_> = names().collect();
        assert_eq!(names.len(), 6);
        for name in names {
            let adapter = resolve(name).unwrap()(AdapterSettings::default());
            assert_eq!(adapter.name(), name);
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("aCGRIP"), "Acgrip");
        assert_eq!(title_case(""), "");
    }
}
