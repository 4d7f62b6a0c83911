use std::{collections::BTreeMap, sync::Arc};

use crate::error::{Error, Result};

/// Static short name → backend model identifier table.
///
/// Immutable once built; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct ModelAliases {
    inner: Arc<BTreeMap<String, String>>,
}

impl ModelAliases {
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Self {
            inner: Arc::new(map),
        }
    }

    pub fn resolve(&self, alias: &str) -> Result<&str> {
        self.inner
            .get(alias)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownModel {
                alias: alias.to_string(),
            })
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ModelAliases {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_aliases() {
        let aliases = ModelAliases::from_iter([
            ("ds", "deepseek/deepseek-chat:free"),
            ("gpt4", "openai/gpt-4o-2024-11-20"),
        ]);
        assert_eq!(aliases.resolve("ds").unwrap(), "deepseek/deepseek-chat:free");
        assert_eq!(aliases.resolve("gpt4").unwrap(), "openai/gpt-4o-2024-11-20");
        assert_eq!(aliases.aliases().collect::<Vec<_>>(), vec!["ds", "gpt4"]);
    }

    #[test]
    fn unknown_alias_is_error() {
        let aliases = ModelAliases::default();
        assert!(matches!(
            aliases.resolve("gpt5"),
            Err(Error::UnknownModel { alias }) if alias == "gpt5"
        ));
    }
}
