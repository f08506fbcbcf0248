use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid email pattern"));

/// Maps raw author identities (`Name <email>`, logins, mixed case) onto one
/// canonical, lower-cased user key.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    lookup: HashMap<String, String>,
}

impl AliasResolver {
    pub fn new(aliases: &IndexMap<String, Vec<String>>) -> Self {
        let lookup = aliases
            .iter()
            .flat_map(|(canonical, identities)| {
                let canonical = normalize(canonical);
                identities
                    .iter()
                    .map(move |identity| (normalize(identity), canonical.clone()))
            })
            .collect();
        Self { lookup }
    }

    pub fn resolve(&self, raw: &str) -> String {
        let identity = normalize(raw);
        match self.lookup.get(&identity) {
            Some(canonical) if !canonical.is_empty() => canonical.clone(),
            _ => identity,
        }
    }
}

fn normalize(identity: &str) -> String {
    let lower = identity.to_lowercase();
    EMAIL.replace(&lower, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AliasResolver {
        let mut aliases = IndexMap::new();
        aliases.insert(
            "Alice".to_string(),
            vec![
                "alice-gh".to_string(),
                "Alice Smith <alice@corp.example>".to_string(),
            ],
        );
        aliases.insert("bob".to_string(), vec!["Robert".to_string()]);
        AliasResolver::new(&aliases)
    }

    #[test]
    fn maps_configured_identities_to_canonical_key() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("ALICE-GH"), "alice");
        assert_eq!(resolver.resolve("Alice Smith <other@mail.example>"), "alice");
        assert_eq!(resolver.resolve("  robert "), "bob");
    }

    #[test]
    fn unknown_identities_are_their_own_key() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("Carol <carol@x.example>"), "carol");
        assert_eq!(resolver.resolve("Dave"), "dave");
    }

    #[test]
    fn canonical_keys_are_a_fixed_point() {
        let resolver = resolver();
        for raw in ["alice-gh", "Robert", "Carol <c@x>", ""] {
            let canonical = resolver.resolve(raw);
            assert_eq!(resolver.resolve(&canonical), canonical);
        }
    }

    #[test]
    fn empty_input_resolves_to_empty_key() {
        assert_eq!(resolver().resolve(""), "");
        assert_eq!(AliasResolver::default().resolve("   "), "");
    }
}
