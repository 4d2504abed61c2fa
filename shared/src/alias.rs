use std::collections::HashMap;

/// Boundary-dataset spelling → metrics-dataset spelling for districts whose
/// names differ between the two sources.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("Ananthapuramu", "Anantapur"),
    ("Sri Potti Sriramulu Nellore", "Nellore"),
    ("S.P.S. Nellore", "Nellore"),
    ("Y.S.R.", "Kadapa"),
    ("YSR Kadapa", "Kadapa"),
    ("Visakhapatanam", "Visakhapatnam"),
    ("Alluri Sitharama Raju", "Alluri Sitarama Raju"),
    ("Dr. B.R. Ambedkar Konaseema", "Konaseema"),
    ("N.T.R", "NTR"),
    ("Parvathipuram Manyam", "Parvathipuram"),
];

/// A pair rejected while building an [`AliasMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasConflict {
    pub boundary: String,
    pub canonical: String,
    pub reason: &'static str,
}

/// Exact-string alias table between the two datasets. Never fuzzy.
///
/// Canonical names are never themselves boundary keys, which keeps
/// canonicalisation idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    to_canonical: HashMap<String, String>,
    to_boundary: HashMap<String, Vec<String>>,
}

impl AliasMap {
    /// Build from `(boundary, canonical)` pairs. Identity pairs are ignored.
    /// Pairs that would remap a spelling or chain through another alias are
    /// rejected and returned alongside the map.
    pub fn from_pairs<I, A, B>(pairs: I) -> (Self, Vec<AliasConflict>)
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut map = Self::default();
        let mut conflicts = Vec::new();

        for (boundary, canonical) in pairs {
            let boundary = boundary.into();
            let canonical = canonical.into();
            if boundary == canonical {
                continue;
            }

            let reason = if let Some(existing) = map.to_canonical.get(&boundary) {
                if *existing == canonical {
                    continue;
                }
                Some("boundary name already mapped to a different canonical name")
            } else if map.to_boundary.contains_key(&boundary) {
                Some("boundary name is already a canonical name")
            } else if map.to_canonical.contains_key(&canonical) {
                Some("canonical name is already a boundary alias")
            } else {
                None
            };

            if let Some(reason) = reason {
                conflicts.push(AliasConflict {
                    boundary,
                    canonical,
                    reason,
                });
                continue;
            }

            map.to_boundary
                .entry(canonical.clone())
                .or_default()
                .push(boundary.clone());
            map.to_canonical.insert(boundary, canonical);
        }

        (map, conflicts)
    }

    pub fn builtin() -> Self {
        Self::from_pairs(DEFAULT_ALIASES.iter().copied()).0
    }

    pub fn len(&self) -> usize {
        self.to_canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_canonical.is_empty()
    }

    fn canonical_of(&self, boundary: &str) -> Option<&str> {
        self.to_canonical.get(boundary).map(String::as_str)
    }

    fn boundary_spellings(&self, canonical: &str) -> &[String] {
        self.to_boundary
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Bridges boundary-dataset and metrics-dataset vocabularies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameReconciler {
    aliases: AliasMap,
}

impl NameReconciler {
    pub fn new(aliases: AliasMap) -> Self {
        Self { aliases }
    }

    pub fn with_builtin_aliases() -> Self {
        Self::new(AliasMap::builtin())
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Metrics-dataset spelling for a boundary name, or the input unchanged.
    pub fn resolve_to_canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.canonical_of(name).unwrap_or(name)
    }

    /// Every spelling that should light up for `name`: the input itself, its
    /// canonical form, and all boundary aliases of that canonical form.
    pub fn resolve_to_boundary_names(&self, name: &str) -> Vec<String> {
        let canonical = self.resolve_to_canonical(name);
        let mut names = vec![name.to_owned()];
        if canonical != name {
            names.push(canonical.to_owned());
        }
        for spelling in self.aliases.boundary_spellings(canonical) {
            if !names.iter().any(|n| n == spelling) {
                names.push(spelling.clone());
            }
        }
        names
    }
}
