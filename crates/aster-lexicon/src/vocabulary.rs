//! Domain vocabularies: localized↔canonical identifier maps.

use std::collections::HashMap;

/// The four kinds an identifier mapping can be declared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdentifierKind {
    Struct,
    Field,
    Function,
    EnumValue,
}

impl Default for IdentifierKind {
    /// Only used to satisfy `#[serde(skip)]` on [`IdentifierMapping::kind`];
    /// JSON import always overwrites it with the bucket the mapping was
    /// read from (see `json::import_vocabulary`).
    fn default() -> Self {
        IdentifierKind::Struct
    }
}

/// One localized↔canonical identifier mapping.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IdentifierMapping {
    pub canonical: String,
    pub localized: String,
    #[serde(skip)]
    pub kind: IdentifierKind,
    /// Required when `kind == Field`: the canonical name of the owning struct.
    pub parent: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A domain-specific identifier map: localized terms ↔ ASCII canonical
/// identifiers, attached to the canonicalizer so pass 9 (identifier
/// translation) can rewrite domain terms before the lexer runs.
#[derive(Debug, Clone)]
pub struct DomainVocabulary {
    pub id: String,
    pub name: String,
    pub locale: String,
    pub version: String,
    pub structs: Vec<IdentifierMapping>,
    pub fields: Vec<IdentifierMapping>,
    pub functions: Vec<IdentifierMapping>,
    pub enum_values: Vec<IdentifierMapping>,
    pub metadata: Option<VocabularyMetadata>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VocabularyMetadata {
    pub author: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    pub description: Option<String>,
}

impl DomainVocabulary {
    /// All identifier mappings across the four kind-buckets, in (structs,
    /// fields, functions, enumValues) order.
    pub fn all_mappings(&self) -> impl Iterator<Item = &IdentifierMapping> {
        self.structs
            .iter()
            .chain(self.fields.iter())
            .chain(self.functions.iter())
            .chain(self.enum_values.iter())
    }

    /// Checks the §3 invariant: each struct's canonical name is unique
    /// within the vocabulary (case-insensitive), and every field names a
    /// parent that actually exists among the struct mappings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let mut seen: HashMap<String, usize> = HashMap::new();
        for m in &self.structs {
            let key = m.canonical.to_lowercase();
            *seen.entry(key).or_insert(0) += 1;
        }
        for (name, count) in &seen {
            if *count > 1 {
                errors.push(format!("struct canonical name '{name}' is declared {count} times"));
            }
        }

        let struct_names: std::collections::HashSet<String> =
            self.structs.iter().map(|s| s.canonical.to_lowercase()).collect();
        for f in &self.fields {
            match &f.parent {
                Some(parent) if struct_names.contains(&parent.to_lowercase()) => {}
                Some(parent) => errors.push(format!(
                    "field '{}' declares parent '{parent}' which is not a known struct",
                    f.canonical
                )),
                None => errors.push(format!("field '{}' is missing a required parent struct", f.canonical)),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the query-optimized [`IdentifierIndex`] projection of this
    /// vocabulary.
    pub fn index(&self) -> IdentifierIndex {
        IdentifierIndex::build(self)
    }

    /// Synthesizes a vocabulary from several, concatenating each kind's
    /// mapping lists in `vocabularies` order (stable). Duplicate canonical
    /// names across inputs are *not* deduplicated — callers curate the
    /// input list.
    pub fn merge(vocabularies: &[&DomainVocabulary], locale: impl Into<String>) -> DomainVocabulary {
        let id = vocabularies
            .iter()
            .map(|v| v.id.as_str())
            .collect::<Vec<_>>()
            .join("+");
        let mut structs = Vec::new();
        let mut fields = Vec::new();
        let mut functions = Vec::new();
        let mut enum_values = Vec::new();
        for v in vocabularies {
            structs.extend(v.structs.iter().cloned());
            fields.extend(v.fields.iter().cloned());
            functions.extend(v.functions.iter().cloned());
            enum_values.extend(v.enum_values.iter().cloned());
        }
        DomainVocabulary {
            id: id.clone(),
            name: id,
            locale: locale.into(),
            version: "1.0.0".to_string(),
            structs,
            fields,
            functions,
            enum_values,
            metadata: None,
        }
    }
}

/// The query-optimized projection of a [`DomainVocabulary`]: localized→canonical
/// (primary names plus aliases), canonical→localized (case-insensitive),
/// per-kind and per-parent bucketing.
#[derive(Debug, Clone, Default)]
pub struct IdentifierIndex {
    localized_to_canonical: HashMap<String, String>,
    canonical_to_localized: HashMap<String, String>,
    by_kind: HashMap<IdentifierKind, Vec<String>>,
    by_parent: HashMap<String, Vec<String>>,
}

impl IdentifierIndex {
    fn build(vocab: &DomainVocabulary) -> Self {
        let mut index = IdentifierIndex::default();
        let buckets: [(IdentifierKind, &[IdentifierMapping]); 4] = [
            (IdentifierKind::Struct, &vocab.structs),
            (IdentifierKind::Field, &vocab.fields),
            (IdentifierKind::Function, &vocab.functions),
            (IdentifierKind::EnumValue, &vocab.enum_values),
        ];
        for (kind, mappings) in buckets {
            for m in mappings {
                index
                    .localized_to_canonical
                    .insert(m.localized.clone(), m.canonical.clone());
                for alias in &m.aliases {
                    index.localized_to_canonical.insert(alias.clone(), m.canonical.clone());
                }
                index
                    .canonical_to_localized
                    .insert(m.canonical.to_lowercase(), m.localized.clone());
                index.by_kind.entry(kind).or_default().push(m.canonical.clone());
                if let Some(parent) = &m.parent {
                    index.by_parent.entry(parent.clone()).or_default().push(m.canonical.clone());
                }
            }
        }
        index
    }

    pub fn canonical_for(&self, localized: &str) -> Option<&str> {
        self.localized_to_canonical.get(localized).map(String::as_str)
    }

    pub fn localized_for(&self, canonical: &str) -> Option<&str> {
        self.canonical_to_localized.get(&canonical.to_lowercase()).map(String::as_str)
    }

    pub fn names_of_kind(&self, kind: IdentifierKind) -> &[String] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields_of(&self, parent: &str) -> &[String] {
        self.by_parent.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DomainVocabulary {
        DomainVocabulary {
            id: "insurance.auto".into(),
            name: "Auto Insurance".into(),
            locale: "zh-cn".into(),
            version: "1.0.0".into(),
            structs: vec![IdentifierMapping {
                canonical: "Driver".into(),
                localized: "驾驶员".into(),
                kind: IdentifierKind::Struct,
                parent: None,
                description: None,
                aliases: vec![],
            }],
            fields: vec![IdentifierMapping {
                canonical: "age".into(),
                localized: "年龄".into(),
                kind: IdentifierKind::Field,
                parent: Some("Driver".into()),
                description: None,
                aliases: vec!["岁数".into()],
            }],
            functions: vec![],
            enum_values: vec![],
            metadata: None,
        }
    }

    #[test]
    fn validate_passes_with_known_parent() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_rejects_orphan_field() {
        let mut vocab = sample();
        vocab.fields[0].parent = Some("Passenger".into());
        assert!(vocab.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_struct_case_insensitive() {
        let mut vocab = sample();
        vocab.structs.push(IdentifierMapping {
            canonical: "driver".into(),
            localized: "司机".into(),
            kind: IdentifierKind::Struct,
            parent: None,
            description: None,
            aliases: vec![],
        });
        assert!(vocab.validate().is_err());
    }

    #[test]
    fn index_resolves_localized_and_alias_to_canonical() {
        let index = sample().index();
        assert_eq!(index.canonical_for("驾驶员"), Some("Driver"));
        assert_eq!(index.canonical_for("年龄"), Some("age"));
        assert_eq!(index.canonical_for("岁数"), Some("age"));
        assert_eq!(index.canonical_for("nonexistent"), None);
    }

    #[test]
    fn index_resolves_canonical_to_localized_case_insensitively() {
        let index = sample().index();
        assert_eq!(index.localized_for("DRIVER"), Some("驾驶员"));
    }

    #[test]
    fn index_buckets_fields_by_parent() {
        let index = sample().index();
        assert_eq!(index.fields_of("Driver"), &["age".to_string()]);
    }

    #[test]
    fn merge_concatenates_in_order_without_deduplication() {
        let a = sample();
        let mut b = sample();
        b.id = "insurance.home".into();
        let merged = DomainVocabulary::merge(&[&a, &b], "zh-cn");
        assert_eq!(merged.id, "insurance.auto+insurance.home");
        assert_eq!(merged.structs.len(), 2);
        assert_eq!(merged.version, "1.0.0");
    }
}
