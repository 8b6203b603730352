//! Deterministic JSON import/export for lexicons and vocabularies.
//!
//! Export is deterministic: map keys are sorted before serialization and a
//! SHA-256 checksum is computed over the canonicalized payload bytes
//! (`SPEC_FULL.md` §6). `import(export(x)) == x` up to map iteration order
//! is a tested invariant (`SPEC_FULL.md` §8, invariant 7).

use crate::canon_config::{CanonConfig, CompoundPattern, RegexRule, TransformerRef, WhitespaceMode};
use crate::kind::SemanticKind;
use crate::lexicon::{Lexicon, MessageTemplates};
use crate::punctuation::{Direction, Punctuation};
use crate::vocabulary::{DomainVocabulary, IdentifierKind, IdentifierMapping, VocabularyMetadata};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct LexiconRow {
    id: String,
    name: String,
    direction: Direction,
    keywords: BTreeMap<String, String>,
    punctuation: PunctuationRow,
    canonicalization: CanonConfigRow,
    messages: MessageTemplates,
    #[serde(default)]
    overlays: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct PunctuationRow {
    #[serde(rename = "statementEnd")]
    statement_end: String,
    #[serde(rename = "listSeparator")]
    list_separator: String,
    #[serde(rename = "enumSeparator")]
    enum_separator: String,
    #[serde(rename = "blockStart")]
    block_start: String,
    #[serde(rename = "stringQuoteOpen")]
    string_quote_open: String,
    #[serde(rename = "stringQuoteClose")]
    string_quote_close: String,
    #[serde(rename = "markerOpen", skip_serializing_if = "Option::is_none")]
    marker_open: Option<String>,
    #[serde(rename = "markerClose", skip_serializing_if = "Option::is_none")]
    marker_close: Option<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct CanonConfigRow {
    #[serde(rename = "fullWidthToHalf")]
    full_width_to_half: bool,
    #[serde(rename = "whitespaceMode")]
    whitespace_mode: WhitespaceMode,
    #[serde(rename = "removeArticles")]
    remove_articles: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    articles: Vec<String>,
    #[serde(rename = "customRules", default, skip_serializing_if = "Vec::is_empty")]
    custom_rules: Vec<RegexRule>,
    #[serde(rename = "allowedDuplicates", default, skip_serializing_if = "Vec::is_empty")]
    allowed_duplicates: Vec<Vec<SemanticKind>>,
    #[serde(rename = "compoundPatterns", default, skip_serializing_if = "Vec::is_empty")]
    compound_patterns: Vec<CompoundPattern>,
    #[serde(rename = "preTranslationTransformers", default, skip_serializing_if = "Vec::is_empty")]
    pre_translation_transformers: Vec<TransformerRef>,
    #[serde(rename = "postTranslationTransformers", default, skip_serializing_if = "Vec::is_empty")]
    post_translation_transformers: Vec<TransformerRef>,
}

fn punctuation_to_row(p: &Punctuation) -> PunctuationRow {
    PunctuationRow {
        statement_end: p.statement_end.clone(),
        list_separator: p.list_separator.clone(),
        enum_separator: p.enum_separator.clone(),
        block_start: p.block_start.clone(),
        string_quote_open: p.string_quote_open.clone(),
        string_quote_close: p.string_quote_close.clone(),
        marker_open: p.marker_open.clone(),
        marker_close: p.marker_close.clone(),
    }
}

fn row_to_punctuation(r: PunctuationRow) -> Punctuation {
    Punctuation {
        statement_end: r.statement_end,
        list_separator: r.list_separator,
        enum_separator: r.enum_separator,
        block_start: r.block_start,
        string_quote_open: r.string_quote_open,
        string_quote_close: r.string_quote_close,
        marker_open: r.marker_open,
        marker_close: r.marker_close,
    }
}

fn canon_config_to_row(c: &CanonConfig) -> CanonConfigRow {
    CanonConfigRow {
        full_width_to_half: c.full_width_to_half,
        whitespace_mode: c.whitespace_mode,
        remove_articles: c.remove_articles,
        articles: c.articles.clone(),
        custom_rules: c.custom_rules.clone(),
        allowed_duplicates: c.allowed_duplicates.clone(),
        compound_patterns: c.compound_patterns.clone(),
        pre_translation_transformers: c.pre_translation_transformers.clone(),
        post_translation_transformers: c.post_translation_transformers.clone(),
    }
}

fn row_to_canon_config(r: CanonConfigRow) -> CanonConfig {
    CanonConfig {
        full_width_to_half: r.full_width_to_half,
        whitespace_mode: r.whitespace_mode,
        remove_articles: r.remove_articles,
        articles: r.articles,
        custom_rules: r.custom_rules,
        allowed_duplicates: r.allowed_duplicates,
        compound_patterns: r.compound_patterns,
        pre_translation_transformers: r.pre_translation_transformers,
        post_translation_transformers: r.post_translation_transformers,
        compiled: std::sync::OnceLock::new(),
    }
}

fn lexicon_to_row(l: &Lexicon) -> LexiconRow {
    LexiconRow {
        id: l.id().to_string(),
        name: l.name().to_string(),
        direction: l.direction(),
        keywords: l.keywords().iter().map(|(k, v)| (k.name().to_string(), v.clone())).collect(),
        punctuation: punctuation_to_row(l.punctuation()),
        canonicalization: canon_config_to_row(l.canonicalization()),
        messages: l.messages().clone(),
        overlays: l.overlays().iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    }
}

fn row_to_lexicon(row: LexiconRow) -> Result<Lexicon, String> {
    let mut keywords = std::collections::HashMap::new();
    for (name, surface) in row.keywords {
        let kind = SemanticKind::from_name(&name).ok_or_else(|| format!("unknown semantic kind '{name}'"))?;
        keywords.insert(kind, surface);
    }
    Ok(Lexicon::new(
        row.id,
        row.name,
        row.direction,
        keywords,
        row_to_punctuation(row.punctuation),
        row_to_canon_config(row.canonicalization),
        row.messages,
        row.overlays.into_iter().collect(),
    ))
}

/// Canonical JSON bytes: keys sorted (via `BTreeMap`/`serde_json`'s
/// `preserve_order` being disabled) and no extraneous whitespace. Used both
/// to produce the exported document and to compute its checksum.
fn canonical_bytes<T: serde::Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("exported lexicon/vocabulary data must serialize")
}

fn checksum_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Exports the full set of lexicons as the top-level document described in
/// `SPEC_FULL.md` §6.
pub fn export_lexicons(lexicons: &[Lexicon]) -> serde_json::Value {
    let mut sorted: Vec<&Lexicon> = lexicons.iter().collect();
    sorted.sort_by(|a, b| a.id().cmp(b.id()));

    let rows: BTreeMap<String, LexiconRow> =
        sorted.iter().map(|l| (l.id().to_string(), lexicon_to_row(l))).collect();
    let lexicons_bytes = canonical_bytes(&rows);
    let checksum = checksum_hex(&lexicons_bytes);

    let categories: BTreeMap<String, Vec<&'static str>> = {
        let mut map: BTreeMap<String, Vec<&'static str>> = BTreeMap::new();
        for kind in SemanticKind::ALL {
            map.entry(format!("{:?}", kind.category())).or_default().push(kind.name());
        }
        map
    };

    serde_json::json!({
        "version": "1.0.0",
        "tokenKinds": SemanticKind::ALL.iter().map(|k| k.name()).collect::<Vec<_>>(),
        "categories": categories,
        "lexicons": rows,
        "checksum": checksum,
    })
}

/// Imports a lexicon document produced by [`export_lexicons`] (or an
/// equivalent hand-authored one), returning the decoded lexicons sorted by
/// id. Verifies the embedded checksum matches the `lexicons` payload.
pub fn import_lexicons(doc: &serde_json::Value) -> Result<Vec<Lexicon>, String> {
    let rows: BTreeMap<String, LexiconRow> = serde_json::from_value(
        doc.get("lexicons").cloned().ok_or("missing 'lexicons' key")?,
    )
    .map_err(|e| format!("malformed 'lexicons': {e}"))?;

    let recomputed = checksum_hex(&canonical_bytes(&rows));
    let stored = doc.get("checksum").and_then(|v| v.as_str()).ok_or("missing 'checksum'")?;
    if recomputed != stored {
        return Err(format!("checksum mismatch: stored {stored}, recomputed {recomputed}"));
    }

    rows.into_values().map(row_to_lexicon).collect()
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct MappingRow {
    canonical: String,
    localized: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<String>,
}

fn mapping_to_row(m: &IdentifierMapping) -> MappingRow {
    MappingRow {
        canonical: m.canonical.clone(),
        localized: m.localized.clone(),
        parent: m.parent.clone(),
        description: m.description.clone(),
        aliases: m.aliases.clone(),
    }
}

fn row_to_mapping(row: MappingRow, kind: IdentifierKind) -> IdentifierMapping {
    IdentifierMapping {
        canonical: row.canonical,
        localized: row.localized,
        kind,
        parent: row.parent,
        description: row.description,
        aliases: row.aliases,
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct VocabularyRow {
    id: String,
    name: String,
    locale: String,
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<VocabularyMetadata>,
    structs: Vec<MappingRow>,
    fields: Vec<MappingRow>,
    functions: Vec<MappingRow>,
    #[serde(rename = "enumValues")]
    enum_values: Vec<MappingRow>,
}

fn vocabulary_to_row(v: &DomainVocabulary) -> VocabularyRow {
    VocabularyRow {
        id: v.id.clone(),
        name: v.name.clone(),
        locale: v.locale.clone(),
        version: v.version.clone(),
        metadata: v.metadata.clone(),
        structs: v.structs.iter().map(mapping_to_row).collect(),
        fields: v.fields.iter().map(mapping_to_row).collect(),
        functions: v.functions.iter().map(mapping_to_row).collect(),
        enum_values: v.enum_values.iter().map(mapping_to_row).collect(),
    }
}

fn row_to_vocabulary(row: VocabularyRow) -> DomainVocabulary {
    DomainVocabulary {
        id: row.id,
        name: row.name,
        locale: row.locale,
        version: row.version,
        metadata: row.metadata,
        structs: row.structs.into_iter().map(|r| row_to_mapping(r, IdentifierKind::Struct)).collect(),
        fields: row.fields.into_iter().map(|r| row_to_mapping(r, IdentifierKind::Field)).collect(),
        functions: row.functions.into_iter().map(|r| row_to_mapping(r, IdentifierKind::Function)).collect(),
        enum_values: row
            .enum_values
            .into_iter()
            .map(|r| row_to_mapping(r, IdentifierKind::EnumValue))
            .collect(),
    }
}

/// Exports a set of vocabularies as `{version, generatedAt, vocabularies, checksum}`,
/// keyed `"<id>:<locale>"` (`SPEC_FULL.md` §6).
pub fn export_vocabularies(vocabularies: &[DomainVocabulary], generated_at: &str) -> serde_json::Value {
    let rows: BTreeMap<String, VocabularyRow> = vocabularies
        .iter()
        .map(|v| (format!("{}:{}", v.id, v.locale), vocabulary_to_row(v)))
        .collect();
    let bytes = canonical_bytes(&rows);
    let checksum = checksum_hex(&bytes);
    serde_json::json!({
        "version": "1.0.0",
        "generatedAt": generated_at,
        "vocabularies": rows,
        "checksum": checksum,
    })
}

pub fn import_vocabularies(doc: &serde_json::Value) -> Result<Vec<DomainVocabulary>, String> {
    let rows: BTreeMap<String, VocabularyRow> = serde_json::from_value(
        doc.get("vocabularies").cloned().ok_or("missing 'vocabularies' key")?,
    )
    .map_err(|e| format!("malformed 'vocabularies': {e}"))?;

    let recomputed = checksum_hex(&canonical_bytes(&rows));
    let stored = doc.get("checksum").and_then(|v| v.as_str()).ok_or("missing 'checksum'")?;
    if recomputed != stored {
        return Err(format!("checksum mismatch: stored {stored}, recomputed {recomputed}"));
    }

    Ok(rows.into_values().map(row_to_vocabulary).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::IdentifierMapping;

    #[test]
    fn lexicon_export_import_round_trips() {
        let original = vec![Lexicon::english(), Lexicon::chinese()];
        let exported = export_lexicons(&original);
        let imported = import_lexicons(&exported).unwrap();
        assert_eq!(imported.len(), 2);
        let en = imported.iter().find(|l| l.id() == "en").unwrap();
        assert_eq!(en.surface(SemanticKind::If), Some("If"));
        assert_eq!(en.keywords().len(), original[0].keywords().len());
    }

    #[test]
    fn lexicon_import_rejects_tampered_checksum() {
        let mut exported = export_lexicons(&[Lexicon::english()]);
        exported["checksum"] = serde_json::Value::String("0".repeat(64));
        assert!(import_lexicons(&exported).is_err());
    }

    #[test]
    fn vocabulary_export_import_round_trips() {
        let vocab = DomainVocabulary {
            id: "insurance.auto".into(),
            name: "Auto".into(),
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
            fields: vec![],
            functions: vec![],
            enum_values: vec![],
            metadata: None,
        };
        let exported = export_vocabularies(&[vocab], "2026-01-01T00:00:00Z");
        let imported = import_vocabularies(&exported).unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].structs[0].localized, "驾驶员");
    }

    #[test]
    fn checksum_is_over_canonical_bytes_not_pretty_printed() {
        let exported = export_lexicons(&[Lexicon::english()]);
        let lexicons_value = exported.get("lexicons").unwrap();
        let recomputed = checksum_hex(&serde_json::to_vec(lexicons_value).unwrap());
        assert_eq!(exported["checksum"].as_str().unwrap(), recomputed);
    }
}
