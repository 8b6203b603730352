//! A [`Lexicon`]: the complete language-skin data for one locale.

use crate::canon_config::{CanonConfig, CompoundPattern, RegexRule, TransformerRef, WhitespaceMode};
use crate::kind::SemanticKind;
use crate::punctuation::{Direction, Punctuation};
use std::collections::HashMap;

/// Error-message templates for one locale. These are distinct from (and
/// normally mirror, in that locale's words) the English-only templates in
/// the shared `shared/error_codes.json` table consumed by `aster-diagnostics`
/// — a locale's `messages` let a driver render a user-facing message in the
/// source language, while the error-code table stays the single source of
/// truth for category/severity/parity across implementations.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MessageTemplates {
    pub unexpected_token: String,
    pub expected_keyword: String,
    pub undefined_variable: String,
    pub type_mismatch: String,
    pub unterminated_string: String,
    pub invalid_indentation: String,
}

/// The complete language-skin data for one BCP-47 locale.
///
/// Built once via a locale constructor ([`Lexicon::english`], [`Lexicon::chinese`],
/// [`Lexicon::german`]) or deserialized from JSON, then registered with the
/// [`crate::LexiconRegistry`]. Immutable after registration.
#[derive(Debug, Clone)]
pub struct Lexicon {
    id: String,
    name: String,
    direction: Direction,
    keywords: HashMap<SemanticKind, String>,
    punctuation: Punctuation,
    canonicalization: CanonConfig,
    messages: MessageTemplates,
    overlays: HashMap<String, serde_json::Value>,
}

/// Normalizes a lexicon id: lowercase, dashes in place of underscores/spaces.
pub fn normalize_id(id: &str) -> String {
    id.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
        .collect()
}

impl Lexicon {
    /// Builds a lexicon from parts, normalizing the id. Does not validate —
    /// call [`Self::validate`] (or go through [`crate::LexiconRegistry::register`],
    /// which validates automatically) before relying on completeness/uniqueness.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        direction: Direction,
        keywords: HashMap<SemanticKind, String>,
        punctuation: Punctuation,
        canonicalization: CanonConfig,
        messages: MessageTemplates,
        overlays: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: normalize_id(&id.into()),
            name: name.into(),
            direction,
            keywords,
            punctuation,
            canonicalization,
            messages,
            overlays,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn keywords(&self) -> &HashMap<SemanticKind, String> {
        &self.keywords
    }

    pub fn surface(&self, kind: SemanticKind) -> Option<&str> {
        self.keywords.get(&kind).map(String::as_str)
    }

    pub fn punctuation(&self) -> &Punctuation {
        &self.punctuation
    }

    pub fn canonicalization(&self) -> &CanonConfig {
        &self.canonicalization
    }

    pub fn messages(&self) -> &MessageTemplates {
        &self.messages
    }

    pub fn overlays(&self) -> &HashMap<String, serde_json::Value> {
        &self.overlays
    }

    /// Keywords with a surface form containing whitespace, sorted
    /// longest-first by surface length — the order pass 8 of the
    /// canonicalizer (multi-word keyword normalization) must apply them in.
    pub fn multi_word_keywords_longest_first(&self) -> Vec<(SemanticKind, &str)> {
        let mut entries: Vec<(SemanticKind, &str)> = self
            .keywords
            .iter()
            .filter(|(_, surface)| surface.contains(char::is_whitespace))
            .map(|(k, s)| (*k, s.as_str()))
            .collect();
        entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        entries
    }

    /// Checks the §3 lexicon invariants: BCP-47-ish id well-formedness (a
    /// non-empty normalized id), keyword completeness, uniqueness modulo
    /// `allowedDuplicates`, punctuation pairing, and custom-rule
    /// compilability. Returns all violations rather than stopping at the
    /// first, since registration reports `InvalidConfiguration(errors)` with
    /// the full list.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.is_empty() {
            errors.push("lexicon id must not be empty".to_string());
        }

        for kind in SemanticKind::ALL {
            match self.keywords.get(kind) {
                Some(surface) if !surface.is_empty() => {}
                Some(_) => errors.push(format!("keyword mapping for {} is empty", kind.name())),
                None => errors.push(format!("keyword mapping for {} is missing", kind.name())),
            }
        }

        let allowed_groups = &self.canonicalization.allowed_duplicates;
        let in_same_allowed_group = |a: SemanticKind, b: SemanticKind| {
            allowed_groups
                .iter()
                .any(|group| group.contains(&a) && group.contains(&b))
        };
        let mut by_surface: HashMap<&str, Vec<SemanticKind>> = HashMap::new();
        for (kind, surface) in &self.keywords {
            by_surface.entry(surface.as_str()).or_default().push(*kind);
        }
        for (surface, kinds) in &by_surface {
            if kinds.len() <= 1 {
                continue;
            }
            for i in 0..kinds.len() {
                for j in (i + 1)..kinds.len() {
                    if !in_same_allowed_group(kinds[i], kinds[j]) {
                        errors.push(format!(
                            "surface form '{surface}' is shared by {} and {} without an allowed-duplicate group",
                            kinds[i].name(),
                            kinds[j].name()
                        ));
                    }
                }
            }
        }

        if let Err(mut punct_errors) = self.punctuation.validate() {
            errors.append(&mut punct_errors);
        }

        if let Err(mut rule_errors) = self.canonicalization.validate_custom_rules() {
            errors.append(&mut rule_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Warnings (non-blocking): kinds this lexicon maps to an empty or
    /// missing surface form. `validate` already treats these as hard errors;
    /// this is exposed separately for callers (e.g. discovery) that want to
    /// report partial coverage before a lexicon is even a candidate for
    /// registration.
    pub fn missing_kinds(&self) -> Vec<SemanticKind> {
        SemanticKind::ALL
            .iter()
            .copied()
            .filter(|k| self.keywords.get(k).map(|s| s.is_empty()).unwrap_or(true))
            .collect()
    }

    /// The built-in English (`en`) lexicon: the canonical target form every
    /// other locale's source is rewritten into.
    pub fn english() -> Self {
        let keywords = english_keywords();
        Self::new(
            "en",
            "English",
            Direction::Ltr,
            keywords,
            ascii_punctuation(),
            CanonConfig {
                full_width_to_half: false,
                whitespace_mode: WhitespaceMode::English,
                remove_articles: true,
                articles: vec!["a".into(), "an".into(), "the".into()],
                custom_rules: vec![],
                allowed_duplicates: vec![vec![SemanticKind::LessThan, SemanticKind::Under]],
                compound_patterns: vec![CompoundPattern {
                    name: "as-one-of".into(),
                    opener: SemanticKind::As,
                    contextual_keywords: vec![SemanticKind::OptionCtor],
                    closer: crate::canon_config::CloserMode::Newline,
                }],
                pre_translation_transformers: vec![TransformerRef::Inline(RegexRule {
                    name: "possessive".into(),
                    pattern: r"(\w+)'s (\w+)".into(),
                    replacement: "$1.$2".into(),
                })],
                post_translation_transformers: vec![
                    TransformerRef::Inline(RegexRule {
                        name: "the-result-is".into(),
                        pattern: r"(?i)the result is (.+)".into(),
                        replacement: "Return $1".into(),
                    }),
                    TransformerRef::Inline(RegexRule {
                        name: "set-to-let-be".into(),
                        pattern: r"(?i)Set (\w+) to (.+)".into(),
                        replacement: "Let $1 be $2".into(),
                    }),
                ],
                compiled: std::sync::OnceLock::new(),
            },
            english_messages(),
            HashMap::new(),
        )
    }

    /// The built-in Simplified Chinese (`zh-cn`) lexicon.
    pub fn chinese() -> Self {
        Self::new(
            "zh-cn",
            "简体中文",
            Direction::Ltr,
            chinese_keywords(),
            Punctuation {
                statement_end: "。".into(),
                list_separator: "，".into(),
                enum_separator: "，".into(),
                block_start: "：".into(),
                string_quote_open: "「".into(),
                string_quote_close: "」".into(),
                marker_open: None,
                marker_close: None,
            },
            CanonConfig {
                full_width_to_half: true,
                whitespace_mode: WhitespaceMode::Chinese,
                remove_articles: false,
                articles: vec![],
                custom_rules: vec![],
                allowed_duplicates: vec![vec![SemanticKind::LessThan, SemanticKind::Under]],
                compound_patterns: vec![],
                pre_translation_transformers: vec![TransformerRef::Inline(RegexRule {
                    name: "possessive-zh".into(),
                    pattern: r"(\S+) 的 (\S+)".into(),
                    replacement: "$1.$2".into(),
                })],
                post_translation_transformers: vec![],
                compiled: std::sync::OnceLock::new(),
            },
            chinese_messages(),
            HashMap::new(),
        )
    }

    /// The built-in German (`de`) lexicon.
    pub fn german() -> Self {
        Self::new(
            "de",
            "Deutsch",
            Direction::Ltr,
            german_keywords(),
            ascii_punctuation(),
            CanonConfig {
                full_width_to_half: false,
                whitespace_mode: WhitespaceMode::English,
                remove_articles: true,
                articles: vec!["der".into(), "die".into(), "das".into(), "ein".into(), "eine".into()],
                custom_rules: vec![],
                allowed_duplicates: vec![vec![SemanticKind::LessThan, SemanticKind::Under]],
                compound_patterns: vec![],
                pre_translation_transformers: vec![],
                post_translation_transformers: vec![],
                compiled: std::sync::OnceLock::new(),
            },
            german_messages(),
            HashMap::new(),
        )
    }

    /// Alias for [`Self::english`]: the fallback lexicon used when no
    /// locale-specific configuration is supplied (`SPEC_FULL.md` §9
    /// "configuration objects with many optional fields" pattern).
    pub fn defaults() -> Self {
        Self::english()
    }
}

fn ascii_punctuation() -> Punctuation {
    Punctuation {
        statement_end: ".".into(),
        list_separator: ",".into(),
        enum_separator: ",".into(),
        block_start: ":".into(),
        string_quote_open: "\"".into(),
        string_quote_close: "\"".into(),
        marker_open: None,
        marker_close: None,
    }
}

macro_rules! keyword_map {
    ($($kind:expr => $surface:expr),+ $(,)?) => {{
        let mut map = HashMap::new();
        $(map.insert($kind, $surface.to_string());)+
        map
    }};
}

fn english_keywords() -> HashMap<SemanticKind, String> {
    use SemanticKind::*;
    keyword_map! {
        Module => "Module", Import => "Import", Use => "use", As => "as",
        Data => "Data", Enum => "Enum", TypeAlias => "Type", With => "with", Has => "has",
        Rule => "Rule", To => "To", Given => "given", Produce => "produce", Function => "function",
        If => "If", Otherwise => "Otherwise", Match => "Match", When => "When", Case => "Case",
        Return => "Return", Scope => "Scope",
        Let => "Let", Be => "be", Set => "Set", Mutable => "mutable", Var => "var",
        True => "true", False => "false", And => "and", Or => "or", Not => "not",
        Plus => "plus", Minus => "minus", Times => "times", DividedBy => "divided by",
        LessThan => "less than", Under => "under", GreaterThan => "greater than", Over => "over",
        EqualsTo => "equals to", LessEqual => "at most", GreaterEqual => "at least", NotEqual => "is not",
        Ok => "Ok", Err => "Err", Some => "Some", None => "None", Maybe => "Maybe",
        OptionCtor => "Option", ResultCtor => "Result", ListCtor => "List", MapCtor => "Map",
        Null => "null",
        TextType => "Text", IntType => "Int", LongType => "Long", FloatType => "Float",
        BoolType => "Bool", DateTimeType => "DateTime",
        Pure => "pure", Cpu => "cpu", Io => "io", AsyncEffect => "async", Performs => "performs",
        Workflow => "Workflow", Step => "Step", Compensate => "Compensate",
        Start => "Start", Wait => "Wait", For => "for", Await => "await",
        Must => "must", Should => "should", Requires => "requires", Ensures => "ensures",
        Allowed => "allowed", Forbidden => "forbidden",
    }
}

fn chinese_keywords() -> HashMap<SemanticKind, String> {
    use SemanticKind::*;
    keyword_map! {
        Module => "模块", Import => "导入", Use => "使用", As => "作为",
        Data => "数据", Enum => "枚举", TypeAlias => "类型", With => "带有", Has => "具有",
        Rule => "规则", To => "至", Given => "给定", Produce => "产出", Function => "函数",
        If => "如果", Otherwise => "否则", Match => "匹配", When => "当", Case => "情形",
        Return => "返回", Scope => "范围",
        Let => "设", Be => "为", Set => "设置", Mutable => "可变", Var => "变量",
        True => "真", False => "假", And => "且", Or => "或", Not => "非",
        Plus => "加", Minus => "减", Times => "乘以", DividedBy => "除以",
        LessThan => "小于", Under => "低于", GreaterThan => "大于", Over => "高于",
        EqualsTo => "等于", LessEqual => "不超过", GreaterEqual => "不低于", NotEqual => "不等于",
        Ok => "成功", Err => "错误", Some => "部分", None => "无", Maybe => "也许",
        OptionCtor => "选项", ResultCtor => "结果", ListCtor => "列表", MapCtor => "映射",
        Null => "空",
        TextType => "文本", IntType => "整数", LongType => "长整数", FloatType => "浮点数",
        BoolType => "布尔", DateTimeType => "日期时间",
        Pure => "纯", Cpu => "计算", Io => "输入输出", AsyncEffect => "异步", Performs => "执行",
        Workflow => "工作流", Step => "步骤", Compensate => "补偿",
        Start => "开始", Wait => "等待", For => "为了", Await => "等候",
        Must => "必须", Should => "应当", Requires => "需要", Ensures => "确保",
        Allowed => "允许", Forbidden => "禁止",
    }
}

fn german_keywords() -> HashMap<SemanticKind, String> {
    use SemanticKind::*;
    keyword_map! {
        Module => "Modul", Import => "Importiere", Use => "benutze", As => "als",
        Data => "Daten", Enum => "Aufzaehlung", TypeAlias => "Typ", With => "mit", Has => "hat",
        Rule => "Regel", To => "Zu", Given => "gegeben", Produce => "erzeuge", Function => "Funktion",
        If => "Wenn", Otherwise => "Sonst", Match => "Vergleiche", When => "Wann", Case => "Fall",
        Return => "Gib zurueck", Scope => "Bereich",
        Let => "Sei", Be => "sei", Set => "Setze", Mutable => "veraenderlich", Var => "Variable",
        True => "wahr", False => "falsch", And => "und", Or => "oder", Not => "nicht",
        Plus => "plus", Minus => "minus", Times => "mal", DividedBy => "geteilt durch",
        LessThan => "kleiner als", Under => "unter", GreaterThan => "groesser als", Over => "ueber",
        EqualsTo => "gleich", LessEqual => "hoechstens", GreaterEqual => "mindestens", NotEqual => "ungleich",
        Ok => "Ok", Err => "Fehler", Some => "Etwas", None => "Nichts", Maybe => "Vielleicht",
        OptionCtor => "Option", ResultCtor => "Ergebnis", ListCtor => "Liste", MapCtor => "Abbildung",
        Null => "null",
        TextType => "Text", IntType => "Zahl", LongType => "Langzahl", FloatType => "Gleitkomma",
        BoolType => "Bool", DateTimeType => "Datum",
        Pure => "rein", Cpu => "Rechenleistung", Io => "Eingabe-Ausgabe", AsyncEffect => "asynchron",
        Performs => "fuehrt aus",
        Workflow => "Arbeitsablauf", Step => "Schritt", Compensate => "Kompensiere",
        Start => "Starte", Wait => "Warte", For => "fuer", Await => "erwarte",
        Must => "muss", Should => "sollte", Requires => "erfordert", Ensures => "stellt sicher",
        Allowed => "erlaubt", Forbidden => "verboten",
    }
}

fn english_messages() -> MessageTemplates {
    MessageTemplates {
        unexpected_token: "unexpected token {found}, expected one of: {expected}".into(),
        expected_keyword: "expected keyword '{keyword}'".into(),
        undefined_variable: "undefined variable '{name}'".into(),
        type_mismatch: "type mismatch: expected {expected}, found {found}".into(),
        unterminated_string: "unterminated string literal".into(),
        invalid_indentation: "invalid indentation: {found} spaces is not a multiple of 2".into(),
    }
}

fn chinese_messages() -> MessageTemplates {
    MessageTemplates {
        unexpected_token: "意外的记号 {found}，期望以下之一：{expected}".into(),
        expected_keyword: "期望关键字 '{keyword}'".into(),
        undefined_variable: "未定义的变量 '{name}'".into(),
        type_mismatch: "类型不匹配：期望 {expected}，实际为 {found}".into(),
        unterminated_string: "未终止的字符串字面量".into(),
        invalid_indentation: "无效缩进：{found} 个空格不是 2 的倍数".into(),
    }
}

fn german_messages() -> MessageTemplates {
    MessageTemplates {
        unexpected_token: "unerwartetes Token {found}, erwartet eines von: {expected}".into(),
        expected_keyword: "Schluesselwort '{keyword}' erwartet".into(),
        undefined_variable: "undefinierte Variable '{name}'".into(),
        type_mismatch: "Typkonflikt: erwartet {expected}, gefunden {found}".into(),
        unterminated_string: "nicht abgeschlossenes Zeichenkettenliteral".into(),
        invalid_indentation: "ungueltige Einrueckung: {found} Leerzeichen sind kein Vielfaches von 2".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_lexicon_is_complete() {
        assert!(Lexicon::english().validate().is_ok());
    }

    #[test]
    fn chinese_lexicon_is_complete() {
        assert!(Lexicon::chinese().validate().is_ok());
    }

    #[test]
    fn german_lexicon_is_complete() {
        assert!(Lexicon::german().validate().is_ok());
    }

    #[test]
    fn defaults_is_english() {
        assert_eq!(Lexicon::defaults().id(), "en");
    }

    #[test]
    fn id_is_normalized() {
        let lexicon = Lexicon::new(
            "ZH_cn ",
            "test",
            Direction::Ltr,
            english_keywords(),
            ascii_punctuation(),
            Lexicon::english().canonicalization().clone(),
            english_messages(),
            HashMap::new(),
        );
        assert_eq!(lexicon.id(), "zh-cn");
    }

    #[test]
    fn missing_keyword_fails_validation() {
        let mut keywords = english_keywords();
        keywords.remove(&SemanticKind::If);
        let lexicon = Lexicon::new(
            "en",
            "English",
            Direction::Ltr,
            keywords,
            ascii_punctuation(),
            Lexicon::english().canonicalization().clone(),
            english_messages(),
            HashMap::new(),
        );
        let errors = lexicon.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("IF")));
    }

    #[test]
    fn duplicate_surface_without_allowed_group_fails() {
        let mut keywords = english_keywords();
        keywords.insert(SemanticKind::Over, "less than".to_string());
        let lexicon = Lexicon::new(
            "en",
            "English",
            Direction::Ltr,
            keywords,
            ascii_punctuation(),
            Lexicon::english().canonicalization().clone(),
            english_messages(),
            HashMap::new(),
        );
        assert!(lexicon.validate().is_err());
    }

    #[test]
    fn less_than_and_under_allowed_duplicate_passes() {
        let mut keywords = english_keywords();
        keywords.insert(SemanticKind::Under, "less than".to_string());
        let lexicon = Lexicon::new(
            "en",
            "English",
            Direction::Ltr,
            keywords,
            ascii_punctuation(),
            Lexicon::english().canonicalization().clone(),
            english_messages(),
            HashMap::new(),
        );
        assert!(lexicon.validate().is_ok());
    }

    #[test]
    fn multi_word_keywords_are_sorted_longest_first() {
        let lexicon = Lexicon::english();
        let entries = lexicon.multi_word_keywords_longest_first();
        for pair in entries.windows(2) {
            assert!(pair[0].1.len() >= pair[1].1.len());
        }
    }
}
