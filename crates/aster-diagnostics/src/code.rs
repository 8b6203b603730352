//! The closed error-code taxonomy.
//!
//! Every diagnostic the pipeline can emit is backed by one [`ErrorCode`]
//! variant. The human-facing category, default severity, message template and
//! help text for each code are not hardcoded here: they are loaded once from
//! `shared/error_codes.json`, the single JSON source of truth shared by every
//! consumer of this table (see `SPEC_FULL.md` §4.7). Adding a new diagnostic
//! means adding a row to that file and a matching variant here; the two must
//! never drift apart, which is checked by `tests::every_variant_has_a_row`.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "{s}")
    }
}

/// Broad grouping a code belongs to, matching the numeric range it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Other,
    Scope,
    Type,
    Effect,
    Capability,
    Pii,
    Async,
}

/// One closed-enum error code. The discriminant doubles as the lookup key
/// into the JSON table (`ErrorCode::id`, e.g. `"E0201"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnterminatedString,
    InvalidIndentation,
    InconsistentDedent,
    InvalidEscape,
    UnexpectedToken,
    ExpectedKeyword,
    InvalidConfiguration,
    DuplicateTransformer,
    PartialKeywordCoverage,
    RegexCompileFailed,
    RegistryOverwrite,

    UndefinedVariable,
    DuplicateDeclaration,
    ImmutableAssignment,

    TypeMismatch,
    ReturnTypeMismatch,
    IfBranchMismatch,
    MatchArmMismatch,
    ListElementMismatch,
    TypeVarInconsistent,
    TypeArityMismatch,
    UnknownType,

    EffectMissingIo,
    EffectMissingCpu,
    EffectRedundantIo,
    EffectRedundantCpu,
    EffectRedundantCpuWithIo,

    CapabilityMissing,
    CapabilitySuperfluous,
    CapabilityNotAllowed,
    CompensateNewCapability,
    WorkflowUndeclaredCapability,
    WorkflowMissingIo,

    PiiAssignDowngrade,
    PiiImplicitUplevel,
    PiiSinkUnsanitized,
    PiiArgViolation,

    AsyncStartNotWaited,
    AsyncWaitNotStarted,
    AsyncDuplicateStart,
    AsyncDuplicateWait,
    AsyncWaitBeforeStart,
}

impl ErrorCode {
    /// The JSON-table key for this code, e.g. `"E0201"`.
    pub fn id(self) -> &'static str {
        use ErrorCode::*;
        match self {
            UnterminatedString => "E0001",
            InvalidIndentation => "E0002",
            InconsistentDedent => "E0003",
            InvalidEscape => "E0004",
            UnexpectedToken => "E0005",
            ExpectedKeyword => "E0006",
            InvalidConfiguration => "E0007",
            DuplicateTransformer => "E0008",
            PartialKeywordCoverage => "E0009",
            RegexCompileFailed => "E0010",
            RegistryOverwrite => "E0011",

            UndefinedVariable => "E0101",
            DuplicateDeclaration => "E0102",
            ImmutableAssignment => "E0103",

            TypeMismatch => "E0201",
            ReturnTypeMismatch => "E0202",
            IfBranchMismatch => "E0203",
            MatchArmMismatch => "E0204",
            ListElementMismatch => "E0205",
            TypeVarInconsistent => "E0206",
            TypeArityMismatch => "E0207",
            UnknownType => "E0208",

            EffectMissingIo => "E0301",
            EffectMissingCpu => "E0302",
            EffectRedundantIo => "E0303",
            EffectRedundantCpu => "E0304",
            EffectRedundantCpuWithIo => "E0305",

            CapabilityMissing => "E0401",
            CapabilitySuperfluous => "E0402",
            CapabilityNotAllowed => "E0403",
            CompensateNewCapability => "E0404",
            WorkflowUndeclaredCapability => "E0405",
            WorkflowMissingIo => "E0406",

            PiiAssignDowngrade => "E0501",
            PiiImplicitUplevel => "E0502",
            PiiSinkUnsanitized => "E0503",
            PiiArgViolation => "E0504",

            AsyncStartNotWaited => "E0601",
            AsyncWaitNotStarted => "E0602",
            AsyncDuplicateStart => "E0603",
            AsyncDuplicateWait => "E0604",
            AsyncWaitBeforeStart => "E0605",
        }
    }

    /// Looks up this code's category, default severity, message template and
    /// help text in the shared JSON table.
    ///
    /// # Panics
    ///
    /// Panics if the embedded table is malformed, or omits this code's row.
    /// Both would mean the table and this enum have drifted apart, which is
    /// a build-time defect, not a recoverable runtime condition.
    pub fn info(self) -> &'static ErrorCodeInfo {
        table()
            .get(self.id())
            .unwrap_or_else(|| panic!("error code table missing row for {}", self.id()))
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// One row of the shared error-code table.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ErrorCodeInfo {
    pub code: String,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    pub help: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CodeTable {
    #[allow(dead_code)]
    version: String,
    codes: Vec<ErrorCodeInfo>,
}

const ERROR_CODES_JSON: &str = include_str!("../../../shared/error_codes.json");

fn table() -> &'static HashMap<String, ErrorCodeInfo> {
    static TABLE: OnceLock<HashMap<String, ErrorCodeInfo>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let parsed: CodeTable =
            serde_json::from_str(ERROR_CODES_JSON).expect("shared/error_codes.json is malformed");
        parsed.codes.into_iter().map(|row| (row.code.clone(), row)).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::UnterminatedString,
        ErrorCode::InvalidIndentation,
        ErrorCode::InconsistentDedent,
        ErrorCode::InvalidEscape,
        ErrorCode::UnexpectedToken,
        ErrorCode::ExpectedKeyword,
        ErrorCode::InvalidConfiguration,
        ErrorCode::DuplicateTransformer,
        ErrorCode::PartialKeywordCoverage,
        ErrorCode::RegexCompileFailed,
        ErrorCode::RegistryOverwrite,
        ErrorCode::UndefinedVariable,
        ErrorCode::DuplicateDeclaration,
        ErrorCode::ImmutableAssignment,
        ErrorCode::TypeMismatch,
        ErrorCode::ReturnTypeMismatch,
        ErrorCode::IfBranchMismatch,
        ErrorCode::MatchArmMismatch,
        ErrorCode::ListElementMismatch,
        ErrorCode::TypeVarInconsistent,
        ErrorCode::TypeArityMismatch,
        ErrorCode::UnknownType,
        ErrorCode::EffectMissingIo,
        ErrorCode::EffectMissingCpu,
        ErrorCode::EffectRedundantIo,
        ErrorCode::EffectRedundantCpu,
        ErrorCode::EffectRedundantCpuWithIo,
        ErrorCode::CapabilityMissing,
        ErrorCode::CapabilitySuperfluous,
        ErrorCode::CapabilityNotAllowed,
        ErrorCode::CompensateNewCapability,
        ErrorCode::WorkflowUndeclaredCapability,
        ErrorCode::WorkflowMissingIo,
        ErrorCode::PiiAssignDowngrade,
        ErrorCode::PiiImplicitUplevel,
        ErrorCode::PiiSinkUnsanitized,
        ErrorCode::PiiArgViolation,
        ErrorCode::AsyncStartNotWaited,
        ErrorCode::AsyncWaitNotStarted,
        ErrorCode::AsyncDuplicateStart,
        ErrorCode::AsyncDuplicateWait,
        ErrorCode::AsyncWaitBeforeStart,
    ];

    #[test]
    fn every_variant_has_a_row() {
        for code in ALL {
            let info = code.info();
            assert_eq!(info.code, code.id());
        }
    }

    #[test]
    fn table_has_no_orphan_rows() {
        let known: std::collections::HashSet<&str> = ALL.iter().map(|c| c.id()).collect();
        for key in table().keys() {
            assert!(known.contains(key.as_str()), "row {key} has no ErrorCode variant");
        }
    }

    #[test]
    fn categories_match_numeric_ranges() {
        assert_eq!(ErrorCode::UndefinedVariable.info().category, Category::Scope);
        assert_eq!(ErrorCode::TypeMismatch.info().category, Category::Type);
        assert_eq!(ErrorCode::EffectMissingIo.info().category, Category::Effect);
        assert_eq!(ErrorCode::CapabilityMissing.info().category, Category::Capability);
        assert_eq!(ErrorCode::PiiSinkUnsanitized.info().category, Category::Pii);
        assert_eq!(ErrorCode::AsyncStartNotWaited.info().category, Category::Async);
    }

    #[test]
    fn redundant_cpu_with_io_is_info_severity() {
        assert_eq!(ErrorCode::EffectRedundantCpuWithIo.info().severity, Severity::Info);
    }
}
