//! The closed, locale-neutral enumeration of semantic token kinds.
//!
//! A [`SemanticKind`] names a keyword *role* (e.g. "the keyword that opens an
//! if-statement"), never a surface string. Every registered [`crate::Lexicon`]
//! maps each kind to exactly one surface form for its locale; the canonicalizer
//! rewrites locale-specific surface forms back to the English lexicon's forms
//! before the lexer ever runs, so downstream stages only ever see one fixed
//! vocabulary.

/// One of the fifteen groupings semantic kinds are organized into, matching
/// `SPEC_FULL.md` §3's category list verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Module,
    Type,
    Function,
    Control,
    Variable,
    Boolean,
    Arithmetic,
    Comparison,
    TypeConstructor,
    Literal,
    PrimitiveType,
    Effect,
    Workflow,
    Async,
    Constraint,
}

macro_rules! semantic_kind {
    ($($variant:ident, $name:literal => $category:ident),+ $(,)?) => {
        /// A language-neutral keyword role. [`SemanticKind::name`] returns the
        /// `SCREAMING_SNAKE_CASE` form used as the JSON key in lexicon
        /// import/export (`keywords.<KIND>`) and in diagnostics.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SemanticKind {
            $($variant),+
        }

        impl SemanticKind {
            /// Every kind, in declaration order. Iteration order is stable and
            /// is *not* the order used for JSON export (that is always sorted
            /// by name for determinism).
            pub const ALL: &'static [SemanticKind] = &[
                $(SemanticKind::$variant),+
            ];

            /// The category this kind belongs to.
            pub fn category(self) -> Category {
                match self {
                    $(SemanticKind::$variant => Category::$category),+
                }
            }

            /// The `SCREAMING_SNAKE_CASE` name used as a JSON key and in
            /// diagnostics, e.g. `SemanticKind::LessThan.name() == "LESS_THAN"`.
            pub fn name(self) -> &'static str {
                match self {
                    $(SemanticKind::$variant => $name),+
                }
            }

            /// Looks up a kind by its `name()`. Used when deserializing a
            /// lexicon's `keywords` map, whose keys are kind names.
            pub fn from_name(name: &str) -> Option<SemanticKind> {
                Self::ALL.iter().copied().find(|k| k.name() == name)
            }
        }
    };
}

semantic_kind! {
    Module, "MODULE" => Module,
    Import, "IMPORT" => Module,
    Use, "USE" => Module,
    As, "AS" => Module,

    Data, "DATA" => Type,
    Enum, "ENUM" => Type,
    TypeAlias, "TYPE_ALIAS" => Type,
    With, "WITH" => Type,
    Has, "HAS" => Type,

    Rule, "RULE" => Function,
    To, "TO" => Function,
    Given, "GIVEN" => Function,
    Produce, "PRODUCE" => Function,
    Function, "FUNCTION" => Function,

    If, "IF" => Control,
    Otherwise, "OTHERWISE" => Control,
    Match, "MATCH" => Control,
    When, "WHEN" => Control,
    Case, "CASE" => Control,
    Return, "RETURN" => Control,
    Scope, "SCOPE" => Control,

    Let, "LET" => Variable,
    Be, "BE" => Variable,
    Set, "SET" => Variable,
    Mutable, "MUTABLE" => Variable,
    Var, "VAR" => Variable,

    True, "TRUE" => Boolean,
    False, "FALSE" => Boolean,
    And, "AND" => Boolean,
    Or, "OR" => Boolean,
    Not, "NOT" => Boolean,

    Plus, "PLUS" => Arithmetic,
    Minus, "MINUS" => Arithmetic,
    Times, "TIMES" => Arithmetic,
    DividedBy, "DIVIDED_BY" => Arithmetic,

    LessThan, "LESS_THAN" => Comparison,
    Under, "UNDER" => Comparison,
    GreaterThan, "GREATER_THAN" => Comparison,
    Over, "OVER" => Comparison,
    EqualsTo, "EQUALS_TO" => Comparison,
    LessEqual, "LESS_EQUAL" => Comparison,
    GreaterEqual, "GREATER_EQUAL" => Comparison,
    NotEqual, "NOT_EQUAL" => Comparison,

    Ok, "OK" => TypeConstructor,
    Err, "ERR" => TypeConstructor,
    Some, "SOME" => TypeConstructor,
    None, "NONE" => TypeConstructor,
    Maybe, "MAYBE" => TypeConstructor,
    OptionCtor, "OPTION" => TypeConstructor,
    ResultCtor, "RESULT" => TypeConstructor,
    ListCtor, "LIST" => TypeConstructor,
    MapCtor, "MAP" => TypeConstructor,

    Null, "NULL" => Literal,

    TextType, "TEXT" => PrimitiveType,
    IntType, "INT" => PrimitiveType,
    LongType, "LONG" => PrimitiveType,
    FloatType, "FLOAT" => PrimitiveType,
    BoolType, "BOOL" => PrimitiveType,
    DateTimeType, "DATETIME" => PrimitiveType,

    Pure, "PURE" => Effect,
    Cpu, "CPU" => Effect,
    Io, "IO" => Effect,
    AsyncEffect, "ASYNC" => Effect,
    Performs, "PERFORMS" => Effect,

    Workflow, "WORKFLOW" => Workflow,
    Step, "STEP" => Workflow,
    Compensate, "COMPENSATE" => Workflow,

    Start, "START" => Async,
    Wait, "WAIT" => Async,
    For, "FOR" => Async,
    Await, "AWAIT" => Async,

    Must, "MUST" => Constraint,
    Should, "SHOULD" => Constraint,
    Requires, "REQUIRES" => Constraint,
    Ensures, "ENSURES" => Constraint,
    Allowed, "ALLOWED" => Constraint,
    Forbidden, "FORBIDDEN" => Constraint,
}

impl serde::Serialize for SemanticKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for SemanticKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        SemanticKind::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown semantic kind '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn approximately_seventy_five_kinds() {
        assert!(SemanticKind::ALL.len() >= 70 && SemanticKind::ALL.len() <= 80);
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<&str> = SemanticKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), SemanticKind::ALL.len());
    }

    #[test]
    fn from_name_round_trips() {
        for kind in SemanticKind::ALL {
            assert_eq!(SemanticKind::from_name(kind.name()), std::option::Option::Some(*kind));
        }
    }

    #[test]
    fn from_name_rejects_unknown() {
        assert_eq!(SemanticKind::from_name("NOT_A_KIND"), std::option::Option::None);
    }

    #[test]
    fn less_than_and_under_are_comparison_category() {
        assert_eq!(SemanticKind::LessThan.category(), Category::Comparison);
        assert_eq!(SemanticKind::Under.category(), Category::Comparison);
    }
}
