//! End-to-end scenario coverage (`spec.md` §8): the six concrete S1-S6
//! scenarios plus the ten universal invariants, run against the full
//! `compile_module` pipeline or, where an invariant names a narrower stage
//! (the canonicalizer, the lexer, the parser, a lexicon), against that
//! stage directly.

use aster::{compile_module, CompileConfig, CompileOutcome};
use aster_lexicon::{DomainVocabulary, IdentifierKind, IdentifierMapping, Lexicon};
use std::collections::HashMap;

fn compile(source: &str) -> CompileOutcome {
    let lexicon = Lexicon::english();
    let config = CompileConfig::default();
    compile_module(source, "scenarios.cnl", "scenarios", &lexicon, &config)
}

// ---- S1-S6: concrete end-to-end scenarios (spec.md §8) --------------------

#[test]
fn s1_english_greeting_is_already_canonical_and_type_checks() {
    let source = "Module app.\nRule helloMessage produce Text:\n  Return \"Hello, world!\".\n";
    let outcome = compile(source);
    assert_eq!(outcome.canonical_source, source);
    assert!(!outcome.has_errors(), "{:?}", outcome.diagnostics);
}

#[test]
fn s2_chinese_with_domain_translation_canonicalizes_to_english_keywords() {
    let lexicon = Lexicon::chinese();
    let vocabulary = DomainVocabulary {
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
        fields: vec![IdentifierMapping {
            canonical: "age".into(),
            localized: "年龄".into(),
            kind: IdentifierKind::Field,
            parent: Some("Driver".into()),
            description: None,
            aliases: vec![],
        }],
        functions: vec![],
        enum_values: vec![],
        metadata: None,
    };
    let config = CompileConfig { vocabulary: Some(&vocabulary), transformers: Default::default() };
    let outcome = compile_module(
        "如果 驾驶员 的 年龄 大于 18，返回 真。",
        "scenarios.cnl",
        "scenarios",
        &lexicon,
        &config,
    );
    assert!(outcome.canonical_source.contains("If"));
    assert!(outcome.canonical_source.contains("Driver.age"));
    assert!(outcome.canonical_source.contains("true"));
}

#[test]
fn s3_possessive_preserved_inside_string_literal() {
    let outcome = compile(r#"print "driver's license""#);
    assert!(outcome.canonical_source.contains("driver's license"));
}

#[test]
fn s4_effect_missing_is_reported_at_the_function_origin() {
    let source = "Module app.\nRule fetch produce Text:\n  Return Http.get(\"https://x\").\n";
    let outcome = compile(source);
    assert!(outcome.has_errors(), "{:?}", outcome.diagnostics);
    assert!(
        outcome.diagnostics.iter().any(|d| d.code == aster_diagnostics::ErrorCode::EffectMissingIo),
        "{:?}",
        outcome.diagnostics
    );
}

#[test]
fn s4b_declared_capability_tag_silences_capability_missing() {
    let source =
        "Module app.\nRule fetch produce Text performs io requires Http:\n  Return Http.get(\"https://x\").\n";
    let outcome = compile(source);
    assert!(
        !outcome.diagnostics.iter().any(|d| d.code == aster_diagnostics::ErrorCode::CapabilityMissing),
        "{:?}",
        outcome.diagnostics
    );
}

#[test]
fn s5_generic_identity_unifies_type_var_with_no_errors() {
    let source =
        "Rule identity given x: T produce T:\n  Return x.\nRule main produce Int:\n  Return identity(42).\n";
    let outcome = compile(source);
    assert!(!outcome.has_errors(), "{:?}", outcome.diagnostics);
}

#[test]
fn s6_indentation_error_carries_the_exact_line_number() {
    let source = "Rule f produce Int:\n   Return 1.\n";
    let outcome = compile(source);
    assert!(outcome.has_errors());
    let indent_error = outcome
        .diagnostics
        .iter()
        .find(|d| d.code == aster_diagnostics::ErrorCode::InvalidIndentation)
        .expect("expected an InvalidIndentation diagnostic");
    let span = indent_error.span.expect("indentation error carries a span");
    assert_eq!(span.start_line, 2);
}

// ---- Universal invariants (spec.md §8) ------------------------------------

/// 1. Canonicalizer idempotence: `C_L(C_L(s)) == C_L(s)` for every sample and
/// every built-in lexicon.
#[test]
fn invariant_1_canonicalizer_is_idempotent() {
    let samples = [
        "Module app.\nRule f produce Int:\n  Return 1.\n",
        "If age less than 18, Return false.",
        "Return Driver's age.",
        r#"print "driver's license""#,
    ];
    for lexicon in [Lexicon::english(), Lexicon::chinese(), Lexicon::german()] {
        let registry = aster_lexicon::TransformerRegistry::new();
        let mut interner = aster_base::Interner::new();
        let file = interner.intern("idempotence.cnl");
        for sample in samples {
            let once = aster_canon::canonicalize(sample, file, &lexicon, None, &registry).unwrap();
            let twice = aster_canon::canonicalize(&once, file, &lexicon, None, &registry).unwrap();
            assert_eq!(once, twice, "lexicon {} not idempotent on {sample:?}", lexicon.id());
        }
    }
}

/// 2. String preservation: the multiset of string-literal contents survives
/// canonicalization byte-for-byte.
#[test]
fn invariant_2_string_literal_contents_are_preserved() {
    let lexicon = Lexicon::english();
    let registry = aster_lexicon::TransformerRegistry::new();
    let mut interner = aster_base::Interner::new();
    let file = interner.intern("strings.cnl");
    let source = r#"Rule f produce Text:
  Let a be "driver's license".
  Let b be "under 18 and over 65".
  Return a.
"#;
    let out = aster_canon::canonicalize(source, file, &lexicon, None, &registry).unwrap();
    assert_eq!(extract_string_contents(source), extract_string_contents(&out));
}

fn extract_string_contents(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            let start = i + 1;
            let mut j = start;
            while j < bytes.len() && bytes[j] != b'"' {
                j += 1;
            }
            out.push(&text[start..j]);
            i = j + 1;
        } else {
            i += 1;
        }
    }
    out
}

/// 3. Indentation correctness: every `INDENT` is matched by a later
/// `DEDENT`, and the depth at `EOF` is zero.
#[test]
fn invariant_3_indent_dedent_tokens_balance_to_zero_depth() {
    let lexicon = Lexicon::english();
    let mut interner = aster_base::Interner::new();
    let file = interner.intern("indent.cnl");
    let source = "Rule f produce Int:\n  If true:\n    Return 1.\n  Return 2.\n";
    let (tokens, diagnostics) = aster_lexer::tokenize(source, file, &lexicon, &mut interner);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.diagnostics());
    let mut depth: i32 = 0;
    for token in &tokens {
        match token.kind {
            aster_lexer::TokenKind::Indent => depth += 1,
            aster_lexer::TokenKind::Dedent => depth -= 1,
            _ => {}
        }
        assert!(depth >= 0, "DEDENT without a matching INDENT");
    }
    assert_eq!(depth, 0, "indentation stack not empty at EOF");
}

/// 4. Block-span precision: a block's span runs exactly from its first
/// statement's start to its last statement's end.
#[test]
fn invariant_4_block_span_matches_first_and_last_statement() {
    let lexicon = Lexicon::english();
    let mut interner = aster_base::Interner::new();
    let file = interner.intern("blockspan.cnl");
    let source = "Rule f produce Int:\n  Let a be 1.\n  Let b be 2.\n  Return a.\n";
    let (tokens, lex_diags) = aster_lexer::tokenize(source, file, &lexicon, &mut interner);
    assert!(lex_diags.is_empty());

    let decls = aster_base::Arena::new();
    let stmts = aster_base::Arena::new();
    let exprs = aster_base::Arena::new();
    let patterns = aster_base::Arena::new();
    let types = aster_base::Arena::new();
    let params = aster_base::Arena::new();
    let arms = aster_base::Arena::new();
    let ctx = aster_parser::AstContext::new(&decls, &stmts, &exprs, &patterns, &types, &params, &arms);
    let name = interner.intern("blockspan");
    let (module, parse_diags) = aster_parser::parse_module(&tokens, file, name, &ctx, &mut interner);
    assert!(parse_diags.is_empty(), "{:?}", parse_diags.diagnostics());

    let aster_parser::Decl::Func(f) = &module.decls[0] else { panic!("expected a function") };
    let computed = aster_parser::block_span(f.body);
    let first = f.body.first().unwrap().span();
    let last = f.body.last().unwrap().span();
    assert_eq!(computed.start, first.start);
    assert_eq!(computed.end, last.end);
}

/// 5. Lexicon completeness: every registered lexicon maps every semantic
/// kind to a non-empty surface form.
#[test]
fn invariant_5_every_builtin_lexicon_covers_every_semantic_kind() {
    for lexicon in [Lexicon::english(), Lexicon::chinese(), Lexicon::german()] {
        assert!(lexicon.missing_kinds().is_empty(), "{} missing: {:?}", lexicon.id(), lexicon.missing_kinds());
    }
}

/// 6. Keyword uniqueness modulo allowed duplicates: `Lexicon::validate`
/// folds this check in alongside completeness.
#[test]
fn invariant_6_keyword_surface_forms_are_unique_modulo_allowed_duplicates() {
    for lexicon in [Lexicon::english(), Lexicon::chinese(), Lexicon::german()] {
        assert!(lexicon.validate().is_ok(), "{}: {:?}", lexicon.id(), lexicon.validate());
    }
}

/// 7. Export round-trip: `import(export(L))` recovers the same keyword map,
/// and tampering with the payload is caught by the checksum.
#[test]
fn invariant_7_export_import_round_trips_and_checksum_is_verified() {
    let lexicon = Lexicon::english();
    let exported = aster_lexicon::export_lexicons(std::slice::from_ref(&lexicon));
    let imported = aster_lexicon::import_lexicons(&exported).expect("checksum should verify");
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].id(), lexicon.id());
    let original_keywords: HashMap<_, _> = lexicon.keywords().iter().map(|(k, v)| (*k, v.clone())).collect();
    let round_tripped_keywords: HashMap<_, _> =
        imported[0].keywords().iter().map(|(k, v)| (*k, v.clone())).collect();
    assert_eq!(original_keywords, round_tripped_keywords);

    let mut tampered = exported;
    tampered["checksum"] = serde_json::Value::String("0".repeat(64));
    assert!(aster_lexicon::import_lexicons(&tampered).is_err());
}

/// 8. Effect-lattice soundness: the type checker reports no effect error
/// iff the inferred effect is dominated by the declared one.
#[test]
fn invariant_8_effect_errors_fire_exactly_when_inferred_exceeds_declared() {
    struct Case {
        source: &'static str,
        expect_error: bool,
    }
    let cases = [
        Case { source: "Rule f produce Int:\n  Return 1.\n", expect_error: false },
        Case {
            source: "Rule f produce Int performs cpu:\n  Return Math.sqrt(4).\n",
            expect_error: false,
        },
        Case {
            source: "Rule f produce Text:\n  Return Http.get(\"https://x\").\n",
            expect_error: true,
        },
        Case {
            source: "Rule f produce Int performs io:\n  Return 1.\n",
            expect_error: false,
        },
        Case {
            source: "Rule f produce Int performs cpu:\n  Return Http.get(\"https://x\").\n",
            expect_error: true,
        },
    ];
    for case in cases {
        let outcome = compile(case.source);
        assert_eq!(
            outcome.has_errors(),
            case.expect_error,
            "source {:?} diagnostics {:?}",
            case.source,
            outcome.diagnostics
        );
    }
}

/// 9. Alias cycles safe: resolving a cyclic type-alias graph terminates
/// (instead of looping or overflowing the stack) and yields a `TypeName`.
#[test]
fn invariant_9_cyclic_type_aliases_resolve_without_looping() {
    let source = "Type Alpha as Beta.\nType Beta as Alpha.\nRule f produce Alpha:\n  Return 1.\n";
    let outcome = compile(source);
    // Whether or not the cyclic alias is compatible with `1`'s inferred
    // type, compilation must terminate and return diagnostics rather than
    // hang or overflow the stack.
    let _ = outcome.has_errors();
}

/// 10. Async pairing: after a successful type-check, every `Start` is
/// matched by a later `Wait` on every control-flow path and vice versa.
#[test]
fn invariant_10_async_start_wait_pairing_holds_after_a_clean_check() {
    let paired = "Rule f produce Int:\n  Start job as 1.\n  Wait for job.\n  Return 1.\n";
    let outcome = compile(paired);
    assert!(!outcome.has_errors(), "{:?}", outcome.diagnostics);

    let unpaired = "Rule f produce Int:\n  Start job as 1.\n  Return 1.\n";
    let outcome = compile(unpaired);
    assert!(outcome.has_errors(), "{:?}", outcome.diagnostics);
    assert!(
        outcome.diagnostics.iter().any(|d| d.code == aster_diagnostics::ErrorCode::AsyncStartNotWaited),
        "{:?}",
        outcome.diagnostics
    );
}
