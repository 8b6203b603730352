//! `Start`/`Wait` pairing discipline (`spec.md` §4.6.5): every `Start name
//! as expr` must be matched by exactly one later `Wait for name` on every
//! control-flow path, mirroring the teacher's control-flow walker that
//! tracks obligations introduced mid-block and discharged before exit.

use aster_base::{Interner, Span, Symbol};
use aster_diagnostics::{DiagnosticBuilder, ErrorCode};
use aster_ir::IrStmt;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
struct Pending {
    span: Span,
}

/// Every name ever named in a `Start` anywhere in the body, regardless of
/// control-flow reachability -- used to tell "this name is never started on
/// any path" (`AsyncWaitNotStarted`) apart from "this name's `Start` exists
/// but comes later in program order" (`AsyncWaitBeforeStart`).
fn collect_started(body: &[IrStmt<'_>], out: &mut HashSet<Symbol>) {
    for stmt in body {
        match stmt {
            IrStmt::Start { name, .. } => {
                out.insert(*name);
            }
            IrStmt::If { then_block, else_block, .. } => {
                collect_started(then_block, out);
                if let Some(else_block) = else_block {
                    collect_started(else_block, out);
                }
            }
            IrStmt::Match { arms, .. } => {
                for arm in arms.iter() {
                    collect_started(arm.body, out);
                }
            }
            IrStmt::Scope { body, .. } => collect_started(body, out),
            IrStmt::Workflow { steps, .. } => collect_started(steps, out),
            IrStmt::Step { body, compensate, .. } => {
                collect_started(body, out);
                if let Some(compensate) = compensate {
                    collect_started(compensate, out);
                }
            }
            IrStmt::Let { .. } | IrStmt::Set { .. } | IrStmt::Return { .. } | IrStmt::ExprStmt { .. } | IrStmt::Wait { .. } => {}
        }
    }
}

/// Walks one function body's statement list (recursing into nested
/// blocks) verifying the `Start`/`Wait` pairing discipline. A `Start`
/// inside an `If`/`Match` arm must be `Wait`ed on every arm, or after the
/// construct closes on the shared continuation -- this walker treats each
/// nested block as its own scope and requires it to leave no pending
/// starts behind, which is the conservative (but sound) reading of "every
/// control-flow path".
pub fn check_block(body: &[IrStmt<'_>], interner: &Interner, diagnostics: &mut DiagnosticBuilder) {
    let mut started_anywhere = HashSet::new();
    collect_started(body, &mut started_anywhere);
    let mut pending: HashMap<Symbol, Pending> = HashMap::new();
    let mut waited: HashSet<Symbol> = HashSet::new();
    walk(body, &started_anywhere, &mut pending, &mut waited, interner, diagnostics);
    for (name, p) in pending {
        diagnostics.raise(
            ErrorCode::AsyncStartNotWaited,
            Some(p.span),
            &[("name", interner.resolve(name).to_string())],
        );
    }
}

fn walk(
    body: &[IrStmt<'_>],
    started_anywhere: &HashSet<Symbol>,
    pending: &mut HashMap<Symbol, Pending>,
    waited: &mut HashSet<Symbol>,
    interner: &Interner,
    diagnostics: &mut DiagnosticBuilder,
) {
    for stmt in body {
        match stmt {
            IrStmt::Start { name, span, .. } => {
                if pending.insert(*name, Pending { span: *span }).is_some() {
                    diagnostics.raise(
                        ErrorCode::AsyncDuplicateStart,
                        Some(*span),
                        &[("name", interner.resolve(*name).to_string())],
                    );
                }
                waited.remove(name);
            }
            IrStmt::Wait { name, span } => {
                if pending.remove(name).is_some() {
                    waited.insert(*name);
                } else if waited.contains(name) {
                    diagnostics.raise(
                        ErrorCode::AsyncDuplicateWait,
                        Some(*span),
                        &[("name", interner.resolve(*name).to_string())],
                    );
                } else if started_anywhere.contains(name) {
                    diagnostics.raise(
                        ErrorCode::AsyncWaitBeforeStart,
                        Some(*span),
                        &[("name", interner.resolve(*name).to_string())],
                    );
                } else {
                    diagnostics.raise(
                        ErrorCode::AsyncWaitNotStarted,
                        Some(*span),
                        &[("name", interner.resolve(*name).to_string())],
                    );
                }
            }
            IrStmt::If { then_block, else_block, .. } => {
                let mut then_pending = pending.clone();
                let mut then_waited = waited.clone();
                walk(then_block, started_anywhere, &mut then_pending, &mut then_waited, interner, diagnostics);
                let mut else_pending = pending.clone();
                let mut else_waited = waited.clone();
                if let Some(else_block) = else_block {
                    walk(else_block, started_anywhere, &mut else_pending, &mut else_waited, interner, diagnostics);
                }
                *pending = merge_branch_pendings(then_pending, else_pending);
                *waited = then_waited.union(&else_waited).copied().collect();
            }
            IrStmt::Match { arms, .. } => {
                let mut merged: Option<HashMap<Symbol, Pending>> = None;
                let mut merged_waited: Option<HashSet<Symbol>> = None;
                for arm in arms.iter() {
                    let mut arm_pending = pending.clone();
                    let mut arm_waited = waited.clone();
                    walk(arm.body, started_anywhere, &mut arm_pending, &mut arm_waited, interner, diagnostics);
                    merged = Some(match merged {
                        None => arm_pending,
                        Some(acc) => merge_branch_pendings(acc, arm_pending),
                    });
                    merged_waited = Some(match merged_waited {
                        None => arm_waited,
                        Some(acc) => acc.union(&arm_waited).copied().collect(),
                    });
                }
                if let Some(merged) = merged {
                    *pending = merged;
                }
                if let Some(merged_waited) = merged_waited {
                    *waited = merged_waited;
                }
            }
            IrStmt::Scope { body, .. } => walk(body, started_anywhere, pending, waited, interner, diagnostics),
            IrStmt::Workflow { steps, .. } => walk(steps, started_anywhere, pending, waited, interner, diagnostics),
            IrStmt::Step { body, compensate, .. } => {
                walk(body, started_anywhere, pending, waited, interner, diagnostics);
                if let Some(compensate) = compensate {
                    walk(compensate, started_anywhere, pending, waited, interner, diagnostics);
                }
            }
            IrStmt::Let { .. } | IrStmt::Set { .. } | IrStmt::Return { .. } | IrStmt::ExprStmt { .. } => {}
        }
    }
}

/// Two branches of a conditional disagree on what's still pending only if
/// one waited on something the other didn't start or vice versa; a name
/// pending in only one branch survives into the merged continuation, since
/// that path still owes a `Wait`.
fn merge_branch_pendings(a: HashMap<Symbol, Pending>, b: HashMap<Symbol, Pending>) -> HashMap<Symbol, Pending> {
    let mut merged = a;
    for (name, pending) in b {
        merged.entry(name).or_insert(pending);
    }
    merged
}
