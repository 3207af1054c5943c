//! Rule ordering analysis
//!
//! pg_hba rules are evaluated top to bottom and the first match wins. Each
//! rule is compared against every rule above it to find rules that can
//! never be reached, rules that are only partly reachable, and duplicates.

use crate::finding::{Code, Finding, Report};
use crate::rule::{options_not_stricter, ConnectionKind, Rule};
use tracing::debug;

/// Methods that are weak enough that a broad rule using them ahead of a
/// stricter rule is most likely a mistake
const WEAK_METHODS: &[&str] = &["trust", "md5", "password"];

const STRONG_METHODS: &[&str] = &[
    "scram-sha-256",
    "cert",
    "gss",
    "sspi",
    "ldap",
    "pam",
    "radius",
    "peer",
    "ident",
];

/// How the matching space of an earlier rule relates to a later one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// No connection can match both rules
    Unrelated,
    /// Some connections match both rules
    Partial,
    /// Every connection matching the later rule is taken by the earlier one
    FullCover,
}

/// Classify how `earlier` relates to `later`
pub fn relation(earlier: &Rule, later: &Rule) -> Relation {
    if !earlier.kind.compatible_with(later.kind) {
        return Relation::Unrelated;
    }

    let addr_covers = earlier.address.covers(&later.address);
    let addr_intersects = earlier.address.intersects(&later.address);
    if !addr_covers && !addr_intersects {
        return Relation::Unrelated;
    }

    let db_covers = earlier.databases.covers(&later.databases);
    let db_intersects = earlier.databases.intersects(&later.databases);
    if !db_covers && !db_intersects {
        return Relation::Unrelated;
    }

    let user_covers = earlier.users.covers(&later.users);
    let user_intersects = earlier.users.intersects(&later.users);
    if !user_covers && !user_intersects {
        return Relation::Unrelated;
    }

    if addr_covers
        && db_covers
        && user_covers
        && options_not_stricter(&earlier.options, &later.options)
    {
        return Relation::FullCover;
    }

    if addr_intersects && db_intersects && user_intersects {
        return Relation::Partial;
    }

    Relation::Unrelated
}

/// Compare every rule with each rule above it.
///
/// Findings come out ordered by the later rule, then by the earlier rule.
pub fn check_overlaps(rules: &[Rule]) -> Report {
    let mut report = Report::new();

    for (j, later) in rules.iter().enumerate() {
        for earlier in &rules[..j] {
            classify_pair(earlier, later, &mut report);
        }
    }

    debug!(rules = rules.len(), findings = report.len(), "overlap analysis complete");
    report
}

fn classify_pair(earlier: &Rule, later: &Rule, report: &mut Report) {
    match relation(earlier, later) {
        Relation::Unrelated => {}
        Relation::Partial => {
            debug!(earlier = earlier.line, later = later.line, "partial overlap");
            report.push(Finding::warning(
                Code::PartialOverlap,
                later.line,
                format!("Rule partially overlaps with line {}.", earlier.line),
            ));
        }
        Relation::FullCover => {
            debug!(earlier = earlier.line, later = later.line, "full cover");
            full_cover_findings(earlier, later, report);
        }
    }
}

/// Findings for a pair where `earlier` fully covers `later`
fn full_cover_findings(earlier: &Rule, later: &Rule, report: &mut Report) {
    if earlier.method == "reject" && later.method != "reject" {
        report.push(Finding::error(
            Code::ShadowedByReject,
            later.line,
            format!("Rule is shadowed by reject at line {}.", earlier.line),
        ));
        return;
    }

    // Reported on its own axis; the method comparison below still runs.
    if earlier.kind == ConnectionKind::Host
        && matches!(later.kind, ConnectionKind::HostSsl | ConnectionKind::HostNoSsl)
    {
        report.push(Finding::warning(
            Code::ShadowedByHost,
            later.line,
            format!("host rule at line {} shadows this rule.", earlier.line),
        ));
    }

    if is_weaker(&earlier.method, &later.method) {
        report.push(Finding::warning(
            Code::OverlyBroadRule,
            earlier.line,
            format!("Broad rule shadows stricter rule at line {}.", later.line),
        ));
        report.push(Finding::warning(
            Code::ShadowedByBroadRule,
            later.line,
            format!("Rule is shadowed by broader rule at line {}.", earlier.line),
        ));
        return;
    }

    if earlier.method == later.method && earlier.options == later.options {
        report.push(Finding::info(
            Code::RedundantRule,
            later.line,
            format!("Rule is redundant due to line {}.", earlier.line),
        ));
        return;
    }

    report.push(Finding::warning(
        Code::ShadowedRule,
        later.line,
        format!("Rule is fully shadowed by line {}.", earlier.line),
    ));
}

fn is_weaker(earlier: &str, later: &str) -> bool {
    WEAK_METHODS.contains(&earlier) && STRONG_METHODS.contains(&later)
}
