use hba_core::{check_all, check_overlaps, parse_hba, Code, IdentMap, Settings, Severity};

const MIXED: &str = "host all all 0.0.0.0/0 trust
host mydb app 10.0.0.5/32 scram-sha-256
host all all 10.0.0.0/16 reject
host mydb app 10.0.0.5/32 scram-sha-256
host all all 0.0.0.0/0 md5
hostssl all all 0.0.0.0/0 scram-sha-256
host all all 10.0.0.0/16 scram-sha-256
host mydb app 10.0.0.5/32 scram-sha-256
host all all 10.0.0.0/24 scram-sha-256
host all all 10.0.0.0/16 scram-sha-256
";

fn pairs(report: &hba_core::Report) -> Vec<(Code, usize)> {
    report.iter().map(|f| (f.code, f.line)).collect()
}

#[test]
fn test_mixed_file_reports_every_overlap_kind() {
    let rules = parse_hba(MIXED).unwrap();
    let report = check_overlaps(&rules);

    for code in [
        Code::OverlyBroadRule,
        Code::ShadowedByBroadRule,
        Code::ShadowedByReject,
        Code::ShadowedByHost,
        Code::RedundantRule,
        Code::PartialOverlap,
    ] {
        assert!(report.has_code(code), "expected {code}");
    }

    let found = pairs(&report);
    assert_eq!(found[0], (Code::OverlyBroadRule, 1));
    assert_eq!(found[1], (Code::ShadowedByBroadRule, 2));
    assert!(found.contains(&(Code::ShadowedByReject, 4)));
    assert!(found.contains(&(Code::ShadowedByHost, 6)));
    assert!(found.contains(&(Code::PartialOverlap, 10)));
}

#[test]
fn test_findings_ordered_by_later_then_earlier_rule() {
    let rules = parse_hba(MIXED).unwrap();
    let report = check_overlaps(&rules);

    // Messages name the other line, so recover (later, earlier) for findings
    // attached to the later rule and check they never go backwards.
    let mut last = (0, 0);
    for finding in report.iter().filter(|f| f.code != Code::OverlyBroadRule) {
        let earlier: usize = finding
            .message
            .trim_end_matches('.')
            .rsplit(' ')
            .find_map(|word| word.parse().ok())
            .unwrap();
        let key = (finding.line, earlier);
        assert!(key >= last, "{key:?} emitted after {last:?}");
        last = key;
    }
}

#[test]
fn test_shadowed_line_carries_finding_from_each_earlier_rule() {
    let rules = parse_hba(MIXED).unwrap();
    let report = check_overlaps(&rules);

    let on_line_8: Vec<Code> = report.iter().filter(|f| f.line == 8).map(|f| f.code).collect();
    assert_eq!(
        on_line_8,
        vec![
            Code::ShadowedByBroadRule, // line 1, trust
            Code::RedundantRule,       // line 2
            Code::ShadowedByReject,    // line 3
            Code::RedundantRule,       // line 4
            Code::ShadowedByBroadRule, // line 5, md5
            Code::RedundantRule,       // line 6, hostssl ahead of host
            Code::RedundantRule,       // line 7
        ]
    );
}

#[test]
fn test_reject_priority_single_finding() {
    let rules = parse_hba("host all all 0.0.0.0/0 reject\nhost all all 0.0.0.0/0 trust\n").unwrap();
    let report = check_overlaps(&rules);
    assert_eq!(pairs(&report), vec![(Code::ShadowedByReject, 2)]);
    assert_eq!(report.findings()[0].severity, Severity::Error);
}

#[test]
fn test_redundant_is_info() {
    let rules = parse_hba(
        "host mydb app 10.0.0.5/32 scram-sha-256\nhost mydb app 10.0.0.5/32 scram-sha-256\n",
    )
    .unwrap();
    let report = check_overlaps(&rules);
    assert_eq!(pairs(&report), vec![(Code::RedundantRule, 2)]);
    assert_eq!(report.findings()[0].severity, Severity::Info);
    assert_eq!(report.findings()[0].message, "Rule is redundant due to line 1.");
}

#[test]
fn test_check_all_puts_single_rule_checks_first() {
    let rules =
        parse_hba("host all all 0.0.0.0/0 trust\nhost app app 10.0.0.5 scram-sha-256\n").unwrap();
    let report = check_all(&rules, &Settings::default(), &IdentMap::new());

    let found = pairs(&report);
    assert_eq!(
        found,
        vec![
            (Code::TrustNetwork, 1),
            (Code::NonTlsPath, 1),
            (Code::WideAddress, 1),
            (Code::AllDbAllUser, 1),
            (Code::NonTlsPath, 2),
            (Code::OverlyBroadRule, 1),
            (Code::ShadowedByBroadRule, 2),
        ]
    );
    assert!(report.has_errors());
}

#[test]
fn test_ipv6_rules_do_not_shadow_ipv4() {
    let rules = parse_hba(
        "host all all ::/0 reject\n\
         host all all 0.0.0.0/0 scram-sha-256\n\
         host all all 2001:db8::/32 scram-sha-256\n",
    )
    .unwrap();
    let report = check_overlaps(&rules);
    assert_eq!(pairs(&report), vec![(Code::ShadowedByReject, 3)]);
}
