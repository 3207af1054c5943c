//! Single-rule checks
//!
//! Each rule is judged on its own against the server settings; rule order
//! does not matter here.

use crate::config::Settings;
use crate::finding::{Code, Finding, Report};
use crate::ident::IdentMap;
use crate::rule::{ConnectionKind, Rule, ALL};

/// Run every single-rule check, in rule order
pub fn check_rules(rules: &[Rule], settings: &Settings, ident: &IdentMap) -> Report {
    let mut report = Report::new();
    for rule in rules {
        check_rule(rule, settings, ident, &mut report);
    }
    report
}

fn check_rule(rule: &Rule, settings: &Settings, ident: &IdentMap, report: &mut Report) {
    let line = rule.line;
    let wide = rule
        .address
        .is_wide(settings.wide_v4_prefix, settings.wide_v6_prefix);

    if rule.is_host() && rule.method == "trust" {
        report.push(Finding::error(
            Code::TrustNetwork,
            line,
            "Unsafe: trust for network connections. Any client can log in as any user without a password.",
        ));
    }

    if rule.method == "password" {
        report.push(match (settings.ssl_enabled, rule.kind) {
            (true, ConnectionKind::HostSsl) => Finding::warning(
                Code::PasswordWithTls,
                line,
                "Password method sends cleartext password. Use scram-sha-256 or stronger.",
            ),
            (true, _) => Finding::error(
                Code::PasswordNoTls,
                line,
                "Unsafe: password method without guaranteed TLS. Use hostssl + scram-sha-256.",
            ),
            (false, _) => Finding::error(
                Code::PasswordNoSsl,
                line,
                "SSL is off; method=password always sends credentials in cleartext.",
            ),
        });
    }

    if settings.ssl_enabled {
        if matches!(rule.kind, ConnectionKind::Host | ConnectionKind::HostNoSsl)
            && !rule.address.is_loopback_only()
        {
            report.push(Finding::warning(
                Code::NonTlsPath,
                line,
                "Non-TLS path exists (host/hostnossl). If TLS is required, switch to hostssl.",
            ));
        }
    } else if rule.kind == ConnectionKind::HostSsl {
        report.push(Finding::error(
            Code::HostsslNoSsl,
            line,
            "Server ssl=off: hostssl rule will never match. Enable ssl or change to host with proper security.",
        ));
    }

    if rule.method == "md5" {
        report.push(Finding::warning(
            Code::Md5Deprecated,
            line,
            "MD5 auth is deprecated. Migrate to scram-sha-256.",
        ));
    }

    if rule.is_host() && wide {
        report.push(Finding::warning(
            Code::WideAddress,
            line,
            format!("Address range is too wide: {}.", rule.address),
        ));
    }

    if rule.databases.has_all() && rule.users.has_all() {
        report.push(Finding::warning(
            Code::AllDbAllUser,
            line,
            "Overly broad access: database=all and user=all.",
        ));
    }

    if rule.has_database("replication") && rule.method != "reject" && (wide || rule.has_user(ALL)) {
        report.push(Finding::error(
            Code::ReplicationWideAccess,
            line,
            "Replication access from wide network or all users. Restrict to replica IPs and dedicated user.",
        ));
    }

    if rule.method == "ident" {
        match rule.option("map") {
            None => report.push(Finding::warning(
                Code::IdentNoMap,
                line,
                "Ident used without map=. Add a map and ensure pg_ident entries exist.",
            )),
            Some(name) if !ident.contains(name) => report.push(Finding::error(
                Code::IdentMapMissing,
                line,
                "Ident map is missing in pg_ident.",
            )),
            Some(_) => {}
        }
    }

    if rule.method == "peer" && !rule.is_local() {
        report.push(Finding::error(
            Code::PeerNonLocal,
            line,
            "Peer auth is valid only for local connections.",
        ));
    }

    if rule.is_local()
        && (rule.method == "trust" || rule.method == "peer")
        && rule.databases.has_all()
        && rule.users.has_all()
    {
        report.push(Finding::warning(
            Code::LocalAllAll,
            line,
            "Local all/all with trust or peer is overly broad.",
        ));
    }

    if let Some(value) = rule.option("clientcert") {
        if rule.kind != ConnectionKind::HostSsl {
            report.push(Finding::error(
                Code::ClientcertNonHostssl,
                line,
                "clientcert is allowed only for hostssl.",
            ));
        } else {
            let value = value.to_ascii_lowercase();
            if value != "verify-ca" && value != "verify-full" {
                report.push(Finding::error(
                    Code::ClientcertInvalid,
                    line,
                    "clientcert must be verify-ca or verify-full.",
                ));
            }
        }
    }
}
