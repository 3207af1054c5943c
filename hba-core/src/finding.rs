//! Findings and the ordered report they are collected into

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable machine identifier of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    // Single-rule checks
    TrustNetwork,
    PasswordWithTls,
    PasswordNoTls,
    PasswordNoSsl,
    NonTlsPath,
    HostsslNoSsl,
    Md5Deprecated,
    WideAddress,
    AllDbAllUser,
    ReplicationWideAccess,
    IdentNoMap,
    IdentMapMissing,
    PeerNonLocal,
    LocalAllAll,
    ClientcertNonHostssl,
    ClientcertInvalid,

    // Rule ordering
    PartialOverlap,
    ShadowedByReject,
    ShadowedByHost,
    OverlyBroadRule,
    ShadowedByBroadRule,
    RedundantRule,
    ShadowedRule,
}

impl Code {
    pub const ALL: [Code; 23] = [
        Code::TrustNetwork,
        Code::PasswordWithTls,
        Code::PasswordNoTls,
        Code::PasswordNoSsl,
        Code::NonTlsPath,
        Code::HostsslNoSsl,
        Code::Md5Deprecated,
        Code::WideAddress,
        Code::AllDbAllUser,
        Code::ReplicationWideAccess,
        Code::IdentNoMap,
        Code::IdentMapMissing,
        Code::PeerNonLocal,
        Code::LocalAllAll,
        Code::ClientcertNonHostssl,
        Code::ClientcertInvalid,
        Code::PartialOverlap,
        Code::ShadowedByReject,
        Code::ShadowedByHost,
        Code::OverlyBroadRule,
        Code::ShadowedByBroadRule,
        Code::RedundantRule,
        Code::ShadowedRule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Code::TrustNetwork => "trustNetwork",
            Code::PasswordWithTls => "passwordWithTLS",
            Code::PasswordNoTls => "passwordNoTLS",
            Code::PasswordNoSsl => "passwordNoSSL",
            Code::NonTlsPath => "nonTLSPath",
            Code::HostsslNoSsl => "hostsslNoSSL",
            Code::Md5Deprecated => "md5Deprecated",
            Code::WideAddress => "wideAddress",
            Code::AllDbAllUser => "allDbAllUser",
            Code::ReplicationWideAccess => "replicationWideAccess",
            Code::IdentNoMap => "identNoMap",
            Code::IdentMapMissing => "identMapMissing",
            Code::PeerNonLocal => "peerNonLocal",
            Code::LocalAllAll => "localAllAll",
            Code::ClientcertNonHostssl => "clientcertNonHostssl",
            Code::ClientcertInvalid => "clientcertInvalid",
            Code::PartialOverlap => "partialOverlap",
            Code::ShadowedByReject => "shadowedByReject",
            Code::ShadowedByHost => "shadowedByHost",
            Code::OverlyBroadRule => "overlyBroadRule",
            Code::ShadowedByBroadRule => "shadowedByBroadRule",
            Code::RedundantRule => "redundantRule",
            Code::ShadowedRule => "shadowedRule",
        }
    }

    /// Look up a code by its identifier
    pub fn parse(s: &str) -> Option<Code> {
        Code::ALL.iter().copied().find(|code| code.as_str() == s)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported issue, attached to a rule line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub code: Code,
    pub line: usize,
    pub message: String,
}

impl Finding {
    pub fn new(severity: Severity, code: Code, line: usize, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            line,
            message: message.into(),
        }
    }

    pub fn error(code: Code, line: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, line, message)
    }

    pub fn warning(code: Code, line: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, line, message)
    }

    pub fn info(code: Code, line: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, line, message)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} line={} {}", self.severity, self.code, self.line, self.message)
    }
}

/// Append-only list of findings, kept in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    findings: Vec<Finding>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, other: Report) {
        self.findings.extend(other.findings);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.findings.iter()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn has_code(&self, code: Code) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }

    /// Drop findings whose code is listed, keeping the order of the rest
    pub fn without_codes(self, disabled: &[Code]) -> Report {
        Report {
            findings: self
                .findings
                .into_iter()
                .filter(|f| !disabled.contains(&f.code))
                .collect(),
        }
    }
}

impl From<Vec<Finding>> for Report {
    fn from(findings: Vec<Finding>) -> Self {
        Self { findings }
    }
}

impl IntoIterator for Report {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.into_iter()
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}
