//! Normalized pg_hba rule model

use crate::address::AddressSet;
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// Wildcard token accepted in database and user fields
pub const ALL: &str = "all";

/// Connection type column of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    Local,
    Host,
    HostSsl,
    HostNoSsl,
    HostGssEnc,
    HostNoGssEnc,
}

impl ConnectionKind {
    /// Parse the connection type keyword (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Some(ConnectionKind::Local),
            "host" => Some(ConnectionKind::Host),
            "hostssl" => Some(ConnectionKind::HostSsl),
            "hostnossl" => Some(ConnectionKind::HostNoSsl),
            "hostgssenc" => Some(ConnectionKind::HostGssEnc),
            "hostnogssenc" => Some(ConnectionKind::HostNoGssEnc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Local => "local",
            ConnectionKind::Host => "host",
            ConnectionKind::HostSsl => "hostssl",
            ConnectionKind::HostNoSsl => "hostnossl",
            ConnectionKind::HostGssEnc => "hostgssenc",
            ConnectionKind::HostNoGssEnc => "hostnogssenc",
        }
    }

    /// Any TCP/IP connection type
    pub fn is_host(&self) -> bool {
        !matches!(self, ConnectionKind::Local)
    }

    /// Whether a connection could be routed to rules of both kinds.
    /// Plain `host` matches every TCP/IP connection, so it is compatible
    /// with every host kind; specific host kinds only match themselves.
    pub fn compatible_with(&self, other: ConnectionKind) -> bool {
        if *self == other {
            return true;
        }
        (*self == ConnectionKind::Host && other.is_host())
            || (other == ConnectionKind::Host && self.is_host())
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased database or user names of one rule, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList(IndexSet<String>);

impl TokenList {
    /// Split a comma-separated field, lowercasing and dropping empty elements
    pub fn parse(field: &str) -> Self {
        field
            .split(',')
            .map(|part| part.trim().to_ascii_lowercase())
            .filter(|part| !part.is_empty())
            .collect()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn has_all(&self) -> bool {
        self.contains(ALL)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every name matched by `other` is matched by `self`
    pub fn covers(&self, other: &TokenList) -> bool {
        if self.has_all() {
            return true;
        }
        if other.has_all() {
            return false;
        }
        other.iter().all(|token| self.contains(token))
    }

    /// Some name is matched by both lists
    pub fn intersects(&self, other: &TokenList) -> bool {
        if self.has_all() || other.has_all() {
            return true;
        }
        self.iter().any(|token| other.contains(token))
    }
}

impl<S: Into<String>> FromIterator<S> for TokenList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for TokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

/// Auth-method options (`key=value`), compared as an unordered map
pub type AuthOptions = IndexMap<String, String>;

/// One pg_hba line after parsing
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// 1-based line in the source file
    pub line: usize,
    pub kind: ConnectionKind,
    pub databases: TokenList,
    pub users: TokenList,
    /// Always-matching placeholder for `local` rules
    pub address: AddressSet,
    /// Lowercased auth method
    pub method: String,
    pub options: AuthOptions,
    /// Source text of the line, for diagnostics
    pub raw: String,
}

impl Rule {
    pub fn is_local(&self) -> bool {
        self.kind == ConnectionKind::Local
    }

    pub fn is_host(&self) -> bool {
        self.kind.is_host()
    }

    pub fn has_database(&self, token: &str) -> bool {
        self.databases.contains(token)
    }

    pub fn has_user(&self, token: &str) -> bool {
        self.users.contains(token)
    }

    /// Option value, absent keys read as None
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

/// Every option required by `earlier` is present with the same value in `later`
pub fn options_not_stricter(earlier: &AuthOptions, later: &AuthOptions) -> bool {
    earlier
        .iter()
        .all(|(key, value)| later.get(key) == Some(value))
}
