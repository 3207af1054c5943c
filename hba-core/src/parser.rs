//! pg_hba.conf line parser
//!
//! This is a fast reader for static analysis, not a reimplementation of the
//! server's parser: it understands the column layout, comma lists, address
//! forms and `key=value` options, and rejects lines it cannot place.

use crate::address::AddressSet;
use crate::error::{AddressError, ParseError};
use crate::rule::{AuthOptions, ConnectionKind, Rule, TokenList};
use std::io::BufRead;
use std::net::IpAddr;
use tracing::trace;

/// Parse pg_hba text into rules, in file order
pub fn parse_hba(input: &str) -> Result<Vec<Rule>, ParseError> {
    let mut rules = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        if let Some(rule) = parse_line(idx + 1, raw)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// Parse pg_hba content from a reader
pub fn parse_hba_reader<R: BufRead>(reader: R) -> Result<Vec<Rule>, ParseError> {
    let mut rules = Vec::new();
    for (idx, raw) in reader.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.map_err(|source| ParseError::Read { line, source })?;
        if let Some(rule) = parse_line(line, &raw)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// Parse one physical line; comments and blank lines yield None
pub fn parse_line(line: usize, raw: &str) -> Result<Option<Rule>, ParseError> {
    let content = strip_comment(raw);
    let fields: Vec<&str> = content.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }
    if fields.len() < 4 {
        return Err(ParseError::NotEnoughFields { line });
    }

    let kind = ConnectionKind::parse(fields[0]).ok_or_else(|| ParseError::UnknownConnectionType {
        line,
        kind: fields[0].to_string(),
    })?;
    let databases = TokenList::parse(fields[1]);
    let users = TokenList::parse(fields[2]);

    let mut idx = 3;
    let address = if kind.is_host() {
        if fields.len() < idx + 2 {
            return Err(ParseError::MissingAddress { line });
        }
        let (address, consumed) = parse_address(&fields[idx..])
            .map_err(|source| ParseError::Address { line, source })?;
        idx += consumed;
        if idx >= fields.len() {
            return Err(ParseError::MissingAddress { line });
        }
        address
    } else {
        AddressSet::local()
    };

    let method = fields[idx].to_ascii_lowercase();
    let options = parse_options(&fields[idx + 1..]);

    trace!(line, %kind, %method, "parsed rule");

    Ok(Some(Rule {
        line,
        kind,
        databases,
        users,
        address,
        method,
        options,
        raw: raw.to_string(),
    }))
}

/// Parse the address column, returning how many fields it used.
/// A bare IP followed by another IP is read as `address netmask`.
fn parse_address(fields: &[&str]) -> Result<(AddressSet, usize), AddressError> {
    let token = fields[0];
    if !token.contains('/') && token.parse::<IpAddr>().is_ok() {
        if let Some(mask) = fields.get(1).filter(|m| m.parse::<IpAddr>().is_ok()) {
            return Ok((AddressSet::with_netmask(token, mask)?, 2));
        }
    }
    Ok((AddressSet::parse(token)?, 1))
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Collect `key=value` options; bare words and empty keys or values are skipped
fn parse_options(parts: &[&str]) -> AuthOptions {
    let mut options = AuthOptions::new();
    for part in parts {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        options.insert(key, value.to_string());
    }
    options
}
