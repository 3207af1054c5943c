//! pg_ident.conf map names

use crate::error::{LintError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Names of the user maps defined in pg_ident.conf.
/// Only map existence matters to the checks, so the mapping columns are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentMap {
    maps: HashSet<String>,
}

impl IdentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect map names from lines with a map, system user and database user column
    pub fn parse(input: &str) -> Self {
        let maps = input
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default())
            .filter_map(|line| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                (fields.len() >= 3).then(|| fields[0].to_ascii_lowercase())
            })
            .collect();
        Self { maps }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| LintError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&contents))
    }

    /// Case-insensitive membership; an empty name is never present
    pub fn contains(&self, name: &str) -> bool {
        !name.is_empty() && self.maps.contains(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IdentMap {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            maps: iter
                .into_iter()
                .map(|name| name.into().to_ascii_lowercase())
                .collect(),
        }
    }
}
