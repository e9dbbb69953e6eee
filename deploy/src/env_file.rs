use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use indexmap::IndexMap;

const HEADER: &str = "\
# ================================================
# ONECLICK COPY TRADING - ENVIRONMENT VARIABLES
# ================================================

";

/// `KEY=VALUE` pairs read from an env file, kept in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMap {
    vars: IndexMap<String, String>,
}

impl EnvMap {
    /// Reads `path`. A missing file is an empty map, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("env file {} not found, starting empty", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// Blank lines, `#` comments and lines without `=` are skipped. Only the
    /// first `=` separates key from value; no quoting is interpreted.
    pub fn parse(text: &str) -> Self {
        let mut env = Self::default();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                env.set(key.trim(), value);
            }
        }
        env
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`EnvMap::get`] but treats an empty value as unset.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    /// Overwrites in place; a new key is appended.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Copies every key in `keys` that is set in the process environment
    /// over the file value.
    pub fn overlay_process_env(&mut self, keys: &[&str]) {
        for key in keys {
            if let Ok(value) = std::env::var(key) {
                self.set(*key, value);
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from(HEADER);
        for (key, value) in self.iter() {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Replaces the whole file with the header and one line per key.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
