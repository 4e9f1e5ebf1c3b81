use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::Configuration;

/// Ordered collection of configuration sections read from one source.
///
/// The format is line based: `[name]` opens a section, `key = value` adds a
/// setting, and `#` or `;` start a comment outside of quotes. Settings before
/// the first section header belong to an anonymous header section.
#[derive(Debug, Clone, Default)]
pub struct ConfigReader {
    configurations: Vec<Configuration>,
}

impl ConfigReader {
    /// Creates an empty reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads all sections from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, Some(path))
    }

    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is neither a section header nor a setting.
    pub fn parse(text: &str, path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.map_or_else(|| "<input>".to_owned(), |p| p.display().to_string());
        let section = |name: &str| match path {
            Some(p) => Configuration::with_path(name, PathBuf::from(p)),
            None => Configuration::new(name),
        };

        let mut reader = Self::new();
        let mut current = section("");
        for (index, raw) in text.lines().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            let syntax = |message: &str| ConfigError::Syntax {
                file: file.clone(),
                line: index + 1,
                message: message.to_owned(),
            };

            if let Some(header) = line.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| syntax("section header is missing ']'"))?
                    .trim();
                if name.is_empty() {
                    return Err(syntax("section name is empty"));
                }
                let finished = std::mem::replace(&mut current, section(name));
                reader.push_parsed(finished);
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| syntax("expected 'key = value'"))?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(syntax("key is empty or contains whitespace"));
            }
            current.set_text(key, value.trim());
        }
        reader.push_parsed(current);
        Ok(reader)
    }

    /// Appends a section.
    pub fn add_configuration(&mut self, configuration: Configuration) {
        self.configurations.push(configuration);
    }

    /// Returns the anonymous sections merged into one, earlier definitions
    /// taking precedence.
    #[must_use]
    pub fn header_configuration(&self) -> Configuration {
        let mut anonymous = self.configurations.iter().filter(|c| c.name().is_empty());
        let Some(first) = anonymous.next() else {
            return Configuration::new("");
        };
        let mut header = first.clone();
        for configuration in anonymous {
            header.merge(configuration);
        }
        header
    }

    /// Returns all sections in source order.
    #[must_use]
    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    /// Returns all sections with the given name (case-insensitive), in source order.
    pub fn configurations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Configuration> {
        self.configurations
            .iter()
            .filter(move |c| c.name().eq_ignore_ascii_case(name))
    }

    // The implicit header is only kept when it holds settings.
    fn push_parsed(&mut self, configuration: Configuration) {
        if !configuration.name().is_empty() || !configuration.is_empty() {
            self.configurations.push(configuration);
        }
    }
}

/// Removes a trailing `#` or `;` comment that is not inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' | ';' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}
