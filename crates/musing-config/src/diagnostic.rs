// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction failures into miette diagnostics.
//!
//! Unknown sections and keys are checked against [`CONFIG_KEYS`]: a typo
//! gets a Jaro-Winkler suggestion, and a key that is valid but sits in the
//! wrong table (`redis_url` under `[server]`) points at the table it belongs
//! to. Every field of the model has a default, so a missing key is never an
//! error here.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::model::{CONFIG_KEYS, section_keys};

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Source name used for configuration passed in as a string.
pub const INLINE_SOURCE: &str = "<inline>";

/// A configuration problem, rendered through miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A top-level table musing does not know.
    #[error("unknown configuration section `[{section}]`")]
    #[diagnostic(
        code(musing::config::unknown_section),
        help("{}", section_help(suggestion.as_deref()))
    )]
    UnknownSection {
        section: String,
        suggestion: Option<String>,
        #[label("not a musing section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A key its section does not accept.
    #[error("unknown key `{key}` in `[{section}]`")]
    #[diagnostic(
        code(musing::config::unknown_key),
        help("{}", key_help(section, suggestion.as_deref(), home_section.as_deref()))
    )]
    UnknownKey {
        section: String,
        key: String,
        /// Closest key of the same section.
        suggestion: Option<String>,
        /// The section that does accept `key`, if any.
        home_section: Option<String>,
        #[label("not recognized here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong type, or an unknown enum name such as a backend.
    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(
        code(musing::config::invalid_value),
        help("{}", value_help(expected, suggestion.as_deref()))
    )]
    InvalidValue {
        /// Dotted path, e.g. `store.backend`.
        key: String,
        detail: String,
        expected: String,
        suggestion: Option<String>,
        #[label("here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that parsed but breaks a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(musing::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(musing::config::other))]
    Other(String),
}

fn section_help(suggestion: Option<&str>) -> String {
    let sections = CONFIG_KEYS
        .iter()
        .map(|(name, _)| format!("[{name}]"))
        .collect::<Vec<_>>()
        .join(", ");
    match suggestion {
        Some(s) => format!("did you mean `[{s}]`? Sections: {sections}"),
        None => format!("sections: {sections}"),
    }
}

fn key_help(section: &str, suggestion: Option<&str>, home_section: Option<&str>) -> String {
    if let Some(home) = home_section {
        return format!("`{section}` does not take this key; move it under `[{home}]`");
    }
    let accepted = section_keys(section).unwrap_or_default().join(", ");
    match suggestion {
        Some(s) => format!("did you mean `{s}`? `[{section}]` accepts: {accepted}"),
        None => format!("`[{section}]` accepts: {accepted}"),
    }
}

fn value_help(expected: &str, suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Expected {expected}"),
        None => format!("expected {expected}"),
    }
}

/// Converts every error inside a `figment::Error` into a [`ConfigError`].
///
/// `sources` pairs a file path (or [`INLINE_SOURCE`]) with its contents and
/// is used to attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| classify(&error, sources))
        .collect()
}

fn classify(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    let source = source_of(error, sources);

    match &error.kind {
        Kind::UnknownField(field, _) => match error.path.first() {
            None => {
                let (span, src) = spanned(source, |c| header_offset(c, field), field.len() + 2);
                ConfigError::UnknownSection {
                    section: field.clone(),
                    suggestion: closest(field, CONFIG_KEYS.iter().map(|(name, _)| *name)),
                    span,
                    src,
                }
            }
            Some(section) => {
                let (span, src) = spanned(source, |c| key_offset(c, section, field), field.len());
                ConfigError::UnknownKey {
                    section: section.clone(),
                    key: field.clone(),
                    suggestion: section_keys(section)
                        .and_then(|keys| closest(field, keys.iter().copied())),
                    home_section: home_section(field, section),
                    span,
                    src,
                }
            }
        },
        Kind::InvalidType(actual, expected) | Kind::InvalidValue(actual, expected) => {
            invalid_value(error, source, format!("found {actual}"), expected.clone(), None)
        }
        Kind::UnknownVariant(actual, variants) => invalid_value(
            error,
            source,
            format!("unknown variant `{actual}`"),
            format!("one of {}", variants.join(", ")),
            closest(actual, variants.iter().copied()),
        ),
        _ => ConfigError::Other(error.to_string()),
    }
}

fn invalid_value(
    error: &figment::Error,
    source: Option<(&str, &str)>,
    detail: String,
    expected: String,
    suggestion: Option<String>,
) -> ConfigError {
    let (span, src) = match error.path.as_slice() {
        [section, key] => spanned(source, |c| key_offset(c, section, key), key.len()),
        _ => (None, None),
    };
    ConfigError::InvalidValue {
        key: error.path.join("."),
        detail,
        expected,
        suggestion,
        span,
        src,
    }
}

/// Finds the file (or inline string) an error's value was read from.
fn source_of<'a>(
    error: &figment::Error,
    sources: &'a [(String, String)],
) -> Option<(&'a str, &'a str)> {
    let metadata = error.metadata.as_ref()?;
    let wanted = match &metadata.source {
        Some(figment::Source::File(path)) => path.display().to_string(),
        None if metadata.name.ends_with("source string") => INLINE_SOURCE.to_string(),
        _ => return None,
    };
    sources
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(name, content)| (name.as_str(), content.as_str()))
}

fn spanned(
    source: Option<(&str, &str)>,
    find: impl FnOnce(&str) -> Option<usize>,
    len: usize,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some((name, content)) = source else {
        return (None, None);
    };
    match find(content) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), len)),
            Some(NamedSource::new(name, content.to_string())),
        ),
        None => (None, None),
    }
}

/// Section that accepts `key`, when it is not `current`.
fn home_section(key: &str, current: &str) -> Option<String> {
    CONFIG_KEYS
        .iter()
        .find(|(name, keys)| *name != current && keys.contains(&key))
        .map(|(name, _)| (*name).to_string())
}

/// Best candidate above [`SUGGESTION_THRESHOLD`].
pub fn closest<'a>(unknown: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .map(|candidate| (strsim::jaro_winkler(unknown, candidate), candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Name of the `[table]` a line opens, if it is a header.
fn table_header(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

/// Byte offset of the `[section]` header.
fn header_offset(content: &str, section: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if table_header(line) == Some(section) {
            return Some(offset + line.find('[').unwrap_or(0));
        }
        offset += line.len();
    }
    None
}

/// Byte offset of `key = ...` inside `[section]`.
///
/// Only lines between the section header and the next header are searched,
/// so a key of the same name in another table is never matched.
fn key_offset(content: &str, section: &str, key: &str) -> Option<usize> {
    let mut offset = 0;
    let mut in_section = false;
    for line in content.split_inclusive('\n') {
        if let Some(header) = table_header(line) {
            in_section = header == section;
        } else if in_section {
            let indent = line.len() - line.trim_start().len();
            let assigns = line[indent..]
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if assigns {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Renders each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
