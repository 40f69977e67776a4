pub mod loader;
pub mod locator;
pub mod reader;

pub use loader::parse_definition;
pub use locator::classify;
pub use reader::{DefaultSpecReader, SpecReader};

use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Serialization format a definition is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// Where a definition has to be loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Inline,
    File,
    Remote,
}

/// Resolved loading method for a definition reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    InlineYaml,
    InlineJson,
    FileYaml,
    FileJson,
    RemoteYaml,
    RemoteJson,
}

impl Strategy {
    pub fn new(kind: SourceKind, format: Format) -> Self {
        match (kind, format) {
            (SourceKind::Inline, Format::Yaml) => Self::InlineYaml,
            (SourceKind::Inline, Format::Json) => Self::InlineJson,
            (SourceKind::File, Format::Yaml) => Self::FileYaml,
            (SourceKind::File, Format::Json) => Self::FileJson,
            (SourceKind::Remote, Format::Yaml) => Self::RemoteYaml,
            (SourceKind::Remote, Format::Json) => Self::RemoteJson,
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::InlineYaml | Self::InlineJson => SourceKind::Inline,
            Self::FileYaml | Self::FileJson => SourceKind::File,
            Self::RemoteYaml | Self::RemoteJson => SourceKind::Remote,
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Self::InlineYaml | Self::FileYaml | Self::RemoteYaml => Format::Yaml,
            Self::InlineJson | Self::FileJson | Self::RemoteJson => Format::Json,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InlineYaml => "inline-yaml",
            Self::InlineJson => "inline-json",
            Self::FileYaml => "file-yaml",
            Self::FileJson => "file-json",
            Self::RemoteYaml => "remote-yaml",
            Self::RemoteJson => "remote-json",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the caller refers to a definition.
///
/// `Auto` hands the string to [`classify`]; the other variants are used
/// as-is when the caller already knows what kind of reference it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Auto(String),
    File(PathBuf),
    Url(Url),
    Text(String),
}

/// A definition reference together with its declared format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub source: Source,
    pub format: Format,
}

impl Definition {
    pub fn new(source: Source, format: Format) -> Self {
        Self { source, format }
    }

    /// YAML definition given as a URL, a path or the document itself
    pub fn yaml(definition: impl Into<String>) -> Self {
        Self::new(Source::Auto(definition.into()), Format::Yaml)
    }

    /// JSON definition given as a URL, a path or the document itself
    pub fn json(definition: impl Into<String>) -> Self {
        Self::new(Source::Auto(definition.into()), Format::Json)
    }

    pub fn yaml_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Source::File(path.into()), Format::Yaml)
    }

    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Source::File(path.into()), Format::Json)
    }

    pub fn yaml_url(url: Url) -> Self {
        Self::new(Source::Url(url), Format::Yaml)
    }

    pub fn json_url(url: Url) -> Self {
        Self::new(Source::Url(url), Format::Json)
    }

    pub fn yaml_text(text: impl Into<String>) -> Self {
        Self::new(Source::Text(text.into()), Format::Yaml)
    }

    pub fn json_text(text: impl Into<String>) -> Self {
        Self::new(Source::Text(text.into()), Format::Json)
    }

    /// Resolves the loading strategy, running the locator for `Auto` sources
    pub fn strategy(&self) -> Strategy {
        match &self.source {
            Source::Auto(definition) => classify(definition, self.format),
            Source::File(_) => Strategy::new(SourceKind::File, self.format),
            Source::Url(_) => Strategy::new(SourceKind::Remote, self.format),
            Source::Text(_) => Strategy::new(SourceKind::Inline, self.format),
        }
    }

    /// The raw reference string, used for cache keys and error origins
    pub fn reference(&self) -> String {
        match &self.source {
            Source::Auto(s) | Source::Text(s) => s.clone(),
            Source::File(path) => path.display().to_string(),
            Source::Url(url) => url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_round_trips_kind_and_format() {
        for kind in [SourceKind::Inline, SourceKind::File, SourceKind::Remote] {
            for format in [Format::Yaml, Format::Json] {
                let strategy = Strategy::new(kind, format);
                assert_eq!(strategy.kind(), kind);
                assert_eq!(strategy.format(), format);
            }
        }
    }

    #[test]
    fn explicit_sources_skip_classification() {
        let def = Definition::json_text("https://api.example.com/openapi.json");
        assert_eq!(def.strategy(), Strategy::InlineJson);

        let def = Definition::yaml_file("/does/not/exist.yaml");
        assert_eq!(def.strategy(), Strategy::FileYaml);
    }

    #[test]
    fn strategy_displays_kebab_case() {
        assert_eq!(Strategy::RemoteYaml.to_string(), "remote-yaml");
        assert_eq!(Strategy::FileJson.to_string(), "file-json");
    }
}
