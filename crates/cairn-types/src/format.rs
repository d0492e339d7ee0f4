use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// File format of a persisted metadata document.
///
/// This is the closed set of formats Cairn can write. Reading also accepts
/// arbitrary files as plain text, but that is a store concern and never a
/// valid choice for an entity's own `meta.<ext>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MetaFormat {
    #[default]
    Json,
    /// YAML under the short `.yml` extension.
    Yml,
    /// YAML under the long `.yaml` extension.
    Yaml,
}

impl MetaFormat {
    pub const ALL: [MetaFormat; 3] = [MetaFormat::Json, MetaFormat::Yml, MetaFormat::Yaml];

    /// Extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            MetaFormat::Json => "json",
            MetaFormat::Yml => "yml",
            MetaFormat::Yaml => "yaml",
        }
    }

    /// Whether the format is one of the YAML spellings.
    pub fn is_yaml(&self) -> bool {
        matches!(self, MetaFormat::Yml | MetaFormat::Yaml)
    }

    /// Name of the metadata file for an entity stored in this format.
    pub fn meta_file_name(&self) -> String {
        self.file_name("meta")
    }

    /// `<stem>.<ext>`.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }

    /// Format of a path, judged by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for MetaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for MetaFormat {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('.').unwrap_or(s) {
            "json" => Ok(MetaFormat::Json),
            "yml" => Ok(MetaFormat::Yml),
            "yaml" => Ok(MetaFormat::Yaml),
            _ => Err(TypeError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl From<MetaFormat> for String {
    fn from(f: MetaFormat) -> Self {
        f.extension().to_string()
    }
}

impl TryFrom<String> for MetaFormat {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_dot() {
        assert_eq!(".json".parse::<MetaFormat>().unwrap(), MetaFormat::Json);
        assert_eq!("yml".parse::<MetaFormat>().unwrap(), MetaFormat::Yml);
        assert_eq!(".yaml".parse::<MetaFormat>().unwrap(), MetaFormat::Yaml);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert_eq!(
            ".toml".parse::<MetaFormat>(),
            Err(TypeError::UnsupportedFormat(".toml".into()))
        );
    }

    #[test]
    fn meta_file_names() {
        assert_eq!(MetaFormat::Json.meta_file_name(), "meta.json");
        assert_eq!(MetaFormat::Yml.meta_file_name(), "meta.yml");
        assert_eq!(MetaFormat::Yaml.file_name("history"), "history.yaml");
    }

    #[test]
    fn from_path_reads_extension() {
        assert_eq!(MetaFormat::from_path(Path::new("a/meta.yml")), Some(MetaFormat::Yml));
        assert_eq!(MetaFormat::from_path(Path::new("a/meta.txt")), None);
        assert_eq!(MetaFormat::from_path(Path::new("a/meta")), None);
    }
}
