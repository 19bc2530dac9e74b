//! The policy file.

use camino::Utf8Path;

use crate::error::PolicyError;
use crate::model::Document;

pub mod v1;

/// A policy file, tagged by schema version so a future format change can
/// add a variant without breaking files written by an older binary.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case", tag = "version")]
pub enum Spec {
    V1(v1::Spec),
}

impl Spec {
    pub fn parse(self) -> Document {
        match self {
            Spec::V1(spec) => spec.parse(),
        }
    }

    pub fn build(doc: &Document) -> Self {
        Spec::V1(v1::Spec::build(doc))
    }

    pub fn load(path: &Utf8Path) -> Result<Self, PolicyError> {
        let text = std::fs::read_to_string(path).map_err(|err| PolicyError::Load {
            message: format!("reading {path}: {err}"),
        })?;
        toml::from_str(&text).map_err(|err| PolicyError::Load {
            message: format!("parsing {path}: {err}"),
        })
    }

    pub fn save(&self, path: &Utf8Path) -> Result<(), PolicyError> {
        let text = toml::to_string_pretty(self).map_err(|err| PolicyError::Save {
            message: format!("serializing policy document: {err}"),
        })?;
        crate::util::write_file(path, text.as_bytes())
            .map_err(|err| PolicyError::Save { message: format!("writing {path}: {err}") })
    }
}
