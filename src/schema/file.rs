use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CompileOptions, Decoded, RecordDef, Registry};
use crate::error::{DecodeError, SchemaError};

/// A schema document: the root record, compile options and the records
/// themselves.
///
/// ```toml
/// root = "Person"
///
/// [options]
/// allow_recursion = false
///
/// [records.Person]
/// fields = [
///     { name = "name", type = "string" },
///     { name = "born", type = "string", format = { time = "%%%%-%%-%%" } },
///     { name = "tags", type = { list = "string" } },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFile {
    pub root: String,
    #[serde(default)]
    pub options: CompileOptions,
    #[serde(default)]
    pub records: BTreeMap<String, RecordDef>,
}

impl SchemaFile {
    /// Read a schema from disk. Files ending in `.json` are parsed as JSON,
    /// anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file: {path:?}"))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        };
        file.with_context(|| format!("Invalid schema file: {path:?}"))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: Self = toml::from_str(text).context("Failed to parse schema TOML")?;
        file.validate().context("Malformed schema descriptor")?;
        Ok(file)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: Self = serde_json::from_str(text).context("Failed to parse schema JSON")?;
        file.validate().context("Malformed schema descriptor")?;
        Ok(file)
    }

    /// Field-level checks that serde cannot express.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for def in self.records.values() {
            for field in &def.fields {
                field.check_format()?;
            }
        }
        Ok(())
    }

    pub fn registry(&self) -> Registry {
        let mut registry = Registry::new();
        for (name, def) in &self.records {
            registry.insert(name.clone(), def.clone());
        }
        registry
    }

    /// Compile the root record. Returns the start rule id and grammar text.
    pub fn compile(&self) -> Result<(String, String), SchemaError> {
        super::compile(&self.registry(), &self.root, &self.options)
    }

    pub fn decode(&self, value: &Value) -> Result<Decoded, DecodeError> {
        super::decode(&self.registry(), &self.root, value, &self.options)
    }
}
