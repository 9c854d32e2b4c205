use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Arguments a translator entry was last built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorArgs {
    pub model: String,
    pub schema: String,
    pub type_name: String,
}

impl TranslatorArgs {
    /// Whether the model handle must be rebuilt relative to `previous`
    pub fn model_changed(&self, previous: Option<&Self>) -> bool {
        previous.is_none_or(|p| p.model != self.model)
    }

    /// Whether the translator handle must be rebuilt relative to `previous`
    pub fn schema_changed(&self, previous: Option<&Self>) -> bool {
        previous.is_none_or(|p| p.schema != self.schema || p.type_name != self.type_name)
    }
}

/// Partial update of a translator's arguments.
///
/// `Some` always wins over the stored value, including `Some("")`; only
/// `None` falls back to what the entry recorded last time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "type_name")]
    pub type_name: Option<String>,
}

impl TranslatorPatch {
    pub fn new(
        model: impl Into<String>,
        schema: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            model: Some(model.into()),
            schema: Some(schema.into()),
            type_name: Some(type_name.into()),
        }
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub const fn is_empty(&self) -> bool {
        self.model.is_none() && self.schema.is_none() && self.type_name.is_none()
    }

    /// Merge onto `previous`, failing on the first field that is still absent.
    pub fn merge(self, previous: Option<&TranslatorArgs>) -> Result<TranslatorArgs> {
        let model = self
            .model
            .or_else(|| previous.map(|p| p.model.clone()))
            .ok_or(Error::MissingConfig("model"))?;
        let schema = self
            .schema
            .or_else(|| previous.map(|p| p.schema.clone()))
            .ok_or(Error::MissingConfig("schema"))?;
        let type_name = self
            .type_name
            .or_else(|| previous.map(|p| p.type_name.clone()))
            .ok_or(Error::MissingConfig("typeName"))?;

        Ok(TranslatorArgs {
            model,
            schema,
            type_name,
        })
    }
}
