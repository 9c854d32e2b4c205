mod args;
mod status;

pub use args::{TranslatorArgs, TranslatorPatch};
pub use status::{with_tips, EntryState, Status, API_KEY_URL};

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::model::{create_model_provider, LanguageModel, ModelEnv, ModelProvider};
use crate::translator::{
    create_translator_provider, JsonTranslator, TranslationOutcome, TranslatorProvider,
};

/// Cached state for one translator id.
///
/// Handles are replaced wholesale, never mutated. A translator is only ever
/// stored next to the model it was built from.
#[derive(Clone, Default)]
struct TranslatorEntry {
    model: Option<Arc<dyn LanguageModel>>,
    translator: Option<Arc<dyn JsonTranslator>>,
    args: Option<TranslatorArgs>,
}

impl TranslatorEntry {
    const fn state(&self, has_key: bool) -> EntryState {
        if !has_key {
            EntryState::NoKey
        } else if self.model.is_none() {
            EntryState::NoModel
        } else if self.translator.is_none() {
            EntryState::NoTranslator
        } else {
            EntryState::Ready
        }
    }
}

/// Public view of one translator id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatorDescriptor {
    pub id: String,
    pub args: Option<TranslatorArgs>,
    pub state: EntryState,
}

/// Memoizes model and translator handles per translator id.
///
/// The model handle is rebuilt only when the model name changes; the
/// translator handle only when the model, schema or type name changes.
/// Replacing the API key drops every entry.
///
/// Locks are never held across provider calls. Two concurrent `configure`
/// calls for the same id may both rebuild; the later write wins. A
/// `configure` that overlaps a key change stores nothing.
pub struct TranslatorCache {
    models: Arc<dyn ModelProvider>,
    translators: Arc<dyn TranslatorProvider>,
    api_key: RwLock<Option<String>>,
    /// Bumped on every key change, only while both locks are held
    key_generation: AtomicU64,
    entries: RwLock<HashMap<String, TranslatorEntry>>,
    status: watch::Sender<Status>,
}

impl TranslatorCache {
    /// Create an empty cache with no API key
    pub fn new(models: Arc<dyn ModelProvider>, translators: Arc<dyn TranslatorProvider>) -> Self {
        Self::with_api_key(models, translators, None)
    }

    /// Create an empty cache, optionally starting with an API key
    pub fn with_api_key(
        models: Arc<dyn ModelProvider>,
        translators: Arc<dyn TranslatorProvider>,
        api_key: Option<String>,
    ) -> Self {
        let api_key = normalize_key(api_key);
        let (status, _) = watch::channel(Status::from_key_present(api_key.is_some()));

        Self {
            models,
            translators,
            api_key: RwLock::new(api_key),
            key_generation: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
            status,
        }
    }

    /// Create a cache backed by the default OpenAI and schema providers
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_api_key(
            create_model_provider(&config.model),
            create_translator_provider(&config.translator),
            config.api_key.clone(),
        )
    }

    /// Replace the global API key and drop every cached translator.
    ///
    /// Empty or whitespace-only keys count as no key. Subscribers are
    /// notified even when readiness did not change.
    pub async fn set_api_key(&self, key: Option<String>) {
        let key = normalize_key(key);
        let status = Status::from_key_present(key.is_some());

        let cleared = {
            let mut api_key = self.api_key.write().await;
            *api_key = key;
            let mut entries = self.entries.write().await;
            let cleared = entries.len();
            entries.clear();
            self.key_generation.fetch_add(1, Ordering::SeqCst);
            cleared
        };

        info!("API key updated, cleared {} cached translators", cleared);
        self.status.send_replace(status);
    }

    /// Readiness of the service
    pub fn status(&self) -> Status {
        *self.status.borrow()
    }

    /// Observe readiness changes
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    /// Borrow a named translator
    pub fn translator(&self, id: impl Into<String>) -> TranslatorRef<'_> {
        TranslatorRef {
            id: id.into(),
            cache: self,
        }
    }

    /// Ids with cached state, sorted
    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.entries.read().await.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Describe the current state of a translator id
    pub async fn describe(&self, id: &str) -> TranslatorDescriptor {
        let has_key = self.api_key.read().await.is_some();
        let entries = self.entries.read().await;
        let entry = entries.get(id);

        TranslatorDescriptor {
            id: id.to_string(),
            args: entry.and_then(|e| e.args.clone()),
            state: entry.map_or_else(
                || TranslatorEntry::default().state(has_key),
                |e| e.state(has_key),
            ),
        }
    }

    /// Merge `patch` onto the stored arguments and rebuild what changed.
    ///
    /// Nothing is stored unless every step succeeds.
    pub async fn configure(&self, id: &str, patch: TranslatorPatch) -> Result<TranslatorDescriptor> {
        let mut entry = self
            .entries
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default();

        let previous = entry.args.take();
        let args = patch.merge(previous.as_ref())?;
        let (api_key, generation) = {
            let api_key = self.api_key.read().await;
            let generation = self.key_generation.load(Ordering::SeqCst);
            (api_key.clone().ok_or(Error::MissingApiKey)?, generation)
        };

        let model = match entry.model.take() {
            Some(model) if !args.model_changed(previous.as_ref()) => model,
            _ => {
                info!("Model changed for {}", id);
                entry.translator = None;
                let env = ModelEnv {
                    api_key,
                    model: args.model.clone(),
                };
                self.models.create(&env).await?
            }
        };

        let translator = match entry.translator.take() {
            Some(translator) if !args.schema_changed(previous.as_ref()) => translator,
            _ => {
                info!("Schema changed for {}", id);
                self.translators
                    .create(Arc::clone(&model), &args.schema, &args.type_name)
                    .await?
            }
        };

        let descriptor = TranslatorDescriptor {
            id: id.to_string(),
            args: Some(args.clone()),
            state: EntryState::Ready,
        };

        let mut entries = self.entries.write().await;
        if self.key_generation.load(Ordering::SeqCst) != generation {
            warn!("API key changed while configuring {}, discarding", id);
            return Err(Error::MissingApiKey);
        }
        entries.insert(
            id.to_string(),
            TranslatorEntry {
                model: Some(model),
                translator: Some(translator),
                args: Some(args),
            },
        );

        Ok(descriptor)
    }

    /// Translate `prompt` with a configured translator.
    ///
    /// Unsuccessful outcomes become [`Error::TranslationFailed`], with tips
    /// appended for failures we recognise.
    pub async fn translate(&self, id: &str, prompt: &str) -> Result<Value> {
        let translator = self
            .entries
            .read()
            .await
            .get(id)
            .and_then(|e| e.translator.clone())
            .ok_or_else(|| Error::NotConfigured(id.to_string()))?;

        debug!("Translating with {} ({})", id, translator.type_name());

        match translator.translate(prompt).await? {
            TranslationOutcome::Success(value) => Ok(value),
            TranslationOutcome::Failure { message } => {
                let message = with_tips(&message);
                warn!("{}", message);
                Err(Error::TranslationFailed(message))
            }
        }
    }

    /// Configure, then translate. An empty patch skips configuration.
    pub async fn configure_and_translate(
        &self,
        id: &str,
        patch: TranslatorPatch,
        prompt: &str,
    ) -> Result<Value> {
        if !patch.is_empty() {
            self.configure(id, patch).await?;
        }
        self.translate(id, prompt).await
    }
}

fn normalize_key(key: Option<String>) -> Option<String> {
    key.filter(|k| !k.trim().is_empty())
}

/// A borrowed handle to one named translator.
pub struct TranslatorRef<'a> {
    id: String,
    cache: &'a TranslatorCache,
}

impl TranslatorRef<'_> {
    pub async fn configure(&self, patch: TranslatorPatch) -> Result<TranslatorDescriptor> {
        self.cache.configure(&self.id, patch).await
    }

    pub async fn translate(&self, prompt: &str) -> Result<Value> {
        self.cache.translate(&self.id, prompt).await
    }

    pub async fn descriptor(&self) -> TranslatorDescriptor {
        self.cache.describe(&self.id).await
    }
}
