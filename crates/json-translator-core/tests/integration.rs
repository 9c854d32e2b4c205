//! Integration tests for json-translator-core
//!
//! These tests drive the translator cache with mock providers:
//! - Lazy construction and reuse of model and translator handles
//! - Partial reconfiguration
//! - API key rotation and readiness notifications
//! - Translation failures and tips

use async_trait::async_trait;
use json_translator_core::{
    EntryState, Error, LanguageModel, ModelEnv, ModelInfo, ModelProvider, Result,
    SchemaTranslatorProvider, Status, TranslationOutcome, TranslatorCache, TranslatorPatch,
    TranslatorProvider, JsonTranslator,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// =============================================================================
// Mock Providers
// =============================================================================

/// A model that answers every prompt with the same text.
struct MockModel {
    env: ModelEnv,
    reply: String,
}

#[async_trait]
impl LanguageModel for MockModel {
    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: "mock",
            model: self.env.model.clone(),
        }
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Counts model constructions and remembers the environments it saw.
#[derive(Default)]
struct MockModelProvider {
    created: AtomicUsize,
    envs: Mutex<Vec<ModelEnv>>,
    reply: Mutex<String>,
}

impl MockModelProvider {
    fn with_reply(reply: &str) -> Arc<Self> {
        let provider = Self::default();
        *provider.reply.lock().unwrap() = reply.to_string();
        Arc::new(provider)
    }

    fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for MockModelProvider {
    async fn create(&self, env: &ModelEnv) -> Result<Arc<dyn LanguageModel>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.envs.lock().unwrap().push(env.clone());
        Ok(Arc::new(MockModel {
            env: env.clone(),
            reply: self.reply.lock().unwrap().clone(),
        }))
    }
}

/// Blocks inside `create` until released, to overlap construction with a key change.
#[derive(Default)]
struct GatedModelProvider {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl ModelProvider for GatedModelProvider {
    async fn create(&self, env: &ModelEnv) -> Result<Arc<dyn LanguageModel>> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Arc::new(MockModel {
            env: env.clone(),
            reply: String::new(),
        }))
    }
}

/// A translator that returns a fixed outcome and counts invocations.
struct MockTranslator {
    type_name: String,
    outcome: TranslationOutcome,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl JsonTranslator for MockTranslator {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    async fn translate(&self, _prompt: &str) -> Result<TranslationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome.clone())
    }
}

/// Counts translator constructions and hands out a fixed outcome.
struct MockTranslatorProvider {
    created: AtomicUsize,
    calls: Arc<AtomicUsize>,
    outcome: TranslationOutcome,
    models: Mutex<Vec<Arc<dyn LanguageModel>>>,
}

impl MockTranslatorProvider {
    fn returning(outcome: TranslationOutcome) -> Arc<Self> {
        Arc::new(Self {
            created: AtomicUsize::new(0),
            calls: Arc::new(AtomicUsize::new(0)),
            outcome,
            models: Mutex::new(Vec::new()),
        })
    }

    fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn model(&self, index: usize) -> Arc<dyn LanguageModel> {
        Arc::clone(&self.models.lock().unwrap()[index])
    }
}

#[async_trait]
impl TranslatorProvider for MockTranslatorProvider {
    async fn create(
        &self,
        model: Arc<dyn LanguageModel>,
        _schema: &str,
        type_name: &str,
    ) -> Result<Arc<dyn JsonTranslator>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.models.lock().unwrap().push(model);
        Ok(Arc::new(MockTranslator {
            type_name: type_name.to_string(),
            outcome: self.outcome.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

const PERSON_SCHEMA: &str = "export interface Person {\n    name: string;\n    age: number;\n}";

fn person() -> Value {
    json!({"name": "John", "age": 30})
}

fn person_patch() -> TranslatorPatch {
    TranslatorPatch::new("gpt-4", PERSON_SCHEMA, "Person")
}

struct Harness {
    models: Arc<MockModelProvider>,
    translators: Arc<MockTranslatorProvider>,
    cache: TranslatorCache,
}

fn harness(outcome: TranslationOutcome) -> Harness {
    let models = MockModelProvider::with_reply("");
    let translators = MockTranslatorProvider::returning(outcome);
    let cache = TranslatorCache::with_api_key(
        models.clone(),
        translators.clone(),
        Some("sk-test".to_string()),
    );
    Harness {
        models,
        translators,
        cache,
    }
}

// =============================================================================
// Configure / Translate
// =============================================================================

#[tokio::test]
async fn test_translate_before_configure_fails() {
    let h = harness(TranslationOutcome::Success(person()));

    for id in ["t1", "t2", ""] {
        let err = h.cache.translate(id, "John is 30").await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured(ref got) if got == id));
    }
    assert_eq!(h.models.created(), 0);
}

#[tokio::test]
async fn test_configure_then_translate() {
    let h = harness(TranslationOutcome::Success(person()));

    let descriptor = h.cache.configure("t1", person_patch()).await.unwrap();
    assert_eq!(descriptor.state, EntryState::Ready);
    assert_eq!(descriptor.args.as_ref().map(|a| a.type_name.as_str()), Some("Person"));

    let value = h.cache.translate("t1", "John is 30").await.unwrap();
    assert_eq!(value, person());
    assert_eq!(h.translators.calls(), 1);

    let envs = h.models.envs.lock().unwrap();
    assert_eq!(envs.len(), 1);
    assert_eq!(envs[0].api_key, "sk-test");
    assert_eq!(envs[0].model, "gpt-4");
}

#[tokio::test]
async fn test_identical_configure_rebuilds_nothing() {
    let h = harness(TranslationOutcome::Success(person()));

    h.cache.configure("t1", person_patch()).await.unwrap();
    h.cache.configure("t1", person_patch()).await.unwrap();
    h.cache.configure("t1", TranslatorPatch::default()).await.unwrap();

    assert_eq!(h.models.created(), 1);
    assert_eq!(h.translators.created(), 1);
}

#[tokio::test]
async fn test_schema_change_keeps_model() {
    let h = harness(TranslationOutcome::Success(person()));

    h.cache.configure("t1", person_patch()).await.unwrap();
    h.cache
        .configure("t1", TranslatorPatch::default().schema("export interface Person { name: string }"))
        .await
        .unwrap();
    h.cache
        .configure("t1", TranslatorPatch::default().type_name("Human"))
        .await
        .unwrap();

    assert_eq!(h.models.created(), 1);
    assert_eq!(h.translators.created(), 3);
    assert!(Arc::ptr_eq(&h.translators.model(0), &h.translators.model(1)));
    assert!(Arc::ptr_eq(&h.translators.model(1), &h.translators.model(2)));

    let descriptor = h.cache.translator("t1").descriptor().await;
    let args = descriptor.args.unwrap();
    assert_eq!(args.model, "gpt-4");
    assert_eq!(args.schema, "export interface Person { name: string }");
    assert_eq!(args.type_name, "Human");
}

#[tokio::test]
async fn test_model_change_rebuilds_both() {
    let h = harness(TranslationOutcome::Success(person()));

    h.cache.configure("t1", person_patch()).await.unwrap();
    h.cache
        .configure("t1", TranslatorPatch::default().model("gpt-3.5-turbo"))
        .await
        .unwrap();

    assert_eq!(h.models.created(), 2);
    assert_eq!(h.translators.created(), 2);
    assert!(!Arc::ptr_eq(&h.translators.model(0), &h.translators.model(1)));
    assert_eq!(h.translators.model(1).info().model, "gpt-3.5-turbo");
}

#[tokio::test]
async fn test_ids_are_independent() {
    let h = harness(TranslationOutcome::Success(person()));

    h.cache.configure("a", person_patch()).await.unwrap();
    h.cache.configure("b", person_patch()).await.unwrap();

    assert_eq!(h.models.created(), 2);
    assert_eq!(h.cache.ids().await, ["a", "b"]);
    assert!(matches!(
        h.cache.translate("c", "x").await,
        Err(Error::NotConfigured(_))
    ));
}

#[tokio::test]
async fn test_missing_fields_fail_and_store_nothing() {
    let h = harness(TranslationOutcome::Success(person()));

    let err = h
        .cache
        .configure("t1", TranslatorPatch::default().model("gpt-4").type_name("Person"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfig("schema")));
    assert_eq!(h.models.created(), 0);
    assert!(h.cache.ids().await.is_empty());
}

#[tokio::test]
async fn test_empty_string_overrides_stored_value() {
    let h = harness(TranslationOutcome::Success(person()));

    h.cache.configure("t1", person_patch()).await.unwrap();
    let descriptor = h
        .cache
        .configure("t1", TranslatorPatch::default().type_name(""))
        .await
        .unwrap();

    assert_eq!(descriptor.args.unwrap().type_name, "");
    assert_eq!(h.translators.created(), 2);
}

#[tokio::test]
async fn test_configure_and_translate() {
    let h = harness(TranslationOutcome::Success(person()));

    let value = h
        .cache
        .configure_and_translate("t1", person_patch(), "John is 30")
        .await
        .unwrap();
    assert_eq!(value, person());

    // Reusing the stored args with an empty patch
    h.cache
        .configure_and_translate("t1", TranslatorPatch::default(), "Jane is 31")
        .await
        .unwrap();
    assert_eq!(h.models.created(), 1);
    assert_eq!(h.translators.calls(), 2);
}

// =============================================================================
// API Key
// =============================================================================

#[tokio::test]
async fn test_configure_without_key_fails() {
    let models = MockModelProvider::with_reply("");
    let translators = MockTranslatorProvider::returning(TranslationOutcome::Success(person()));
    let cache = TranslatorCache::new(models.clone(), translators);

    assert_eq!(cache.status(), Status::NotConfigured);
    assert_eq!(cache.describe("t1").await.state, EntryState::NoKey);

    let err = cache.configure("t1", person_patch()).await.unwrap_err();
    assert!(matches!(err, Error::MissingApiKey));
    assert_eq!(models.created(), 0);
    assert!(cache.ids().await.is_empty());
}

#[tokio::test]
async fn test_key_rotation_invalidates_every_id() {
    let h = harness(TranslationOutcome::Success(person()));

    h.cache.configure("a", person_patch()).await.unwrap();
    h.cache.configure("b", person_patch()).await.unwrap();

    h.cache.set_api_key(Some("sk-new".to_string())).await;

    for id in ["a", "b"] {
        assert!(matches!(
            h.cache.translate(id, "John is 30").await,
            Err(Error::NotConfigured(_))
        ));
        let descriptor = h.cache.describe(id).await;
        assert_eq!(descriptor.state, EntryState::NoModel);
        assert!(descriptor.args.is_none());
    }

    // Reconfiguring builds with the new key
    h.cache.configure("a", person_patch()).await.unwrap();
    assert_eq!(h.models.envs.lock().unwrap().last().unwrap().api_key, "sk-new");
    assert_eq!(h.cache.translate("a", "John is 30").await.unwrap(), person());
}

#[tokio::test]
async fn test_key_change_during_configure_stores_nothing() {
    let models = Arc::new(GatedModelProvider::default());
    let translators = MockTranslatorProvider::returning(TranslationOutcome::Success(person()));
    let cache = Arc::new(TranslatorCache::with_api_key(
        models.clone(),
        translators,
        Some("sk-old".to_string()),
    ));

    let pending = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.configure("t1", person_patch()).await }
    });

    models.entered.notified().await;
    cache.set_api_key(None).await;
    models.release.notify_one();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::MissingApiKey));

    assert_eq!(cache.status(), Status::NotConfigured);
    let descriptor = cache.describe("t1").await;
    assert_eq!(descriptor.state, EntryState::NoKey);
    assert!(descriptor.args.is_none());
    assert!(cache.ids().await.is_empty());
    assert!(matches!(
        cache.translate("t1", "John is 30").await,
        Err(Error::NotConfigured(_))
    ));
}

#[tokio::test]
async fn test_key_change_notifies_subscribers() {
    let h = harness(TranslationOutcome::Success(person()));
    let mut rx = h.cache.subscribe();
    assert_eq!(*rx.borrow_and_update(), Status::Ready);

    h.cache.set_api_key(None).await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), Status::NotConfigured);
    assert_eq!(h.cache.status(), Status::NotConfigured);

    // Blank keys count as no key but still notify
    h.cache.set_api_key(Some("   ".to_string())).await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), Status::NotConfigured);

    h.cache.set_api_key(Some("sk-2".to_string())).await;
    assert_eq!(*rx.borrow_and_update(), Status::Ready);
}

// =============================================================================
// Translation Failures
// =============================================================================

#[tokio::test]
async fn test_failure_gets_module_tip() {
    let h = harness(TranslationOutcome::failure("Foo is not a module"));
    h.cache.configure("t1", person_patch()).await.unwrap();

    let err = h.cache.translate("t1", "John is 30").await.unwrap_err();
    let message = match err {
        Error::TranslationFailed(message) => message,
        other => panic!("expected TranslationFailed, got {other:?}"),
    };
    assert!(message.contains("Foo is not a module"));
    assert!(message.contains("Consider exporting the target type"));
}

#[tokio::test]
async fn test_failure_gets_object_tip() {
    let h = harness(TranslationOutcome::failure("Response is not JSON:\npositive"));
    h.cache.configure("t1", person_patch()).await.unwrap();

    let err = h.cache.translate("t1", "great").await.unwrap_err();
    assert!(err.to_string().ends_with("tip: Consider using an object as the target type"));
}

#[tokio::test]
async fn test_unknown_failure_passes_through() {
    let h = harness(TranslationOutcome::failure("Property 'age' is missing"));
    h.cache.configure("t1", person_patch()).await.unwrap();

    let err = h.cache.translate("t1", "John").await.unwrap_err();
    assert_eq!(err.to_string(), "Property 'age' is missing");
}

// =============================================================================
// End to end with the schema translator
// =============================================================================

#[tokio::test]
async fn test_schema_translator_through_cache() {
    let models = MockModelProvider::with_reply("{\n  \"name\": \"John\",\n  \"age\": 30\n}");
    let cache = TranslatorCache::with_api_key(
        models,
        Arc::new(SchemaTranslatorProvider::default()),
        Some("sk-test".to_string()),
    );

    let person_ref = cache.translator("t1");
    person_ref.configure(person_patch()).await.unwrap();
    assert_eq!(person_ref.translate("John is 30").await.unwrap(), person());

    cache
        .configure("t2", TranslatorPatch::new("gpt-4", "interface Person {}", "Person"))
        .await
        .unwrap();
    let err = cache.translate("t2", "John is 30").await.unwrap_err();
    assert!(err.to_string().contains("is not a module"));
    assert!(err.to_string().contains("tip: Consider exporting the target type in the schema"));
}
