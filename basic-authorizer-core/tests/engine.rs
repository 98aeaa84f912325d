use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use authorizer_core::{
    AuthorizationEngine, AuthorizationRequest, Clock, Credential, Decision, DecisionObserver,
    Effect, Error, KeyScheme, ManualClock, MemoryStore, RecordMeta, ResolverConfig, SecretResolver,
    SecretStore, StoreError, StoreResult,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use time::Duration;
use time::macros::datetime;

const TARGET: &str = "arn:aws:execute-api:us-east-1:111122223333:api42/prod/GET/collections";
const STAGE: &str = "prod";
const SCOPE: &str = "arn:aws:execute-api:us-east-1:111122223333:api42/prod/*";

#[derive(Clone, Default)]
struct CountingStore {
    inner: Arc<MemoryStore>,
    describes: Arc<AtomicUsize>,
    gets: Arc<AtomicUsize>,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.describes.load(Ordering::SeqCst) + self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for CountingStore {
    async fn describe(&self, key: &str) -> StoreResult<RecordMeta> {
        self.describes.fetch_add(1, Ordering::SeqCst);
        self.inner.describe(key).await
    }

    async fn get_value(&self, key: &str) -> StoreResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_value(key).await
    }
}

struct UnreachableStore;

#[async_trait]
impl SecretStore for UnreachableStore {
    async fn describe(&self, _key: &str) -> StoreResult<RecordMeta> {
        Err(StoreError::Unreachable("no route to host".into()))
    }

    async fn get_value(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unreachable("no route to host".into()))
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<(String, Effect)>>,
}

impl DecisionObserver for RecordingObserver {
    fn decided(&self, identity: &str, effect: Effect) {
        self.events.lock().push((identity.to_string(), effect));
    }
}

struct Fixture {
    engine: AuthorizationEngine,
    store: CountingStore,
    clock: ManualClock,
    observer: Arc<RecordingObserver>,
}

impl Fixture {
    fn new() -> Self {
        let clock = ManualClock::new(datetime!(2026-04-01 09:00 UTC));
        let store = CountingStore::default();
        let observer = Arc::new(RecordingObserver::default());
        let resolver = SecretResolver::with_clock(
            store.clone(),
            ResolverConfig::new(),
            Arc::new(clock.clone()),
        );
        let engine = AuthorizationEngine::new(resolver).with_observer(observer.clone());
        Self {
            engine,
            store,
            clock,
            observer,
        }
    }

    fn provision(&self, identity: &str, secret: &str, ttl: Duration) {
        let key = KeyScheme::default().store_key(identity);
        self.store
            .inner
            .insert_secret(key, secret, Some(self.clock.now() + ttl));
    }

    async fn authorize(&self, header: Option<String>) -> authorizer_core::Result<Decision> {
        let mut request = AuthorizationRequest::new(TARGET, STAGE);
        request.authorization = header;
        self.engine.authorize(&request).await
    }
}

#[tokio::test]
async fn missing_header_is_unauthorized() {
    let fixture = Fixture::new();
    assert_eq!(fixture.authorize(None).await, Err(Error::Unauthorized));
    assert_eq!(fixture.store.calls(), 0);
    assert!(fixture.observer.events.lock().is_empty());
}

#[tokio::test]
async fn single_token_with_matching_secret_is_allowed() {
    let fixture = Fixture::new();
    fixture.provision("alice@x.com", "secret", Duration::minutes(5));

    let header = STANDARD.encode("alice@x.com:secret");
    let decision = fixture.authorize(Some(header)).await.expect("decision");

    assert_eq!(decision.identity, "alice@x.com");
    assert_eq!(decision.effect, Effect::Allow);
    assert_eq!(decision.resource, SCOPE);
    assert_eq!(
        fixture.observer.events.lock().as_slice(),
        &[("alice@x.com".to_string(), Effect::Allow)]
    );
}

#[tokio::test]
async fn basic_scheme_with_wrong_secret_is_denied() {
    let fixture = Fixture::new();
    fixture.provision("bob@x.com", "right", Duration::minutes(5));

    let header = format!("Basic {}", STANDARD.encode("bob@x.com:wrong"));
    let decision = fixture.authorize(Some(header)).await.expect("decision");

    assert_eq!(decision.identity, "bob@x.com");
    assert_eq!(decision.effect, Effect::Deny);
    assert_eq!(decision.resource, SCOPE);
}

#[tokio::test]
async fn bearer_scheme_is_unauthorized() {
    let fixture = Fixture::new();
    let result = fixture.authorize(Some("Bearer abc".to_string())).await;
    assert_eq!(result, Err(Error::Unauthorized));
    assert_eq!(fixture.store.calls(), 0);
}

#[tokio::test]
async fn unknown_identity_is_denied_without_caching() {
    let fixture = Fixture::new();
    let header = Credential::new("nobody@x.com", "pw").encode_basic();

    let first = fixture.authorize(Some(header.clone())).await.expect("decision");
    let second = fixture.authorize(Some(header)).await.expect("decision");

    assert_eq!(first.effect, Effect::Deny);
    assert_eq!(second.effect, Effect::Deny);
    assert!(fixture.engine.resolver().cache().is_empty());
    assert_eq!(fixture.store.describes.load(Ordering::SeqCst), 2);
    assert_eq!(fixture.store.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cached_digest_skips_store_within_expiry_window() {
    let fixture = Fixture::new();
    fixture.provision("carol@x.com", "pw", Duration::seconds(60));
    let header = Credential::new("carol@x.com", "pw").encode_basic();

    let first = fixture.authorize(Some(header.clone())).await.expect("decision");
    assert_eq!(first.effect, Effect::Allow);
    assert_eq!(fixture.store.calls(), 2);

    fixture.clock.advance(Duration::seconds(30));
    let second = fixture.authorize(Some(header.clone())).await.expect("decision");
    assert_eq!(second.effect, Effect::Allow);
    assert_eq!(fixture.store.calls(), 2);

    fixture.clock.advance(Duration::seconds(30));
    let third = fixture.authorize(Some(header)).await.expect("decision");
    assert_eq!(third.effect, Effect::Allow);
    assert_eq!(fixture.store.calls(), 4);
}

#[tokio::test]
async fn wrong_secret_against_cached_digest_is_denied() {
    let fixture = Fixture::new();
    fixture.provision("dave@x.com", "pw", Duration::minutes(5));

    let good = Credential::new("dave@x.com", "pw").encode_basic();
    let bad = Credential::new("dave@x.com", "nope").encode_basic();
    let first = fixture.authorize(Some(good)).await.unwrap();
    let second = fixture.authorize(Some(bad)).await.unwrap();
    assert_eq!(first.effect, Effect::Allow);
    assert_eq!(second.effect, Effect::Deny);
    assert_eq!(fixture.store.calls(), 2);
}

#[tokio::test]
async fn secrets_with_colons_and_escapes_verify() {
    let fixture = Fixture::new();
    fixture.provision("erin@x.com", "a:b%c", Duration::minutes(5));

    let header = format!("basic {}", STANDARD.encode("erin%40x.com:a:b%25c"));
    let decision = fixture.authorize(Some(header)).await.expect("decision");
    assert_eq!(decision.identity, "erin@x.com");
    assert_eq!(decision.effect, Effect::Allow);
}

#[tokio::test]
async fn store_outage_is_not_a_denial() {
    let resolver = SecretResolver::new(UnreachableStore, ResolverConfig::new());
    let engine = AuthorizationEngine::new(resolver);
    let request = AuthorizationRequest::new(TARGET, STAGE)
        .with_authorization(Credential::new("frank@x.com", "pw").encode_basic());

    let err = engine.authorize(&request).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
}

#[tokio::test]
async fn outcome_depends_only_on_digest_equality() {
    let fixture = Fixture::new();
    fixture.provision("gina@x.com", "pw", Duration::minutes(5));

    let cases = [
        ("pw", Effect::Allow),
        ("pw ", Effect::Deny),
        ("PW", Effect::Deny),
    ];
    for (secret, expected) in cases {
        let header = Credential::new("gina@x.com", secret).encode_basic();
        let decision = fixture.authorize(Some(header)).await.expect("decision");
        assert_eq!(decision.effect, expected, "secret {secret:?}");
    }
}
