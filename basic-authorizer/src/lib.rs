pub mod config;
pub mod error;
pub mod models;
pub mod telemetry;

use anyhow::Context;
use authorizer_core::{AuthorizationEngine, SecretResolver};
use tracing::{debug, info};

pub use config::{AuthorizerSettings, StoreKind};
pub use error::{AppError, AppErrorKind, ErrorBody, Outcome};
pub use models::{AuthorizerEvent, PolicyDocument};

/// Build the engine for `settings`. The engine owns its digest cache, so one
/// instance should serve every invocation of the process.
pub async fn build_engine(settings: &AuthorizerSettings) -> anyhow::Result<AuthorizationEngine> {
    let store = config::load_store(&settings.store)
        .await
        .context("failed to initialize secret store")?;
    let engine = AuthorizationEngine::new(SecretResolver::new(store, settings.resolver.clone()));
    info!(
        store_path = %settings.store.path().display(),
        key_prefix = engine.resolver().key_scheme().prefix(),
        cache_capacity = engine.resolver().cache().capacity(),
        store_timeout_ms = settings.resolver.timeout().as_millis() as u64,
        "authorizer ready"
    );
    Ok(engine)
}

/// Evaluate one gateway event and render the resulting policy.
pub async fn authorize_event(
    engine: &AuthorizationEngine,
    event: &AuthorizerEvent,
) -> Result<PolicyDocument, AppError> {
    debug!(event = %event.redacted(), "authorizer invocation");
    let decision = engine.authorize(&event.to_request()).await?;
    Ok(PolicyDocument::from(&decision))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authorizer_core::{Effect, KeyScheme, MemoryStore, ResolverConfig};
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    fn engine_with(identity: &str, secret: &str) -> AuthorizationEngine {
        let store = MemoryStore::new();
        store.insert_secret(
            KeyScheme::default().store_key(identity),
            secret,
            Some(OffsetDateTime::now_utc() + Duration::hours(1)),
        );
        AuthorizationEngine::new(SecretResolver::new(store, ResolverConfig::new()))
    }

    fn event(authorization: Option<&str>) -> AuthorizerEvent {
        let headers = match authorization {
            Some(value) => json!({"Authorization": value}),
            None => json!({}),
        };
        serde_json::from_value(json!({
            "methodArn": "arn:aws:execute-api:eu-west-1:000000000000:gw1/dev/POST/search",
            "headers": headers,
            "requestContext": {"stage": "dev"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn allows_matching_credential() {
        let engine = engine_with("alice@x.com", "secret");
        let policy = authorize_event(&engine, &event(Some("Basic YWxpY2VAeC5jb206c2VjcmV0")))
            .await
            .expect("policy");
        assert_eq!(policy.principal_id, "alice@x.com");
        assert_eq!(policy.effect(), Some(Effect::Allow));
        assert_eq!(
            policy.policy_document.statement[0].resource,
            "arn:aws:execute-api:eu-west-1:000000000000:gw1/dev/*"
        );
    }

    #[tokio::test]
    async fn denies_wrong_secret() {
        let engine = engine_with("alice@x.com", "secret");
        let policy = authorize_event(&engine, &event(Some("Basic YWxpY2VAeC5jb206d3Jvbmc=")))
            .await
            .expect("policy");
        assert_eq!(policy.effect(), Some(Effect::Deny));
        assert_eq!(Outcome::from(Effect::Deny).status(), 403);
    }

    #[tokio::test]
    async fn builds_engine_from_memory_settings() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ResolverConfig::new().key_prefix("/creds/");
        let settings = AuthorizerSettings {
            resolver: resolver.cache_capacity(0),
            store: StoreKind::Memory(dir.path().join("credentials.json")),
        };
        let engine = build_engine(&settings).await.expect("engine");
        assert_eq!(engine.resolver().key_scheme().prefix(), "/creds/");
        assert_eq!(engine.resolver().cache().capacity(), 1);
    }

    #[tokio::test]
    async fn missing_header_challenges() {
        let engine = engine_with("alice@x.com", "secret");
        let err = authorize_event(&engine, &event(None)).await.unwrap_err();
        assert_eq!(err.outcome(), Outcome::Challenge);
        assert!(matches!(err.kind(), AppErrorKind::Unauthorized));
    }
}
