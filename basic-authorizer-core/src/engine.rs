//! Decode → resolve → compare → decide.

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span};

use crate::credential;
use crate::decision::{Decision, DecisionObserver, Effect, TracingObserver, decide};
use crate::digest::{digests_match, secret_digest};
use crate::errors::{Error, Result};
use crate::resolver::SecretResolver;

/// One invocation: the raw `Authorization` header (if any), the identifier of
/// the resource being called and the deployment stage serving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub authorization: Option<String>,
    pub target: String,
    pub stage: String,
}

impl AuthorizationRequest {
    pub fn new(target: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            authorization: None,
            target: target.into(),
            stage: stage.into(),
        }
    }

    pub fn with_authorization(mut self, header: impl Into<String>) -> Self {
        self.authorization = Some(header.into());
        self
    }

    /// Wildcard scope covering every path of the stage.
    pub fn resource_scope(&self) -> String {
        scope_resource(&self.target, &self.stage)
    }
}

/// `<first segment of target>/<stage>/*`.
///
/// Upstream callers cache decisions by resource, so a decision must cover the
/// whole stage rather than the single path that was requested.
pub fn scope_resource(target: &str, stage: &str) -> String {
    let base = target.split('/').next().unwrap_or_default();
    format!("{base}/{stage}/*")
}

pub struct AuthorizationEngine {
    resolver: SecretResolver,
    observer: Arc<dyn DecisionObserver>,
}

impl AuthorizationEngine {
    pub fn new(resolver: SecretResolver) -> Self {
        Self {
            resolver,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn resolver(&self) -> &SecretResolver {
        &self.resolver
    }

    /// Decide whether the caller in `request` may proceed.
    ///
    /// Returns [`Error::Unauthorized`] when no usable credential was presented,
    /// a `Deny` decision for unknown identities or wrong secrets, and
    /// [`Error::StoreUnavailable`] when the secret store cannot answer.
    pub async fn authorize(&self, request: &AuthorizationRequest) -> Result<Decision> {
        let span = info_span!("authorize", stage = %request.stage);
        self.evaluate(request).instrument(span).await
    }

    async fn evaluate(&self, request: &AuthorizationRequest) -> Result<Decision> {
        let Some(raw) = request.authorization.as_deref() else {
            debug!("authorization header missing");
            return Err(Error::Unauthorized);
        };
        let credential = credential::decode(raw).inspect_err(|_| {
            debug!("authorization header could not be decoded");
        })?;

        let identity = credential.identity();
        let resource = request.resource_scope();

        let Some(stored) = self.resolver.resolve(identity).await? else {
            return Ok(self.decide(identity, Effect::Deny, &resource));
        };

        let computed = secret_digest(credential.secret());
        let effect = if digests_match(&computed, &stored) {
            Effect::Allow
        } else {
            info!(identity, "secret digest mismatch");
            Effect::Deny
        };
        Ok(self.decide(identity, effect, &resource))
    }

    fn decide(&self, identity: &str, effect: Effect, resource: &str) -> Decision {
        decide(self.observer.as_ref(), identity, effect, resource)
    }
}
