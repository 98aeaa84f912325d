use std::collections::HashMap;

use authorizer_core::{AuthorizationRequest, Decision, Effect};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";
const REDACTED: &str = "[redacted]";

/// Request-authorizer event as delivered by the API gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    /// Gateways send `null` for headers without a value.
    #[serde(default)]
    pub headers: Option<HashMap<String, Option<String>>>,
    pub method_arn: String,
    #[serde(default)]
    pub request_context: RequestContext,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub stage: String,
}

impl AuthorizerEvent {
    /// The `Authorization` header.
    ///
    /// The canonical spelling wins. Otherwise a single case-insensitive match
    /// is used; several differently-cased copies are treated as absent.
    pub fn authorization(&self) -> Option<&str> {
        let headers = self.headers.as_ref()?;
        if let Some(value) = headers.get(AUTHORIZATION_HEADER) {
            return value.as_deref();
        }
        let mut matches = headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION_HEADER));
        match (matches.next(), matches.next()) {
            (Some((_, value)), None) => value.as_deref(),
            _ => None,
        }
    }

    pub fn to_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            authorization: self.authorization().map(str::to_string),
            target: self.method_arn.clone(),
            stage: self.request_context.stage.clone(),
        }
    }

    /// The event as JSON with credential headers masked, safe to log.
    pub fn redacted(&self) -> Value {
        let mut copy = self.clone();
        if let Some(headers) = copy.headers.as_mut() {
            for (name, value) in headers.iter_mut() {
                if name.eq_ignore_ascii_case(AUTHORIZATION_HEADER) && value.is_some() {
                    *value = Some(REDACTED.to_string());
                }
            }
        }
        serde_json::to_value(copy).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    pub principal_id: String,
    pub policy_document: Policy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    pub version: String,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

impl PolicyDocument {
    pub fn effect(&self) -> Option<Effect> {
        self.policy_document
            .statement
            .first()
            .map(|statement| statement.effect)
    }
}

impl From<&Decision> for PolicyDocument {
    fn from(decision: &Decision) -> Self {
        Self {
            principal_id: decision.identity.clone(),
            policy_document: Policy {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: INVOKE_ACTION.to_string(),
                    effect: decision.effect,
                    resource: decision.resource.clone(),
                }],
            },
        }
    }
}
