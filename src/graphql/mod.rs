//! GraphQL execution surface.
//!
//! The schema is an opaque collaborator behind [`ExecutableSchema`]. The
//! server only moves requests in and responses out, and wraps the schema in
//! [`PanicIsolated`] so a failing resolver cannot take the process down.
mod handlers;
mod isolate;

pub use handlers::*;
pub use isolate::*;

use {
    crate::auth::Identity,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::{future::Future, net::IpAddr, pin::Pin},
    tokio_util::sync::CancellationToken,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The query-resolution engine.
pub trait ExecutableSchema: Send + Sync + 'static {
    fn execute(
        &self,
        request: GraphQLRequest,
        context: ExecutionContext,
    ) -> BoxFuture<'_, GraphQLResponse>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(default, rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>) -> Self {
        GraphQLRequest {
            query: query.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl GraphQLResponse {
    pub fn data(data: Value) -> Self {
        GraphQLResponse {
            data,
            errors: Vec::new(),
        }
    }

    /// A response with no data and one error.
    pub fn error(message: impl Into<String>) -> Self {
        GraphQLResponse {
            data: Value::Null,
            errors: vec![GraphQLError::new(message)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        GraphQLError {
            message: message.into(),
            path: None,
            extensions: None,
        }
    }
}

/// What a resolver may know about the request it serves.
///
/// `cancellation` fires when the connection goes away; long-running
/// resolvers should check it between steps.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub request_id: Option<String>,
    pub client_ip: Option<IpAddr>,
    pub identity: Option<Identity>,
    pub cancellation: CancellationToken,
}

/// Stand-in for deployments that have not wired a schema: every operation
/// is answered with an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredSchema;

impl ExecutableSchema for UnconfiguredSchema {
    fn execute(
        &self,
        _request: GraphQLRequest,
        _context: ExecutionContext,
    ) -> BoxFuture<'_, GraphQLResponse> {
        Box::pin(async { GraphQLResponse::error("no executable schema is configured") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_accepts_operation_name() {
        let request: GraphQLRequest = serde_json::from_value(json!({
            "query": "query Q { posts { id } }",
            "operationName": "Q",
            "variables": { "limit": 3 }
        }))
        .unwrap();
        assert_eq!(request.operation_name.as_deref(), Some("Q"));
        assert_eq!(request.variables.unwrap()["limit"], 3);
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(GraphQLResponse::error("boom")).unwrap();
        assert_eq!(body, json!({ "data": null, "errors": [{ "message": "boom" }] }));
    }

    #[test]
    fn test_data_response_omits_errors() {
        let body = serde_json::to_value(GraphQLResponse::data(json!({ "ok": true }))).unwrap();
        assert_eq!(body, json!({ "data": { "ok": true } }));
    }

    #[tokio::test]
    async fn test_unconfigured_schema_answers_with_error() {
        let response = UnconfiguredSchema
            .execute(GraphQLRequest::new("{ __typename }"), ExecutionContext::default())
            .await;
        assert_eq!(response.data, Value::Null);
        assert_eq!(response.errors.len(), 1);
    }
}
