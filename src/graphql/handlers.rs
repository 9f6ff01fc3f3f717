use {
    super::{ExecutableSchema, ExecutionContext, GraphQLRequest, GraphQLResponse},
    crate::{AppContext, RequestContext},
    axum::{
        Json,
        body::Bytes,
        extract::State,
        response::{Html, IntoResponse, Response},
    },
    http::StatusCode,
    tokio_util::sync::CancellationToken,
};

/// `POST /graphql`.
///
/// A body that is not a GraphQL request gets 400 with a GraphQL-shaped
/// error. Everything else is answered with 200, including resolver panics.
pub async fn execute(
    State(ctx): State<AppContext>,
    request_ctx: RequestContext,
    body: Bytes,
) -> Response {
    let request: GraphQLRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(error = %err, "Malformed GraphQL request");
            let response = GraphQLResponse::error(format!("invalid GraphQL request: {err}"));
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    // cancelled when this future is dropped, e.g. because the client left
    let cancellation = CancellationToken::new();
    let _cancel_on_drop = cancellation.clone().drop_guard();

    let context = ExecutionContext {
        request_id: request_ctx.request_id.clone(),
        client_ip: request_ctx.client_ip,
        identity: request_ctx.identity().await,
        cancellation,
    };

    tracing::debug!(operation = ?request.operation_name, "Executing GraphQL operation");
    let response = ctx.schema().execute(request, context).await;
    Json(response).into_response()
}

/// `GET /`: an in-browser query console posting to `/graphql`.
pub async fn playground() -> Html<&'static str> {
    Html(PLAYGROUND)
}

const PLAYGROUND: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>graphql</title>
  <link rel="stylesheet" href="https://unpkg.com/graphiql@3/graphiql.min.css">
  <style>body { margin: 0; height: 100vh; } #graphiql { height: 100vh; }</style>
</head>
<body>
  <div id="graphiql">Loading the query console...</div>
  <script crossorigin src="https://unpkg.com/react@18/umd/react.production.min.js"></script>
  <script crossorigin src="https://unpkg.com/react-dom@18/umd/react-dom.production.min.js"></script>
  <script crossorigin src="https://unpkg.com/graphiql@3/graphiql.min.js"></script>
  <script>
    const fetcher = GraphiQL.createFetcher({ url: '/graphql', credentials: 'same-origin' });
    ReactDOM.createRoot(document.getElementById('graphiql'))
      .render(React.createElement(GraphiQL, { fetcher }));
  </script>
</body>
</html>
"#;
