use {
    super::{Credentials, IDENTITY_KEY, Identity},
    crate::{AppContext, Error, Result, not_found, render::render_html},
    axum::{
        Form, Json, Router,
        extract::{FromRequest, Request, State},
        response::Response,
        routing::{any, get, post},
    },
    http::{StatusCode, header::CONTENT_TYPE},
    serde_json::json,
    tower_sessions::Session,
};

/// Every path under `/auth`. Unknown sub-paths get the not-found page.
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/login", get(login_page))
        .route("/auth/password/login", post(password_login))
        .route("/auth/logout", get(logout).post(logout))
        .route("/auth/me", get(me))
        .route("/auth", any(not_found))
        .route("/auth/", any(not_found))
        .route("/auth/{*rest}", any(not_found))
}

/// Login credentials posted either as an HTML form or as JSON.
pub struct LoginForm(pub Credentials);

impl<S> FromRequest<S> for LoginForm
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let credentials = if is_json {
            let Json(credentials) = Json::<Credentials>::from_request(req, state)
                .await
                .map_err(|rejection| Error::invalid_input(rejection.body_text()))?;
            credentials
        } else {
            let Form(credentials) = Form::<Credentials>::from_request(req, state)
                .await
                .map_err(|rejection| Error::invalid_input(rejection.body_text()))?;
            credentials
        };
        Ok(LoginForm(credentials))
    }
}

async fn login_page(State(ctx): State<AppContext>) -> Response {
    render_html(ctx.renderer(), StatusCode::OK, "login", &json!({ "Title": "Sign in" }))
}

async fn password_login(
    State(ctx): State<AppContext>,
    session: Session,
    LoginForm(credentials): LoginForm,
) -> Result<Json<Identity>> {
    let identity = ctx
        .verifier()
        .verify(&credentials)
        .await
        .inspect_err(|failure| {
            tracing::info!(login = %credentials.login, reason = %failure, "Login rejected");
        })?;

    // new id on privilege change
    session.cycle_id().await?;
    session.insert(IDENTITY_KEY, &identity).await?;

    tracing::info!(login = %identity.login, provider = %identity.provider, "Signed in");
    Ok(Json(identity))
}

async fn logout(session: Session) -> Result<StatusCode> {
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(session: Session) -> Result<Json<Identity>> {
    session
        .get::<Identity>(IDENTITY_KEY)
        .await?
        .map(Json)
        .ok_or_else(|| Error::authentication("not signed in"))
}
