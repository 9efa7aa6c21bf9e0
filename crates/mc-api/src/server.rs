//! Axum server and routes.

use crate::error::ApiError;
use crate::session::{clear_session_cookie, session_cookie, token_from_headers, CurrentSession};
use crate::views::{
    IndexView, JobResultView, ProviderDetail, ProviderSummary, UserView, LOGIN_PAGE,
    REGISTER_PAGE,
};
use axum::{
    body::Bytes,
    extract::{
        rejection::{FormRejection, JsonRejection},
        ConnectInfo, Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use mc_gateway::{Accounts, JobDefaults, JobForm, JobGateway};
use mc_types::{
    check_provider_key, BaseResponse, Credentials, JobRunner, ProviderRegistration,
    ProviderStore, SessionStore, UserStore,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Header carrying the provider pre-shared key.
pub const PROVIDER_KEY_HEADER: &str = "x-provider-key";

/// Characters escaped inside one path segment (RFC 3986 `pchar` complement, plus `%`).
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// `/result/{namespace}/{job_id}` with both segments escaped. The values come
/// from the job runner, so nothing about their shape is assumed.
pub fn result_location(namespace: &str, job_id: &str) -> Result<HeaderValue, ApiError> {
    let location = format!(
        "/result/{}/{}",
        utf8_percent_encode(namespace, PATH_SEGMENT),
        utf8_percent_encode(job_id, PATH_SEGMENT)
    );
    HeaderValue::try_from(location)
        .map_err(|e| ApiError::Internal(format!("invalid result location: {}", e)))
}

pub struct AppState {
    pub providers: Arc<dyn ProviderStore + Send + Sync>,
    pub accounts: Accounts,
    pub jobs: JobGateway,
    pub provider_key: String,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore + Send + Sync>,
        providers: Arc<dyn ProviderStore + Send + Sync>,
        sessions: Arc<dyn SessionStore + Send + Sync>,
        runner: Arc<dyn JobRunner + Send + Sync>,
        job_defaults: JobDefaults,
        provider_key: impl Into<String>,
    ) -> Self {
        Self {
            accounts: Accounts::new(users, sessions),
            jobs: JobGateway::new(Arc::clone(&providers), runner, job_defaults),
            providers,
            provider_key: provider_key.into(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/register", get(handle_register_page).post(handle_register_form))
        .route("/login", get(handle_login_page).post(handle_login_form))
        .route("/logout", get(handle_logout).post(handle_logout))
        .route("/provider/:id", get(handle_provider_detail))
        .route("/submit_job/:provider_id", post(handle_submit_job))
        .route("/result/:namespace/:job_id", get(handle_result))
        .route("/api/provider/register", post(handle_provider_register))
        .route("/api/providers", get(handle_provider_list))
        .route("/api/register", post(handle_api_register))
        .route("/api/login", post(handle_api_login))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_index(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<BaseResponse<IndexView>>, ApiError> {
    let providers = state.providers.list_providers().await?;
    Ok(Json(BaseResponse::ok(
        200,
        "Success",
        IndexView {
            user: session.as_ref().map(UserView::from),
            providers: providers.iter().map(ProviderSummary::from).collect(),
        },
    )))
}

async fn handle_provider_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BaseResponse<Vec<ProviderSummary>>>, ApiError> {
    let providers = state.providers.list_providers().await?;
    Ok(Json(BaseResponse::ok(
        200,
        "Success",
        providers.iter().map(ProviderSummary::from).collect(),
    )))
}

async fn handle_provider_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BaseResponse<ProviderDetail>>, ApiError> {
    let provider = state
        .providers
        .get_provider(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("provider not found".to_string()))?;
    Ok(Json(BaseResponse::ok(200, "Success", provider.into())))
}

async fn handle_register_page() -> Html<&'static str> {
    Html(REGISTER_PAGE)
}

async fn handle_login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

async fn handle_register_form(
    State(state): State<Arc<AppState>>,
    Form(creds): Form<Credentials>,
) -> Result<Redirect, ApiError> {
    state.accounts.register(&creds.username, &creds.password).await?;
    Ok(Redirect::to("/login"))
}

async fn handle_login_form(
    State(state): State<Arc<AppState>>,
    Form(creds): Form<Credentials>,
) -> Result<Response, ApiError> {
    let session = state.accounts.login(&creds.username, &creds.password).await?;
    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Redirect::to("/"),
    )
        .into_response())
}

async fn handle_api_register(
    State(state): State<Arc<AppState>>,
    creds: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<BaseResponse<UserView>>), ApiError> {
    let Json(creds) = creds.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user = state.accounts.register(&creds.username, &creds.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(BaseResponse::ok(201, "Registered", UserView::from(&user))),
    ))
}

async fn handle_api_login(
    State(state): State<Arc<AppState>>,
    creds: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(creds) = creds.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let session = state.accounts.login(&creds.username, &creds.password).await?;
    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Json(BaseResponse::ok(200, "Logged in", UserView::from(&session))),
    )
        .into_response())
}

async fn handle_logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = token_from_headers(&headers);
    state.accounts.logout(token.as_deref()).await?;
    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/"),
    )
        .into_response())
}

async fn handle_submit_job(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(provider_id): Path<i64>,
    form: Result<Form<JobForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Some(session) = session else {
        return Ok(Redirect::to("/login").into_response());
    };
    let Form(form) = form.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let sub = state.jobs.submit(&session, provider_id, &form).await?;
    let location = result_location(&sub.namespace, &sub.job_name)?;
    Ok((StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response())
}

async fn handle_result(
    State(state): State<Arc<AppState>>,
    Path((namespace, job_id)): Path<(String, String)>,
) -> Result<Json<BaseResponse<JobResultView>>, ApiError> {
    let result = state.jobs.result(&namespace, &job_id).await?;
    Ok(Json(BaseResponse::ok(200, "Success", result.into())))
}

async fn handle_provider_register(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<BaseResponse<ProviderDetail>>), ApiError> {
    let reject = |e: mc_types::RegistrationError| {
        tracing::warn!(peer = %peer, error = %e, "provider registration rejected");
        ApiError::from(e)
    };
    let presented = headers
        .get(PROVIDER_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    check_provider_key(presented, &state.provider_key).map_err(reject)?;
    let new_provider = ProviderRegistration::from_json(&body)
        .and_then(|reg| reg.validate(peer.ip()))
        .map_err(reject)?;
    let provider = state.providers.insert_provider(new_provider).await?;
    tracing::info!(
        provider_id = provider.id,
        name = %provider.name,
        cpu_free = provider.cpu_free,
        ram_free = provider.ram_free,
        "provider registered"
    );
    Ok((
        StatusCode::CREATED,
        Json(BaseResponse::ok(201, "Provider registered", provider.into())),
    ))
}

async fn handle_health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_location_escapes_each_segment() {
        let v = result_location("mutualcloud", "a/b c?#").unwrap();
        assert_eq!(v.to_str().unwrap(), "/result/mutualcloud/a%2Fb%20c%3F%23");
        let v = result_location("ns", "잡-1\r\n").unwrap();
        assert_eq!(v.to_str().unwrap(), "/result/ns/%EC%9E%A1-1%0D%0A");
        let v = result_location("mutualcloud", "job-1").unwrap();
        assert_eq!(v.to_str().unwrap(), "/result/mutualcloud/job-1");
    }
}
