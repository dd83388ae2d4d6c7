//! HTTP surface over the dictionary core.
//!
//! Serves server-rendered pages plus a small JSON API. Both run against
//! whichever backend the caller injects, so the demo dataset and the hosted
//! backend share every handler. An anonymous visitor cookie keys the
//! per-visitor recent-lookup list; no account is required to browse.

use crate::detail::{DetailPresenter, FormEntry, FormSection, WordDetails};
use crate::model::SearchResult;
use crate::search::SearchOptions;
use crate::session::{SessionProvider, Vocabulary, VocabularyError};
use crate::store::{SearchService, StoreError, WordStore};
use crate::telemetry::LookupStats;
use axum::{
    Json, Router,
    extract::{Form, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use cookie::Cookie;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, SeedableRng, distributions::Alphanumeric, rngs::SmallRng};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

const VISITOR_COOKIE: &str = "slovi_visitor";
const TRENDING_LIMIT: usize = 8;
const RECENT_LIMIT: usize = 5;

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub base_url: String,
    pub default_limit: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080".to_string(),
            default_limit: 10,
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub struct AppState<B, V> {
    pub backend: Arc<B>,
    pub detail: DetailPresenter<B>,
    pub session: Arc<dyn SessionProvider>,
    pub vocabulary: Arc<V>,
    pub stats: Arc<LookupStats>,
    pub default_limit: usize,
    /// Same gate the interactive coordinator applies, so the two surfaces
    /// cannot drift apart.
    pub min_query_len: usize,
    pub base_url: String,
}

impl<B: WordStore, V> AppState<B, V> {
    pub fn new(
        backend: Arc<B>,
        vocabulary: Arc<V>,
        session: Arc<dyn SessionProvider>,
        config: &WebConfig,
    ) -> Self {
        Self {
            detail: DetailPresenter::new(Arc::clone(&backend)),
            backend,
            session,
            vocabulary,
            stats: Arc::new(LookupStats::new()),
            default_limit: config.default_limit,
            min_query_len: SearchOptions::default().min_query_len,
            base_url: config.base_url.clone(),
        }
    }
}

pub async fn serve<B, V>(config: WebConfig, state: Arc<AppState<B, V>>) -> Result<(), WebError>
where
    B: SearchService + WordStore + 'static,
    V: Vocabulary + 'static,
{
    let router = build_router(state);
    info!(%config.addr, base = %config.base_url, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

pub fn build_router<B, V>(state: Arc<AppState<B, V>>) -> Router
where
    B: SearchService + WordStore + 'static,
    V: Vocabulary + 'static,
{
    Router::new()
        .route("/", get(home::<B, V>))
        .route("/search", get(search_page::<B, V>))
        .route("/word", get(word_page::<B, V>))
        .route("/api/search", get(api_search::<B, V>))
        .route("/api/word", get(api_word::<B, V>))
        .route("/api/vocabulary", post(api_vocabulary::<B, V>))
        .route("/healthz", get(healthz))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CompressionLayer::new())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<VocabularyError> for ApiError {
    fn from(err: VocabularyError) -> Self {
        let status = match &err {
            VocabularyError::NotAvailable => StatusCode::NOT_IMPLEMENTED,
            VocabularyError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WordParams {
    id: i64,
    full: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct SaveRequest {
    root_word_id: i64,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn api_search<B, V>(
    State(state): State<Arc<AppState<B, V>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    B: SearchService + WordStore + 'static,
    V: Vocabulary + 'static,
{
    let query = params.q.trim();
    if query.chars().count() < state.min_query_len {
        return Err(ApiError::bad_request(format!(
            "query must be at least {} characters",
            state.min_query_len
        )));
    }
    let limit = params.limit.unwrap_or(state.default_limit).clamp(1, 50);
    let results = state.backend.search(query, limit).await?;
    Ok(Json(json!({ "query": query, "results": results })))
}

async fn api_word<B, V>(
    State(state): State<Arc<AppState<B, V>>>,
    Query(params): Query<WordParams>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    B: SearchService + WordStore + 'static,
    V: Vocabulary + 'static,
{
    let details = state.detail.load(params.id).await?;
    Ok(Json(detail_payload(&details)))
}

async fn api_vocabulary<B, V>(
    State(state): State<Arc<AppState<B, V>>>,
    Form(request): Form<SaveRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError>
where
    B: SearchService + WordStore + 'static,
    V: Vocabulary + 'static,
{
    let user = state
        .session
        .current_user()
        .ok_or_else(|| ApiError::unauthorized("sign in to save words"))?;
    state
        .vocabulary
        .add_to_vocabulary(&user, request.root_word_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "saved", "root_word_id": request.root_word_id })),
    ))
}

fn detail_payload(details: &WordDetails) -> serde_json::Value {
    let sections: Vec<serde_json::Value> = details
        .sections()
        .iter()
        .map(|section| {
            json!({
                "category": section.category(),
                "label": section.meta().label,
                "icon": section.meta().icon,
                "forms": section.forms(),
            })
        })
        .collect();
    json!({ "root": details.root, "sections": sections })
}

async fn home<B, V>(
    State(state): State<Arc<AppState<B, V>>>,
    headers: HeaderMap,
) -> Html<String>
where
    B: SearchService + WordStore + 'static,
    V: Vocabulary + 'static,
{
    let mut body = String::new();
    body.push_str("<h1>Slovíčka</h1><p class=\"lede\">Czech-English dictionary</p>");
    body.push_str(
        "<form method=\"get\" action=\"/search\" class=\"searchbox\">\
         <input type=\"search\" name=\"q\" placeholder=\"Search Czech or English…\" \
         minlength=\"2\" autofocus>\
         <button type=\"submit\">Search</button></form>",
    );

    let trending = state.stats.trending(TRENDING_LIMIT);
    if !trending.is_empty() {
        body.push_str("<h2>Trending</h2><ul class=\"wordlist\">");
        for row in &trending {
            body.push_str(&format!(
                "<li><a href=\"/word?id={}\">{}</a> <span class=\"muted\">{} views</span></li>",
                row.root_word_id,
                escape_html(&row.word),
                row.views
            ));
        }
        body.push_str("</ul>");
    }

    if let Some(visitor) = visitor_from_headers(&headers) {
        let recent = state.stats.recent(&visitor, RECENT_LIMIT);
        if !recent.is_empty() {
            body.push_str("<h2>Your recent lookups</h2><ul class=\"wordlist\">");
            for row in &recent {
                body.push_str(&format!(
                    "<li><a href=\"/word?id={}\">{}</a></li>",
                    row.root_word_id,
                    escape_html(&row.word)
                ));
            }
            body.push_str("</ul>");
        }
    }

    Html(page("Slovíčka", &body))
}

async fn search_page<B, V>(
    State(state): State<Arc<AppState<B, V>>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError>
where
    B: SearchService + WordStore + 'static,
    V: Vocabulary + 'static,
{
    let query = params.q.trim().to_string();
    if query.chars().count() < state.min_query_len {
        let body = format!(
            "<p>Type at least {} characters to search.</p>\
             <p><a href=\"/\">Back</a></p>",
            state.min_query_len
        );
        return Ok(Html(page("Search", &body)).into_response());
    }
    let limit = params.limit.unwrap_or(state.default_limit).clamp(1, 50);
    let results = match state.backend.search(&query, limit).await {
        Ok(results) => results,
        Err(err) => {
            let api = ApiError::from(err);
            return Ok(error_page(api.status, &api.message));
        }
    };

    let mut body = format!(
        "<h1>Results for \u{201e}{}\u{201c}</h1>",
        escape_html(&query)
    );
    if results.is_empty() {
        body.push_str("<p>No matches found.</p>");
    } else {
        body.push_str("<ul class=\"results\">");
        for row in &results {
            body.push_str(&render_search_row(row));
        }
        body.push_str("</ul>");
    }
    let encoded = utf8_percent_encode(&query, NON_ALPHANUMERIC);
    body.push_str(&format!(
        "<p class=\"muted\"><a href=\"/\">New search</a> · \
         <a href=\"{base}/api/search?q={encoded}&amp;limit={limit}\">JSON</a></p>",
        base = state.base_url.trim_end_matches('/'),
    ));
    Ok(Html(page("Search", &body)).into_response())
}

fn render_search_row(row: &SearchResult) -> String {
    let mut tags = format!(
        "<span class=\"tag\">{}</span>",
        row.word_type.short_label()
    );
    if let Some(aspect) = row.word_aspect {
        tags.push_str(&format!(
            "<span class=\"tag\">{}</span>",
            aspect.short_label()
        ));
    }
    let mut extras = String::new();
    if let Some(note) = &row.root_word_note {
        extras.push_str(&format!(
            "<div class=\"muted\">{}</div>",
            escape_html(note)
        ));
    }
    if let (Some(czech), Some(english)) = (&row.example_czech, &row.example_english) {
        extras.push_str(&format!(
            "<div class=\"example\">{} <span class=\"muted\">{}</span></div>",
            escape_html(czech),
            escape_html(english)
        ));
    }
    format!(
        "<li><a href=\"/word?id={id}\"><strong>{matched}</strong></a> \
         <span class=\"muted\">{form_type}</span> {tags} \
         <div>{czech} — {english}</div>{extras}</li>",
        id = row.root_word_id,
        matched = escape_html(&row.matched_form),
        form_type = escape_html(&row.form_type_name),
        czech = escape_html(&row.root_word_czech),
        english = escape_html(&row.root_word_english),
    )
}

async fn word_page<B, V>(
    State(state): State<Arc<AppState<B, V>>>,
    headers: HeaderMap,
    Query(params): Query<WordParams>,
) -> Result<Response, ApiError>
where
    B: SearchService + WordStore + 'static,
    V: Vocabulary + 'static,
{
    let mut details = match state.detail.load(params.id).await {
        Ok(details) => details,
        Err(err) => {
            let api = ApiError::from(err);
            return Ok(error_page(api.status, &api.message));
        }
    };
    if params.full.is_some() {
        details.expand_all();
    }

    let (visitor, is_new) = match visitor_from_headers(&headers) {
        Some(id) => (id, false),
        None => (new_visitor_id(), true),
    };
    state
        .stats
        .record_view(&visitor, params.id, &details.root.in_czech);

    let signed_in = state.session.current_user().is_some();
    let mut response =
        Html(page(&details.root.in_czech, &render_word(&details, signed_in))).into_response();
    if is_new {
        let cookie = Cookie::build((VISITOR_COOKIE, visitor))
            .path("/")
            .http_only(true)
            .build();
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    Ok(response)
}

fn render_word(details: &WordDetails, signed_in: bool) -> String {
    let root = &details.root;
    let mut body = format!(
        "<p class=\"muted\"><a href=\"/\">\u{2190} Search</a></p>\
         <h1>{}</h1><p class=\"lede\">{}</p>",
        escape_html(&root.in_czech),
        escape_html(&root.in_english)
    );
    body.push_str(&format!(
        "<p><span class=\"tag\">{}</span>",
        escape_html(&root.word_type.to_string())
    ));
    if let Some(aspect) = root.word_aspect {
        body.push_str(&format!(
            "<span class=\"tag\">{}</span>",
            aspect.short_label()
        ));
    }
    body.push_str("</p>");
    if let Some(note) = &root.note {
        body.push_str(&format!("<p class=\"muted\">{}</p>", escape_html(note)));
    }

    if signed_in {
        body.push_str(&format!(
            "<form method=\"post\" action=\"/api/vocabulary\">\
             <input type=\"hidden\" name=\"root_word_id\" value=\"{}\">\
             <button type=\"submit\">Save to my vocabulary</button></form>",
            root.id
        ));
    }

    for section in details.sections() {
        body.push_str(&render_section(section));
    }
    if details.sections().iter().any(FormSection::has_remainder) {
        body.push_str(&format!(
            "<p class=\"muted\"><a href=\"/word?id={}&amp;full=1\">Expand all</a></p>",
            root.id
        ));
    }
    body
}

fn render_section(section: &FormSection) -> String {
    let meta = section.meta();
    let mut html = format!(
        "<section data-icon=\"{}\"><h2>{}</h2><ul class=\"forms\">",
        meta.icon, meta.label
    );
    for entry in section.preview() {
        html.push_str(&render_form_entry(entry));
    }
    html.push_str("</ul>");
    if section.has_remainder() {
        let open = if section.is_expanded() { " open" } else { "" };
        html.push_str(&format!(
            "<details{open}><summary>\u{2026} and {} more</summary><ul class=\"forms\">",
            section.remainder().len()
        ));
        for entry in section.remainder() {
            html.push_str(&render_form_entry(entry));
        }
        html.push_str("</ul></details>");
    }
    html.push_str("</section>");
    html
}

fn render_form_entry(entry: &FormEntry) -> String {
    let mut html = format!(
        "<li><strong>{}</strong>",
        escape_html(&entry.form.form_in_czech)
    );
    if !entry.description.is_empty() {
        html.push_str(&format!(
            " <span class=\"muted\">{}</span>",
            escape_html(&entry.description)
        ));
    }
    if let Some(example) = &entry.example {
        html.push_str(&format!(
            "<div class=\"example\">{} <span class=\"muted\">{}</span></div>",
            escape_html(&example.czech_sentence),
            escape_html(&example.english_sentence)
        ));
    }
    html.push_str("</li>");
    html
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<h1>Something went wrong</h1><p class=\"error\">{}</p>\
         <p><a href=\"/\">Back to search</a></p>",
        escape_html(message)
    );
    (status, Html(page("Error", &body))).into_response()
}

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;max-width:44rem;margin:2rem auto;padding:0 1rem;\
color:#1f2933;line-height:1.5}\
a{color:#2456a8}\
h1{margin-bottom:.25rem}\
.lede{color:#52606d;font-size:1.15rem;margin-top:0}\
.muted{color:#7b8794;font-size:.9rem}\
.tag{display:inline-block;background:#e4e7eb;border-radius:.25rem;padding:0 .4rem;\
margin-right:.3rem;font-size:.8rem}\
.example{font-style:italic;margin:.2rem 0 .4rem}\
.searchbox input{padding:.4rem;width:70%}\
.searchbox button{padding:.4rem .8rem}\
ul.results,ul.forms,ul.wordlist{list-style:none;padding-left:0}\
ul.results li{border-bottom:1px solid #e4e7eb;padding:.5rem 0}\
ul.forms li{padding:.2rem 0}\
details summary{cursor:pointer;color:#2456a8}\
.error{color:#ab091e}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title} · Slovíčka</title><style>{STYLE}</style></head>\
         <body><main>{body}</main></body></html>",
        title = escape_html(title),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn visitor_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for cookie in Cookie::split_parse(raw).flatten() {
        if cookie.name() == VISITOR_COOKIE {
            return Some(cookie.value().to_string());
        }
    }
    None
}

fn new_visitor_id() -> String {
    SmallRng::from_entropy()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
