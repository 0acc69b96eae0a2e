//! HTTP API server implementation

use axum::{
    extract::{Json, State},
    middleware,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::core::config::{ServerConfig, TranslatorConfig};
use crate::core::engine::ModelLoader;
use crate::core::errors::TranslationError;
use crate::core::handle::TranslatorHandle;
use crate::detect;
use crate::model_dir;
use crate::server::auth::require_api_key;
use crate::server::error::ApiError;

/// Application state
pub struct AppState {
    /// Shared translator
    pub translator: Arc<TranslatorHandle>,
    /// Server settings
    pub config: ServerConfig,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// Models list response
#[derive(Serialize)]
struct ModelsResponse {
    object: String,
    data: Vec<ModelInfo>,
}

#[derive(Serialize)]
struct ModelInfo {
    id: String,
    object: String,
    from: String,
    to: String,
}

/// Plain translation request
#[derive(Debug, Deserialize)]
pub struct TranslationRequest {
    /// Input text
    pub text: String,
    /// Source language; detected when absent or `auto`
    pub from: Option<String>,
    /// Target language
    pub to: String,
}

/// Plain translation response
#[derive(Debug, Serialize)]
pub struct TranslationResponse {
    /// Translated text
    pub text: String,
    /// Resolved source language
    pub from: String,
    /// Target language
    pub to: String,
}

/// Immersive Translate request
#[derive(Debug, Deserialize)]
pub struct ImmersiveTranslationRequest {
    /// Source language; detected when absent
    pub source_lang: Option<String>,
    /// Target language
    pub target_lang: String,
    /// Texts translated in order
    pub text_list: Vec<String>,
}

/// One translated entry
#[derive(Debug, Serialize)]
pub struct ImmersiveTranslationItem {
    /// Resolved source language
    pub detected_source_lang: String,
    /// Translated text
    pub text: String,
}

/// Immersive Translate response
#[derive(Debug, Serialize)]
pub struct ImmersiveTranslationResponse {
    /// One item per input text
    pub translations: Vec<ImmersiveTranslationItem>,
}

/// Hcfy request, languages given by display name or code
#[derive(Debug, Deserialize)]
pub struct HcfyTranslationRequest {
    /// Input text
    pub text: String,
    /// Source language name or code
    pub source: Option<String>,
    /// Candidate targets, first preferred
    pub destination: Vec<String>,
}

/// Hcfy response
#[derive(Debug, Serialize)]
pub struct HcfyTranslationResponse {
    /// Original text
    pub text: String,
    /// Source language name
    pub from: String,
    /// Target language name
    pub to: String,
    /// Translations
    pub result: Vec<String>,
}

/// DeepLX compatible request
#[derive(Debug, Deserialize)]
pub struct DeeplxTranslationRequest {
    /// Input text
    pub text: String,
    /// Source language, any case
    pub source_lang: String,
    /// Target language, any case
    pub target_lang: String,
}

/// DeepLX compatible response
#[derive(Debug, Serialize)]
pub struct DeeplxTranslationResponse {
    /// HTTP-like status code
    pub code: u32,
    /// Request id in epoch milliseconds
    pub id: i64,
    /// Translated text
    pub data: String,
    /// Always empty
    pub alternatives: Vec<String>,
    /// Source language, upper case
    pub source_lang: String,
    /// Target language, upper case
    pub target_lang: String,
    /// Always `Free`
    pub method: String,
}

/// Language detection request
#[derive(Debug, Deserialize)]
pub struct DetectLanguageRequest {
    /// Text to classify
    pub text: String,
}

/// Language detection response
#[derive(Debug, Serialize)]
pub struct DetectLanguageResponse {
    /// ISO 639-1 code
    pub language: String,
}

/// Display names used by hcfy
const LANGUAGE_NAMES: &[(&str, &str)] = &[("中文(简体)", "zh"), ("英语", "en"), ("日语", "ja")];

fn language_code_from_name(name: &str) -> String {
    LANGUAGE_NAMES
        .iter()
        .find(|&&(display, _)| display == name)
        .map(|&(_, code)| code)
        .unwrap_or(name)
        .to_string()
}

fn language_name_from_code(code: &str) -> String {
    LANGUAGE_NAMES
        .iter()
        .find(|&&(_, c)| c == code)
        .map(|&(display, _)| display)
        .unwrap_or(code)
        .to_string()
}

/// Resolve languages, check support and run the blocking translation off the async workers.
///
/// Returns `(translation, from, to)` with ISO 639-1 codes.
pub async fn perform_translation(
    state: &AppState,
    text: &str,
    from: Option<&str>,
    to: &str,
) -> Result<(String, String, String), ApiError> {
    let from_code = detect::resolve_source(from, text)?;
    let to_code = detect::parse_language_code(to)?;

    if !state.translator.is_supported(from_code, to_code)? {
        return Err(TranslationError::Unsupported {
            from: from_code.to_string(),
            to: to_code.to_string(),
        }
        .into());
    }

    let translator = state.translator.clone();
    let input = text.to_string();
    let translated =
        tokio::task::spawn_blocking(move || translator.translate(from_code, to_code, &input))
            .await
            .map_err(|e| ApiError::Worker(e.to_string()))??;

    Ok((translated, from_code.to_string(), to_code.to_string()))
}

/// Health check handler
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Loaded language pairs
async fn get_models(State(state): State<Arc<AppState>>) -> Result<Json<ModelsResponse>, ApiError> {
    let data = state
        .translator
        .supported_pairs()?
        .into_iter()
        .map(|pair| ModelInfo {
            id: pair.key(),
            object: "model".to_string(),
            from: pair.source,
            to: pair.target,
        })
        .collect();

    Ok(Json(ModelsResponse {
        object: "list".to_string(),
        data,
    }))
}

async fn translate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslationRequest>,
) -> Result<Json<TranslationResponse>, ApiError> {
    let (text, from, to) =
        perform_translation(&state, &request.text, request.from.as_deref(), &request.to).await?;

    Ok(Json(TranslationResponse { text, from, to }))
}

async fn translate_immersive(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImmersiveTranslationRequest>,
) -> Result<Json<ImmersiveTranslationResponse>, ApiError> {
    let mut translations = Vec::with_capacity(request.text_list.len());

    for text in &request.text_list {
        let (translated, from, _) = perform_translation(
            &state,
            text,
            request.source_lang.as_deref(),
            &request.target_lang,
        )
        .await?;

        translations.push(ImmersiveTranslationItem {
            detected_source_lang: from,
            text: translated,
        });
    }

    Ok(Json(ImmersiveTranslationResponse { translations }))
}

async fn translate_hcfy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HcfyTranslationRequest>,
) -> Result<Json<HcfyTranslationResponse>, ApiError> {
    let source = request.source.as_deref().map(language_code_from_name);

    // When the first destination is the source language, translate into the second.
    let target = match (
        request.destination.first(),
        source.as_deref(),
        request.destination.get(1),
    ) {
        (None, _, _) => "en".to_string(),
        (Some(first), Some(src), Some(second)) if language_code_from_name(first) == src => {
            language_code_from_name(second)
        }
        (Some(first), _, _) => language_code_from_name(first),
    };

    let (translated, from, to) =
        perform_translation(&state, &request.text, source.as_deref(), &target).await?;

    Ok(Json(HcfyTranslationResponse {
        text: request.text,
        from: language_name_from_code(&from),
        to: language_name_from_code(&to),
        result: vec![translated],
    }))
}

async fn translate_deeplx(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeeplxTranslationRequest>,
) -> Result<Json<DeeplxTranslationResponse>, ApiError> {
    let source = request.source_lang.to_lowercase();
    let (data, from, to) = perform_translation(
        &state,
        &request.text,
        Some(source.as_str()),
        &request.target_lang.to_lowercase(),
    )
    .await?;

    Ok(Json(DeeplxTranslationResponse {
        code: 200,
        id: chrono::Utc::now().timestamp_millis(),
        data,
        alternatives: vec![],
        source_lang: from.to_uppercase(),
        target_lang: to.to_uppercase(),
        method: "Free".to_string(),
    }))
}

async fn detect_language(
    Json(request): Json<DetectLanguageRequest>,
) -> Result<Json<DetectLanguageResponse>, ApiError> {
    Ok(Json(DetectLanguageResponse {
        language: detect::detect_language(&request.text)?.to_string(),
    }))
}

/// Build the router over a shared state
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/models", get(get_models))
        .route("/translate", post(translate))
        .route("/kiss", post(translate))
        .route("/imme", post(translate_immersive))
        .route("/hcfy", post(translate_hcfy))
        .route("/deeplx", post(translate_deeplx))
        .route("/detect", post(detect_language))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Build the server state: a handle sized by `translator_config` with every
/// model under its `models_dir` loaded through `loader`
pub fn build_state(
    translator_config: &TranslatorConfig,
    server_config: ServerConfig,
    loader: Arc<dyn ModelLoader>,
) -> anyhow::Result<Arc<AppState>> {
    let handle = TranslatorHandle::from_config(translator_config, loader)?;
    let pairs = model_dir::load_models_dir(&handle, &translator_config.models_dir)?;
    info!(
        "Loaded {} models from {}",
        pairs.len(),
        translator_config.models_dir.display()
    );

    Ok(Arc::new(AppState {
        translator: Arc::new(handle),
        config: server_config,
    }))
}

/// Run the HTTP server
pub async fn run_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr: SocketAddr = state.config.address().parse()?;
    if state.config.auth_enabled() {
        info!("API key authentication enabled");
    }

    let app = router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Read the environment, load `MODELS_DIR` with the host's `loader` and serve
pub async fn serve(loader: Arc<dyn ModelLoader>) -> anyhow::Result<()> {
    let translator_config = TranslatorConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;

    let state = tokio::task::spawn_blocking(move || {
        build_state(&translator_config, server_config, loader)
    })
    .await??;

    run_server(state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bridge::DEFAULT_LEG_TIMEOUT;
    use crate::core::engine::{
        CancelToken, EngineError, SharedModel, TranslationJob, TranslationModel, TranslationService,
    };
    use assert_json_diff::assert_json_include;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[derive(Debug)]
    struct Tag(String);

    impl TranslationModel for Tag {
        fn translate(&self, text: &str, _cancel: &CancelToken) -> Result<String, EngineError> {
            Ok(format!("{}[{}]", text, self.0))
        }
    }

    struct Inline;

    impl TranslationService for Inline {
        fn submit(&self, job: TranslationJob) {
            job.execute();
        }
    }

    fn loader(config: &str) -> anyhow::Result<SharedModel> {
        Ok(Arc::new(Tag(config.to_string())))
    }

    fn app(api_key: &str) -> Router {
        let handle = TranslatorHandle::with_service(Arc::new(Inline), Arc::new(loader), DEFAULT_LEG_TIMEOUT);
        handle.load_model("fr", "en", "en").unwrap();
        handle.load_model("en", "de", "de").unwrap();
        handle.load_model("en", "ja", "ja").unwrap();

        let config = ServerConfig {
            api_key: api_key.to_string(),
            ..Default::default()
        };

        router(Arc::new(AppState {
            translator: Arc::new(handle),
            config,
        }))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_translate_via_pivot() {
        let (status, body) = post_json(
            app(""),
            "/translate",
            json!({"text": "Bonjour", "from": "fr", "to": "de"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_json_include!(
            actual: body,
            expected: json!({"text": "Bonjour[en][de]", "from": "fr", "to": "de"})
        );
    }

    #[tokio::test]
    async fn test_unsupported_pair_is_bad_request() {
        let (status, body) = post_json(
            app(""),
            "/translate",
            json!({"text": "Hallo", "from": "de", "to": "fr"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "unsupported");
    }

    #[tokio::test]
    async fn test_immersive_batch() {
        let (status, body) = post_json(
            app(""),
            "/imme",
            json!({"source_lang": "fr", "target_lang": "en", "text_list": ["un", "deux"]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_json_include!(
            actual: body,
            expected: json!({"translations": [
                {"detected_source_lang": "fr", "text": "un[en]"},
                {"detected_source_lang": "fr", "text": "deux[en]"}
            ]})
        );
    }

    #[tokio::test]
    async fn test_hcfy_skips_destination_equal_to_source() {
        let (status, body) = post_json(
            app(""),
            "/hcfy",
            json!({"text": "Hello", "source": "英语", "destination": ["英语", "日语"]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_json_include!(
            actual: body,
            expected: json!({"text": "Hello", "from": "英语", "to": "日语", "result": ["Hello[ja]"]})
        );
    }

    #[tokio::test]
    async fn test_deeplx_uppercases_languages() {
        let (status, body) = post_json(
            app(""),
            "/deeplx",
            json!({"text": "Hello", "source_lang": "EN", "target_lang": "DE"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_json_include!(
            actual: body,
            expected: json!({"code": 200, "data": "Hello[de]", "source_lang": "EN", "target_lang": "DE", "method": "Free", "alternatives": []})
        );
    }

    #[tokio::test]
    async fn test_auth_required_when_key_set() {
        let request = json!({"text": "Bonjour", "from": "fr", "to": "en"});

        let (status, _) = post_json(app("secret"), "/translate", request.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = post_json(app("secret"), "/translate?token=secret", request.clone()).await;
        assert_eq!(status, StatusCode::OK);

        let response = app("secret")
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/translate")
                    .header("Content-Type", "application/json")
                    .header("Authorization", "Bearer secret")
                    .body(Body::from(request.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_models_lists_pairs() {
        let response = app("")
            .oneshot(Request::builder().uri("/models").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let ids: Vec<&str> = body["data"].as_array().unwrap().iter().map(|m| m["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["ende", "enja", "fren"]);
    }

    #[test]
    fn test_health_check() {
        let response = tokio_test::block_on(
            app("").oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()),
        )
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    fn write_pair(root: &std::path::Path, name: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for file in ["model.intgemm.alphas.bin", "vocab.spm", "lex.s2t.bin"] {
            std::fs::write(dir.join(file), b"").unwrap();
        }
    }

    #[test]
    fn test_build_state_loads_models_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_pair(dir.path(), "fren");
        write_pair(dir.path(), "ende");

        let translator_config = TranslatorConfig {
            worker_count: 2,
            timeout_ms: 5_000,
            models_dir: dir.path().to_path_buf(),
        };
        let server_config = ServerConfig {
            port: 8081,
            api_key: "secret".to_string(),
            ..Default::default()
        };
        let pair_loader = |config: &str| -> anyhow::Result<SharedModel> {
            let options = model_dir::parse_config(config)?;
            let model = &options.models[0];
            let key = model.rsplit('/').nth(1).unwrap_or_default().to_string();
            Ok(Arc::new(Tag(key)))
        };

        let state = build_state(&translator_config, server_config, Arc::new(pair_loader)).unwrap();

        assert_eq!(state.config.address(), "127.0.0.1:8081");
        assert!(state.config.auth_enabled());
        assert_eq!(state.translator.timeout(), std::time::Duration::from_secs(5));
        assert_eq!(state.translator.supported_pairs().unwrap().len(), 2);
        assert_eq!(
            state.translator.translate("fr", "de", "Bonjour").unwrap(),
            "Bonjour[fren][ende]"
        );
    }

    #[test]
    fn test_build_state_requires_models_dir() {
        let dir = tempfile::tempdir().unwrap();
        let translator_config = TranslatorConfig {
            models_dir: dir.path().join("missing"),
            ..Default::default()
        };

        assert!(build_state(&translator_config, ServerConfig::default(), Arc::new(loader)).is_err());
    }

    #[test]
    fn test_language_name_mapping() {
        assert_eq!(language_code_from_name("中文(简体)"), "zh");
        assert_eq!(language_code_from_name("fr"), "fr");
        assert_eq!(language_name_from_code("ja"), "日语");
        assert_eq!(language_name_from_code("de"), "de");
    }
}
