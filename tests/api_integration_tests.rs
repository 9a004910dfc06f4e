use adsearch::api_connection::{ApiConnectionError, ChatCompletionRequest, ChatMessage, Provider};
use adsearch::catalog::builtin_templates;
use adsearch::config::Settings;
use adsearch::language::{BackendState, OpenRouterTranslator, TranslationBackend, Translator};
use adsearch::search_index::SearchIndexClient;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_MODEL: &str = "test/translator";

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "gen-1",
        "model": TEST_MODEL,
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": { "role": "assistant", "content": content }
        }]
    })
}

fn translator_for(server: &MockServer) -> Translator {
    let provider = Provider::openrouter_with_key("test-key", &server.uri());
    Translator::with_backend(Arc::new(OpenRouterTranslator::new(provider, TEST_MODEL)))
}

#[tokio::test]
async fn test_missing_api_key_error() {
    let result = Provider::openrouter("THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ", "http://localhost");
    match result {
        Err(ApiConnectionError::MissingApiKey(key_name)) => {
            assert_eq!(key_name, "THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ")
        }
        other => panic!("expected MissingApiKey, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_translator_without_key_is_identity() {
    let settings = Settings {
        api_key_env_var: "THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ".to_string(),
        ..Settings::default()
    };
    let translator = Translator::from_settings(&settings);

    assert_eq!(translator.translate("zapatillas para correr").await, "zapatillas para correr");
    match translator.state() {
        BackendState::Unavailable { reason } => assert!(reason.contains("API key not found")),
        other => panic!("expected Unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_completion_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Paris")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Provider::openrouter_with_key("test-key", &server.uri());
    let request = ChatCompletionRequest {
        model: TEST_MODEL.to_string(),
        messages: vec![ChatMessage::user("What is the capital of France?")],
        temperature: None,
        max_tokens: None,
        seed: None,
    };
    let response = provider.call_chat_completion(&request).await.unwrap();
    assert_eq!(response.first_content(), Some("Paris"));
}

#[tokio::test]
async fn test_api_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let provider = Provider::openrouter_with_key("wrong", &server.uri());
    let request = ChatCompletionRequest {
        model: TEST_MODEL.to_string(),
        messages: vec![ChatMessage::user("hi")],
        temperature: None,
        max_tokens: None,
        seed: None,
    };
    match provider.call_chat_completion(&request).await {
        Err(ApiConnectionError::ApiError { status, error_body }) => {
            assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
            assert_eq!(error_body, "bad key");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_translation_sends_deterministic_request_and_cleans_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": TEST_MODEL,
            "temperature": 0.0,
            "max_tokens": 256
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("  \"running shoes\"\n")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let translator = translator_for(&server);
    assert_eq!(translator.translate("zapatillas para correr").await, "running shoes");
    assert_eq!(translator.translate("zapatillas para correr").await, "running shoes");
}

#[tokio::test]
async fn test_translation_server_error_falls_back_to_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let translator = translator_for(&server);
    assert_eq!(translator.translate("chaussures de course").await, "chaussures de course");
    assert!(translator.is_available());
}

#[tokio::test]
async fn test_translation_empty_content_falls_back_to_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("   ")))
        .mount(&server)
        .await;

    let translator = translator_for(&server);
    assert_eq!(translator.translate("Laufschuhe").await, "Laufschuhe");
}

#[tokio::test]
async fn test_translation_reports_empty_responses() {
    let blank = completion_body("```text\n```");
    let no_choices = json!({ "id": "gen-2", "model": TEST_MODEL, "choices": [] });

    for body in [blank, no_choices] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let provider = Provider::openrouter_with_key("test-key", &server.uri());
        let backend = OpenRouterTranslator::new(provider, TEST_MODEL);
        let err = backend.translate("Laufschuhe").await.unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<ApiConnectionError>(),
                Some(ApiConnectionError::EmptyResponse(_))
            ),
            "unexpected error for {}: {:#}",
            body,
            err
        );
    }
}

#[tokio::test]
async fn test_ensure_index_creates_missing_index() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/ad_templates"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/ad_templates"))
        .and(body_partial_json(json!({
            "mappings": { "properties": { "tags": { "type": "keyword" } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SearchIndexClient::new(&server.uri(), "ad_templates");
    assert!(client.ensure_index().await.unwrap());
}

#[tokio::test]
async fn test_ensure_index_skips_existing_index() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/ad_templates"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = SearchIndexClient::new(&server.uri(), "ad_templates");
    assert!(!client.ensure_index().await.unwrap());
}

#[tokio::test]
async fn test_index_templates_upserts_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/ad_templates/_doc/4"))
        .and(body_partial_json(json!({
            "template_id": 4,
            "category": "shoes",
            "tags": ["running", "comfort"]
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/ad_templates/_doc/4"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/ad_templates/_doc/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = SearchIndexClient::new(&server.uri(), "ad_templates");
    assert_eq!(client.index_templates(&builtin_templates()).await.unwrap(), 5);
    assert!(client.document_exists(4).await.unwrap());
    assert!(!client.document_exists(99).await.unwrap());
}

#[tokio::test]
async fn test_index_templates_reports_rejections() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400).set_body_string("mapper_parsing_exception"))
        .mount(&server)
        .await;

    let client = SearchIndexClient::new(&server.uri(), "ad_templates");
    match client.index_templates(&builtin_templates()).await {
        Err(ApiConnectionError::ApiError { status, error_body }) => {
            assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
            assert!(error_body.contains("mapper_parsing_exception"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}
