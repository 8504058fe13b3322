mod common;

use assert_matches::assert_matches;
use genproxy_client::endpoints::{
    paths, AudioClient, AudioRequest, ChatClient, ChatMessage, ChatRequest, TokenClient,
};
use genproxy_client::transport::Method;
use genproxy_core::ClientError;
use serde_json::json;

use common::{ok, status, ScriptedTransport};

#[tokio::test]
async fn chat_returns_first_choice() {
    let transport = ScriptedTransport::new(vec![ok(json!({
        "choices": [{ "message": { "role": "assistant", "content": "Hi there" } }]
    }))]);
    let client = ChatClient::new(transport.clone());

    let request = ChatRequest::new(
        "gpt-4o-mini",
        vec![ChatMessage::system("Be brief."), ChatMessage::user("Hello")],
    );
    assert_eq!(client.complete(&request).await.unwrap(), "Hi there");

    let call = &transport.calls()[0];
    assert_eq!(call.path, paths::CHAT);
    let body = call.body.as_ref().unwrap();
    assert_eq!(body["messages"][1]["content"], "Hello");
    assert_eq!(body["max_tokens"], 1024);
}

#[tokio::test]
async fn chat_without_messages_never_hits_the_network() {
    let transport = ScriptedTransport::new(vec![]);
    let client = ChatClient::new(transport.clone());

    let err = client
        .complete(&ChatRequest::new("gpt-4o-mini", vec![]))
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::InvalidRequest(_));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn earn_posts_amount_and_action() {
    let transport = ScriptedTransport::new(vec![ok(json!({
        "success": true, "tokensEarned": 10, "newBalance": 110
    }))]);
    let client = TokenClient::new(transport.clone());

    let resp = client.earn(10, "daily_login").await.unwrap();
    assert_eq!(resp.tokens_earned, 10);
    assert_eq!(resp.new_balance, 110);

    let call = &transport.calls()[0];
    assert_eq!(call.path, paths::EARN_TOKENS);
    assert_eq!(call.body, Some(json!({ "amount": 10, "action": "daily_login" })));
}

#[tokio::test]
async fn earn_over_server_limit_is_http_error() {
    let transport = ScriptedTransport::new(vec![status(
        400,
        json!({ "error": "Daily earning limit reached" }),
    )]);
    let client = TokenClient::new(transport);

    assert_eq!(
        client.earn(50, "share").await.unwrap_err(),
        ClientError::Http {
            status: 400,
            message: "Daily earning limit reached".into()
        }
    );
}

#[tokio::test]
async fn token_data_is_a_get() {
    let transport = ScriptedTransport::new(vec![ok(json!({
        "token_balance": 420, "credits_balance": 3, "daily_earned": 20, "daily_limit": 100
    }))]);
    let client = TokenClient::new(transport.clone());

    let data = client.token_data().await.unwrap();
    assert_eq!(data.token_balance, 420);
    assert_eq!(data.daily_limit, Some(100));
    assert_eq!(transport.calls()[0].method, Method::Get);
}

#[tokio::test(start_paused = true)]
async fn audio_polls_its_fetch_endpoint() {
    let transport = ScriptedTransport::new(vec![
        ok(json!({ "status": "processing", "fetchUrl": "https://p/a/1" })),
        ok(json!({ "status": "success", "audioUrl": "https://cdn/rain.mp3" })),
    ]);
    let client = AudioClient::new(transport.clone());

    let result = client
        .generate(&AudioRequest::new("gentle rain").with_duration(30))
        .await
        .unwrap();

    assert_eq!(result.result_url, "https://cdn/rain.mp3");
    assert_eq!(transport.calls()[0].path, paths::AUDIO);
    assert_eq!(transport.calls()[0].body.as_ref().unwrap()["duration_secs"], 30);
    assert_eq!(transport.calls_to(paths::AUDIO_FETCH), 1);
}
