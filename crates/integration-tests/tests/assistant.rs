//! Business assistant endpoints against a fake upstream.

use leafspring_crm_integration_tests::{TestContext, UpstreamReply};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_chat_grounds_question_in_crm_data() {
    let ctx = TestContext::start(vec![UpstreamReply::answer("Gulf Cargo is your only UAE account.")]).await;
    let token = ctx.admin_token().await;
    ctx.request(
        Method::POST,
        "/api/customers",
        Some(&token),
        Some(json!({ "name": "Omar Haddad", "company": "Gulf Cargo", "country": "UAE" })),
    )
    .await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/ai/chat",
            Some(&token),
            Some(json!({ "message": "Who do we sell to in the UAE?", "apiKey": "sk-live" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "response": "Gulf Cargo is your only UAE account." })
    );

    let requests = ctx.upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer sk-live"));
    let sent = &requests[0].body;
    assert_eq!(sent["model"], "moonshot-v1-32k");
    assert!(sent.get("tools").is_none());
    assert_eq!(sent["messages"][0]["role"], "system");
    let system = sent["messages"][0]["content"].as_str().expect("system prompt");
    assert!(system.contains("Omar Haddad"));
    assert_eq!(sent["messages"][1]["content"], "Who do we sell to in the UAE?");
}

#[tokio::test]
async fn test_research_runs_the_tool_round_trip() {
    let ctx = TestContext::start(vec![
        UpstreamReply::tool_call("call-1", "web_search", r#"{"search_result":"..."}"#),
        UpstreamReply::answer("Gulf Cargo runs 300 trucks."),
    ])
    .await;
    let token = ctx.admin_token().await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/ai/research-company",
            Some(&token),
            Some(json!({ "query": "Gulf Cargo LLC", "apiKey": "sk-live" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Gulf Cargo runs 300 trucks.");

    let requests = ctx.upstream.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].body["tools"],
        json!([{ "type": "builtin_function", "function": { "name": "web_search" } }])
    );

    let follow_up = &requests[1].body;
    assert!(follow_up.get("tools").is_none());
    let messages = follow_up["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["tool_calls"][0]["id"], "call-1");
    assert_eq!(
        messages[3],
        json!({
            "role": "tool",
            "tool_call_id": "call-1",
            "name": "web_search",
            "content": r#"{"search_result":"..."}"#
        })
    );
}

#[tokio::test]
async fn test_research_falls_back_to_plain_completion() {
    let ctx = TestContext::start(vec![
        UpstreamReply::error(400, "tools are not supported for this model"),
        UpstreamReply::answer("From general knowledge: a logistics firm."),
    ])
    .await;
    let token = ctx.admin_token().await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/ai/research-company",
            Some(&token),
            Some(json!({ "query": "Gulf Cargo LLC", "apiKey": "sk-live" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "From general knowledge: a logistics firm.");
    let requests = ctx.upstream.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].body.get("tools").is_none());
    assert_eq!(requests[1].body["messages"], requests[0].body["messages"]);
}

#[tokio::test]
async fn test_research_double_failure_is_bad_gateway() {
    let ctx = TestContext::start(vec![
        UpstreamReply::error(503, "overloaded"),
        UpstreamReply::error(401, "Invalid Authentication"),
    ])
    .await;
    let token = ctx.admin_token().await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/ai/research-company",
            Some(&token),
            Some(json!({ "query": "Gulf Cargo LLC", "apiKey": "sk-wrong" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().expect("message");
    assert!(message.contains("Invalid Authentication"));
    assert!(!message.contains("overloaded"));
    assert!(!message.contains("sk-wrong"));
}

#[tokio::test]
async fn test_analyze_customer_scopes_prompt_to_one_customer() {
    let ctx = TestContext::start(vec![UpstreamReply::answer("High value, reorder soon.")]).await;
    let token = ctx.admin_token().await;
    let token = Some(token.as_str());

    let (_, body) = ctx
        .request(
            Method::POST,
            "/api/customers",
            token,
            Some(json!({ "name": "Ana Silva", "company": "Frota Sul" })),
        )
        .await;
    let ana = body["data"]["id"].as_str().expect("id").to_string();
    ctx.request(
        Method::POST,
        "/api/customers",
        token,
        Some(json!({ "name": "Bruno Costa" })),
    )
    .await;
    ctx.request(
        Method::POST,
        "/api/orders",
        token,
        Some(json!({ "customerId": ana, "productName": "Bus leaf spring", "quantity": 40 })),
    )
    .await;

    let (status, body) = ctx
        .request(
            Method::POST,
            &format!("/api/ai/analyze-customer/{ana}"),
            token,
            Some(json!({ "apiKey": "sk-live" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "High value, reorder soon.");
    let requests = ctx.upstream.requests();
    let system = requests[0].body["messages"][0]["content"]
        .as_str()
        .expect("system prompt");
    assert!(system.contains("Ana Silva"));
    assert!(system.contains("Bus leaf spring"));
    assert!(!system.contains("Bruno Costa"));
}

#[tokio::test]
async fn test_rejected_requests_never_reach_upstream() {
    let ctx = TestContext::start(vec![UpstreamReply::answer("unused")]).await;
    let token = ctx.admin_token().await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/ai/research-company",
            Some(&token),
            Some(json!({ "query": "Gulf Cargo LLC" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = ctx
        .request(
            Method::POST,
            "/api/ai/analyze-customer/c-missing",
            Some(&token),
            Some(json!({ "apiKey": "sk-live" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(ctx.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_chat_with_unreachable_upstream_is_bad_gateway() {
    let ctx = TestContext::start_unreachable().await;
    let token = ctx.admin_token().await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/ai/chat",
            Some(&token),
            Some(json!({ "message": "How many customers?", "apiKey": "sk-live" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({ "success": false, "message": "AI service unavailable" })
    );
}

#[tokio::test]
async fn test_research_with_unreachable_upstream_fails_after_fallback() {
    let ctx = TestContext::start_unreachable().await;
    let token = ctx.admin_token().await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/ai/research-company",
            Some(&token),
            Some(json!({ "query": "Gulf Cargo LLC", "apiKey": "sk-live" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "AI analysis failed: AI service unavailable");
    assert!(!body.to_string().contains("127.0.0.1"));
}
