//! CRUD, statistics and persistence tests against a running server.

use leafspring_crm_integration_tests::TestContext;
use leafspring_crm_server::store::Store;
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_records_are_written_to_the_data_file() {
    let ctx = TestContext::start(vec![]).await;
    let token = ctx.admin_token().await;
    let token = Some(token.as_str());

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/customers",
            token,
            Some(json!({
                "name": "Omar Haddad",
                "company": "Gulf Cargo",
                "country": "UAE",
                "customerType": "fleet",
                "whatsapp": "+971 50 000 0000"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["createdBy"], "Administrator");
    let customer_id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/orders",
            token,
            Some(json!({ "customerId": customer_id, "productName": "Trailer leaf spring", "quantity": 12 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, _) = ctx
        .request(
            Method::PUT,
            &format!("/api/orders/{order_id}/status"),
            token,
            Some(json!({ "status": "confirmed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let store = Store::open(&ctx.data_file).await.expect("reopen data file");
    let (customers, orders) = store.read(|d| (d.customers.clone(), d.orders.clone()));
    assert_eq!(customers.len(), 1);
    assert_eq!(
        customers[0].extra.get("whatsapp"),
        Some(&json!("+971 50 000 0000"))
    );
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status.as_str(), "confirmed");
}

#[tokio::test]
async fn test_stats_reflect_new_records() {
    let ctx = TestContext::start(vec![]).await;
    let token = ctx.admin_token().await;
    let token = Some(token.as_str());

    for (name, country) in [("Ana", "Brazil"), ("Bruno", "Brazil"), ("Omar", "UAE")] {
        let (status, _) = ctx
            .request(
                Method::POST,
                "/api/customers",
                token,
                Some(json!({ "name": name, "country": country })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    for product in ["Bus leaf spring", "Heavy truck leaf spring"] {
        ctx.request(
            Method::POST,
            "/api/inquiries",
            token,
            Some(json!({ "product": product })),
        )
        .await;
    }

    let (status, body) = ctx.request(Method::GET, "/api/stats", token, None).await;

    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["totalCustomers"], 3);
    assert_eq!(stats["totalInquiries"], 2);
    assert_eq!(stats["newInquiries"], 2);
    assert_eq!(stats["pendingOrders"], 0);
    assert_eq!(stats["customerCountries"], json!({ "Brazil": 2, "UAE": 1 }));
    assert_eq!(stats["recentInquiries"][0]["product"], "Heavy truck leaf spring");
}

#[tokio::test]
async fn test_unknown_records_are_not_found() {
    let ctx = TestContext::start(vec![]).await;
    let token = ctx.admin_token().await;

    let (status, body) = ctx
        .request(
            Method::PUT,
            "/api/inquiries/INQ0",
            Some(&token),
            Some(json!({ "status": "closed" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "Inquiry not found" }));
}
