mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

/// Trigger webhooks reject requests without the shared-secret header. With no
/// secret configured the endpoints reject everything instead of running open.
#[tokio::test]
async fn trigger_webhooks_require_secret() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let routes = [
        "/webhooks/listings/created",
        "/webhooks/listings/updated",
        "/webhooks/messages/created",
    ];

    for route in routes {
        // Missing header
        let res = client
            .post(format!("{}{}", server.base_url, route))
            .json(&json!({ "record": {} }))
            .send()
            .await?;
        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "{} without secret",
            route
        );

        // Wrong header value
        let res = client
            .post(format!("{}{}", server.base_url, route))
            .header("x-webhook-secret", "wrong")
            .json(&json!({ "record": {} }))
            .send()
            .await?;
        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "{} with wrong secret",
            route
        );
    }

    Ok(())
}

#[tokio::test]
async fn billing_webhook_requires_signature() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // No signature header at all
    let res = client
        .post(format!("{}/webhooks/billing", server.base_url))
        .json(&json!({ "type": "customer.subscription.updated" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Malformed signature header
    let res = client
        .post(format!("{}/webhooks/billing", server.base_url))
        .header("stripe-signature", "t=notanumber,v1=zz")
        .json(&json!({ "type": "customer.subscription.updated" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
