use axum_pizzeria_api::routes::health::ping;

#[tokio::test]
async fn ping_returns_ok() {
    let response = ping().await;
    assert_eq!(response.0.message, "pong");

    let data = response.0.data.expect("ping data");
    assert_eq!(data.status, "ok");
}
