//! Drives a live server on an ephemeral port through the client.

use ledger_client::{ClientError, LedgerClient};
use ledger_hex::{LedgerService, inbound::HttpServer};
use ledger_repo::SqliteRepo;
use sqlx::SqlitePool;

async fn spawn_server() -> (LedgerClient, SqlitePool) {
    let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
    let pool = repo.pool().clone();
    let router = HttpServer::new(LedgerService::new(repo)).router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (LedgerClient::new(format!("http://{}", addr)), pool)
}

async fn seed_user(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (first_name, last_name) VALUES ('Ada', 'Lovelace') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_invoice_lifecycle_through_client() {
    let (client, pool) = spawn_server().await;
    assert!(client.health().await.unwrap());
    let user_id = seed_user(&pool).await;

    client.create_invoice(user_id, 150.0, "order1").await.unwrap();
    let invoice_id: i64 = sqlx::query_scalar("SELECT id FROM invoices WHERE label = 'order1'")
        .fetch_one(&pool)
        .await
        .unwrap();

    client.settle_invoice(invoice_id, 150.0, "wire-001").await.unwrap();

    let users = client.list_users(None, None).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user_id, user_id);
    assert_eq!(users[0].balance, 150.0);

    let replay = client.settle_invoice(invoice_id, 150.0, "wire-001").await;
    assert!(matches!(replay, Err(ClientError::Api { status: 400, .. })));
}

#[tokio::test]
async fn test_api_errors_carry_message() {
    let (client, _pool) = spawn_server().await;

    let err = client
        .create_invoice(999_999, 150.0, "order1")
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("999999"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}
