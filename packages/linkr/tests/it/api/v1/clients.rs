//! Integration tests for API client creation.

use clients::linkr::v1::{
    ApiResponse, ClientCreated, CreateClientRequest, CreateLinkRequest, Credentials, Role,
};
use color_eyre::Result;
use linkr::auth::ClientId;
use pretty_assertions::assert_eq as pretty_assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use sqlx::SqlitePool;

use crate::helpers::TestFixture;

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn admin_creates_working_client(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let request = CreateClientRequest::builder()
        .client_type("read-write")
        .username("dana")
        .build();

    let created = fixture.client(&fixture.admin).create_client(&request).await?;
    pretty_assert_eq!(created.role, Role::ReadWrite);
    assert!(created.client_id.starts_with("api_"));

    let stored = fixture
        .db
        .get_client(&ClientId::new(created.client_id.clone()))
        .await?
        .expect("client stored");
    pretty_assert_eq!(stored.username.as_deref(), Some("dana"));

    let link = CreateLinkRequest::builder()
        .redirect_url("https://example.com")
        .build();
    fixture
        .client(&Credentials::from(&created))
        .create_link(&link)
        .await?;

    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn role_defaults_to_write_only(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let response = fixture
        .post_signed("v1/api/client/create", &fixture.admin, "{}")
        .await?;
    pretty_assert_eq!(response.status(), StatusCode::CREATED);

    let envelope = response.json::<ApiResponse<ClientCreated>>().await?;
    pretty_assert_eq!(envelope.message, "client created");
    pretty_assert_eq!(envelope.details.role, Role::WriteOnly);
    assert!(!envelope.details.client_signing_key.is_empty());

    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn unknown_role_is_rejected(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let body = json!({ "client_type": "superuser" }).to_string();

    let response = fixture
        .post_signed("v1/api/client/create", &fixture.admin, &body)
        .await?;
    pretty_assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    pretty_assert_eq!(
        response.text().await?,
        "unknown role type 'superuser'. supported roles are admin, read-write, read-only, write-only"
    );

    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn only_admins_create_clients(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let body = json!({ "client_type": "admin" }).to_string();

    for credentials in [&fixture.read_write, &fixture.write_only, &fixture.read_only] {
        let response = fixture
            .post_signed("v1/api/client/create", credentials, &body)
            .await?;
        pretty_assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM api_client WHERE role = 'admin'")
        .fetch_one(&fixture.db.pool)
        .await?;
    pretty_assert_eq!(count, 1);

    Ok(())
}
