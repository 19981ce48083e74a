use color_eyre::Result;
use pretty_assertions::assert_eq as pretty_assert_eq;
use reqwest::StatusCode;
use sqlx::SqlitePool;

use crate::helpers::TestFixture;

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn healthy(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let response = fixture.get("v1/health").await?;
    pretty_assert_eq!(response.status(), StatusCode::OK);
    pretty_assert_eq!(response.text().await?, "ok");
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn cors_preflight(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let response = fixture
        .http
        .request(reqwest::Method::OPTIONS, fixture.base_url.join("v1/api/create")?)
        .header("Origin", "https://app.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await?;

    pretty_assert_eq!(response.status(), StatusCode::OK);
    pretty_assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    Ok(())
}
