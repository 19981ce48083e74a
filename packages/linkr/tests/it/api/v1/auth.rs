//! Integration tests for request signing on the write endpoints.

use base64::{Engine, engine::general_purpose::STANDARD};
use clients::linkr::v1::{Credentials, DigestClaims, Signature};
use color_eyre::Result;
use pretty_assertions::assert_eq as pretty_assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use sqlx::SqlitePool;

use crate::helpers::TestFixture;

fn link_body(url: &str) -> String {
    json!({ "redirect_url": url }).to_string()
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn missing_headers(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let response = fixture
        .post("v1/api/create", None, &link_body("https://example.com"))
        .await?;
    pretty_assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn undecodable_api_key(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let body = link_body("https://example.com");
    let signature = Signature {
        api_key: String::from("%%%"),
        ..fixture.admin.sign(&body)?
    };

    let response = fixture.post("v1/api/create", Some(&signature), &body).await?;
    pretty_assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn unknown_client(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let stranger = Credentials::new("api_unknown-20240101", fixture.admin.signing_key.clone());

    let response = fixture
        .post_signed("v1/api/create", &stranger, &link_body("https://example.com"))
        .await?;
    pretty_assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn replayed_digest_with_other_body(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let signature = fixture.admin.sign(link_body("https://example.com"))?;

    let response = fixture
        .post("v1/api/create", Some(&signature), &link_body("https://evil.test"))
        .await?;
    pretty_assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    pretty_assert_eq!(response.text().await?, "failed to verify payload");
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn digest_signed_with_another_key(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let impostor = Credentials::new(
        fixture.admin.client_id.clone(),
        fixture.read_only.signing_key.clone(),
    );

    let response = fixture
        .post_signed("v1/api/create", &impostor, &link_body("https://example.com"))
        .await?;
    pretty_assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn subject_mismatch(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let body = link_body("https://example.com");

    // Claims for the read-only client, sent under the admin's API key.
    let claims = DigestClaims::new(fixture.read_only.client_id.clone(), body.clone());
    let signature = Signature {
        api_key: STANDARD.encode(&fixture.admin.client_id),
        ..Credentials::new(
            fixture.read_only.client_id.clone(),
            fixture.admin.signing_key.clone(),
        )
        .sign_claims(&claims)?
    };

    let response = fixture.post("v1/api/create", Some(&signature), &body).await?;
    pretty_assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn expired_digest(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let body = link_body("https://example.com");
    let mut claims = DigestClaims::new(fixture.admin.client_id.clone(), body.clone());
    claims.exp = Some(1);
    let signature = fixture.admin.sign_claims(&claims)?;

    let response = fixture.post("v1/api/create", Some(&signature), &body).await?;
    pretty_assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn digest_without_expiry_is_accepted(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let body = link_body("https://example.com");
    let claims = DigestClaims::new(fixture.write_only.client_id.clone(), body.clone());
    let signature = fixture.write_only.sign_claims(&claims)?;

    let response = fixture.post("v1/api/create", Some(&signature), &body).await?;
    pretty_assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn redirects_need_no_credentials(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let response = fixture.get("nothing-here").await?;
    pretty_assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
