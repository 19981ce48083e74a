//! Integration tests for following shortened links.

use color_eyre::Result;
use linkr::db::NewLink;
use pretty_assertions::assert_eq as pretty_assert_eq;
use reqwest::{StatusCode, header::LOCATION};
use sqlx::SqlitePool;
use time::{Duration, OffsetDateTime};

use crate::helpers::TestFixture;

fn link(namespace_id: linkr::db::NamespaceId, identifier: &str, expires_at: Option<OffsetDateTime>) -> NewLink {
    NewLink {
        identifier: identifier.to_string(),
        destination_url: format!("https://example.com/{identifier}"),
        namespace_id,
        expires_in: expires_at.map(|_| 60),
        expires_at,
        headers: None,
        created_at: OffsetDateTime::now_utc() - Duration::hours(1),
    }
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn follows_links_in_both_namespaces(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let default = fixture.db.ensure_default_namespace().await?;
    let team = fixture.db.get_or_create_namespace("team").await?;
    fixture.db.create_link(link(default, "home", None)).await?;
    fixture.db.create_link(link(team, "docs", None)).await?;

    for (path, location) in [
        ("home", "https://example.com/home"),
        ("team/docs", "https://example.com/docs"),
    ] {
        let response = fixture.get(path).await?;
        pretty_assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        pretty_assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some(location)
        );
    }

    // Identifiers don't leak across namespaces.
    pretty_assert_eq!(fixture.get("docs").await?.status(), StatusCode::NOT_FOUND);
    pretty_assert_eq!(fixture.get("team/home").await?.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn expired_links_are_gone(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    let default = fixture.db.ensure_default_namespace().await?;
    let expired = OffsetDateTime::now_utc() - Duration::minutes(1);
    let live = OffsetDateTime::now_utc() + Duration::hours(1);
    fixture.db.create_link(link(default, "old", Some(expired))).await?;
    fixture.db.create_link(link(default, "new", Some(live))).await?;

    pretty_assert_eq!(fixture.get("old").await?.status(), StatusCode::NOT_FOUND);
    pretty_assert_eq!(
        fixture.get("new").await?.status(),
        StatusCode::TEMPORARY_REDIRECT
    );

    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn unknown_namespace_is_not_created(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    pretty_assert_eq!(
        fixture.get("nowhere/abc").await?.status(),
        StatusCode::NOT_FOUND
    );
    pretty_assert_eq!(fixture.db.namespace_by_tag("nowhere").await?, None);
    Ok(())
}

#[sqlx::test(migrator = "linkr::db::Sqlite::MIGRATOR")]
async fn reserved_namespace_path(pool: SqlitePool) -> Result<()> {
    let fixture = TestFixture::spawn(pool).await?;
    pretty_assert_eq!(fixture.get("-/abc").await?.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
