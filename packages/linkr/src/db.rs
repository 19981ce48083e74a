//! Database interface.
//!
//! Types in this module don't implement `Serialize` or `Deserialize`; the
//! wire types live in the `clients` crate and handlers convert between them.

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};

use color_eyre::{
    Result,
    eyre::{Context, bail, eyre},
};
use derive_more::{Debug, Display};
use sqlx::{
    SqlitePool,
    migrate::{Migrate, Migrator},
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use time::OffsetDateTime;
use tracing::debug;

use crate::auth::{ApiClient, ClientId, Role, SigningKey};

/// An ID uniquely identifying a namespace.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct NamespaceId(i64);

impl NamespaceId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// A shortened link as stored in the database.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub identifier: String,
    pub destination_url: String,
    #[sqlx(try_from = "i64")]
    pub namespace_id: NamespaceId,
    pub expires_in: Option<i64>,
    pub expires_at: Option<OffsetDateTime>,
    pub headers: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Link {
    /// Report whether the link has expired as of `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl From<i64> for NamespaceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A link that has not been stored yet.
#[derive(Clone, Debug)]
pub struct NewLink {
    pub identifier: String,
    pub destination_url: String,
    pub namespace_id: NamespaceId,
    pub expires_in: Option<i64>,
    pub expires_at: Option<OffsetDateTime>,
    pub headers: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: String,
    role: String,
    signing_key: String,
    username: Option<String>,
    created_at: OffsetDateTime,
}

impl TryFrom<ClientRow> for ApiClient {
    type Error = color_eyre::Report;

    fn try_from(row: ClientRow) -> Result<Self> {
        let role = Role::from_str(&row.role)
            .map_err(|_| eyre!("client {} has unsupported role {:?}", row.id, row.role))?;
        Ok(ApiClient {
            id: ClientId::new(row.id),
            role,
            signing_key: SigningKey::new(row.signing_key),
            username: row.username,
            created_at: row.created_at,
        })
    }
}

/// A connected SQLite database.
#[derive(Clone, Debug)]
#[debug("Sqlite(pool_size = {})", self.pool.size())]
pub struct Sqlite {
    pub pool: SqlitePool,
}

impl Sqlite {
    /// The migrator for the database.
    pub const MIGRATOR: Migrator = sqlx::migrate!("./schema/migrations");

    /// Connect to the database at `url`, creating the file if needed.
    #[tracing::instrument(name = "Sqlite::connect")]
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parse database url {url:?}"))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    /// Apply all pending migrations.
    #[tracing::instrument(name = "Sqlite::migrate")]
    pub async fn migrate(&self) -> Result<()> {
        Self::MIGRATOR
            .run(&self.pool)
            .await
            .context("run migrations")
    }

    /// Ping the database to ensure the connection is alive.
    #[tracing::instrument(name = "Sqlite::ping")]
    pub async fn ping(&self) -> Result<()> {
        let (pong,) = sqlx::query_as::<_, (i64,)>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("ping database")?;
        if pong != 1 {
            bail!("database ping failed; unexpected response: {pong}");
        }
        Ok(())
    }

    /// Check that the schema matches the migrations compiled into this
    /// binary, without applying anything.
    ///
    /// Startup refuses to serve traffic against a database that has pending,
    /// modified, or unknown migrations; `linkr migrate` fixes the first case.
    #[tracing::instrument(name = "Sqlite::validate_migrations")]
    pub async fn validate_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.context("acquire connection")?;
        conn.ensure_migrations_table()
            .await
            .context("ensure migrations table")?;

        if let Some(version) = conn.dirty_version().await.context("check dirty version")? {
            bail!("migration {version} is dirty; resolve it manually and re-run 'linkr migrate'");
        }

        let applied = conn
            .list_applied_migrations()
            .await
            .context("list applied migrations")?
            .into_iter()
            .map(|m| (m.version, m.checksum))
            .collect::<HashMap<_, _>>();
        let known = Self::MIGRATOR
            .iter()
            .filter(|m| m.migration_type.is_up_migration())
            .map(|m| (m.version, m.checksum.clone()))
            .collect::<HashMap<_, _>>();

        let mut pending = Vec::new();
        let mut modified = Vec::new();
        for (version, checksum) in &known {
            match applied.get(version) {
                None => pending.push(*version),
                Some(applied) if applied[..] != checksum[..] => modified.push(*version),
                Some(_) => {}
            }
        }
        let mut unknown = applied
            .keys()
            .copied()
            .collect::<HashSet<_>>()
            .difference(&known.keys().copied().collect())
            .copied()
            .collect::<Vec<_>>();

        pending.sort();
        modified.sort();
        unknown.sort();
        if !pending.is_empty() {
            bail!("pending migrations {pending:?}; run 'linkr migrate' first");
        }
        if !modified.is_empty() {
            bail!("migrations {modified:?} were modified after being applied");
        }
        if !unknown.is_empty() && !Self::MIGRATOR.ignore_missing {
            bail!("database has migrations {unknown:?} unknown to this build");
        }
        Ok(())
    }
}

impl Sqlite {
    /// Make sure the default namespace exists and return its ID.
    ///
    /// Safe to call on every startup.
    #[tracing::instrument(name = "Sqlite::ensure_default_namespace")]
    pub async fn ensure_default_namespace(&self) -> Result<NamespaceId> {
        let tag = clients::linkr::v1::RESERVED_NAMESPACE;
        sqlx::query(
            "INSERT INTO namespace (tag, description) VALUES (?, 'default namespace')
            ON CONFLICT (tag) DO NOTHING",
        )
        .bind(tag)
        .execute(&self.pool)
        .await
        .context("insert default namespace")?;

        self.namespace_by_tag(tag)
            .await?
            .ok_or_else(|| eyre!("default namespace missing after insert"))
    }

    #[tracing::instrument(name = "Sqlite::namespace_by_tag")]
    pub async fn namespace_by_tag(&self, tag: &str) -> Result<Option<NamespaceId>> {
        sqlx::query_as::<_, (i64,)>("SELECT id FROM namespace WHERE tag = ?")
            .bind(tag)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("look up namespace {tag:?}"))
            .map(|row| row.map(|(id,)| NamespaceId(id)))
    }

    /// Return the namespace tagged `tag`, creating it if it doesn't exist.
    ///
    /// The insert and the re-read share a transaction. Concurrent callers
    /// racing to create the same tag all get the row that wins; the losing
    /// inserts are ignored.
    #[tracing::instrument(name = "Sqlite::get_or_create_namespace")]
    pub async fn get_or_create_namespace(&self, tag: &str) -> Result<NamespaceId> {
        if let Some(id) = self.namespace_by_tag(tag).await? {
            return Ok(id);
        }

        let mut tx = self.pool.begin().await.context("begin transaction")?;
        let inserted =
            sqlx::query("INSERT INTO namespace (tag) VALUES (?) ON CONFLICT (tag) DO NOTHING")
                .bind(tag)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("create namespace {tag:?}"))?;
        let (id,) = sqlx::query_as::<_, (i64,)>("SELECT id FROM namespace WHERE tag = ?")
            .bind(tag)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("read back namespace {tag:?}"))?;
        tx.commit().await.context("commit transaction")?;

        debug!(tag, id, created = inserted.rows_affected() > 0, "db.namespace.create");
        Ok(NamespaceId(id))
    }

    #[tracing::instrument(name = "Sqlite::create_client")]
    pub async fn create_client(&self, client: &ApiClient) -> Result<()> {
        sqlx::query(
            "INSERT INTO api_client (id, username, role, signing_key, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(client.id.as_str())
        .bind(client.username.as_deref())
        .bind(client.role.as_ref())
        .bind(client.signing_key.expose())
        .bind(client.created_at)
        .bind(client.created_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("insert client {}", client.id))?;
        Ok(())
    }

    #[tracing::instrument(name = "Sqlite::get_client")]
    pub async fn get_client(&self, id: &ClientId) -> Result<Option<ApiClient>> {
        sqlx::query_as::<_, ClientRow>(
            "SELECT id, role, signing_key, username, created_at FROM api_client WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetch client {id}"))?
        .map(ApiClient::try_from)
        .transpose()
    }

    /// Store a link.
    ///
    /// Fails if the identifier is already taken within the namespace.
    #[tracing::instrument(name = "Sqlite::create_link")]
    pub async fn create_link(&self, link: NewLink) -> Result<Link> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO link
                (identifier, destination_url, namespace_id, expires_in, expires_at, headers, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id",
        )
        .bind(&link.identifier)
        .bind(&link.destination_url)
        .bind(link.namespace_id.as_i64())
        .bind(link.expires_in)
        .bind(link.expires_at)
        .bind(link.headers.as_deref())
        .bind(link.created_at)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("insert link {:?}", link.identifier))?;

        Ok(Link {
            id,
            identifier: link.identifier,
            destination_url: link.destination_url,
            namespace_id: link.namespace_id,
            expires_in: link.expires_in,
            expires_at: link.expires_at,
            headers: link.headers,
            created_at: link.created_at,
        })
    }

    #[tracing::instrument(name = "Sqlite::find_link")]
    pub async fn find_link(&self, namespace: NamespaceId, identifier: &str) -> Result<Option<Link>> {
        sqlx::query_as::<_, Link>(
            "SELECT id, identifier, destination_url, namespace_id, expires_in, expires_at, headers, created_at
            FROM link
            WHERE namespace_id = ? AND identifier = ?",
        )
        .bind(namespace.as_i64())
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetch link {identifier:?} in namespace {namespace}"))
    }
}
