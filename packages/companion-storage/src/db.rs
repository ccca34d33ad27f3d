use std::{str::FromStr, time::Duration};

use sqlx::{
	SqlitePool,
	sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::{Result, schema};

pub struct Db {
	pub pool: SqlitePool,
}
impl Db {
	pub async fn connect(cfg: &companion_config::Sqlite) -> Result<Self> {
		let in_memory = cfg.dsn.contains(":memory:") || cfg.dsn.contains("mode=memory");
		let mut options = SqliteConnectOptions::from_str(&cfg.dsn)?.create_if_missing(true);

		if !in_memory {
			options = options.journal_mode(SqliteJournalMode::Wal);
		}

		let mut pool_options = SqlitePoolOptions::new().max_connections(cfg.pool_max_conns);

		// An in-memory database lives exactly as long as its connection.
		if in_memory {
			pool_options = pool_options
				.min_connections(1)
				.idle_timeout(None::<Duration>)
				.max_lifetime(None::<Duration>);
		}

		let pool = pool_options.connect_with(options).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let mut tx = self.pool.begin().await?;
		let mut statements = 0;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;

			statements += 1;
		}

		tx.commit().await?;

		tracing::debug!(statements, "Database schema ensured.");

		Ok(())
	}
}
