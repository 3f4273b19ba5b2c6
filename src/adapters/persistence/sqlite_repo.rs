//! SQLite-backed repository via libsql. Implements ClientRepo.
//!
//! Single `clients` table keyed by ktp_number; the active loan is stored as a JSON column
//! (NULL = no loan). Saves are upserts. Database file: {data_dir}/clients.db

use crate::domain::{Client, ClientData, Loan, RepoError};
use crate::ports::ClientRepo;
use libsql::{Database, Value, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CLIENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    ktp_number TEXT PRIMARY KEY,
    gender TEXT NOT NULL DEFAULT '',
    birth_date TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL DEFAULT '',
    loan_json TEXT
)"#;

/// SQLite repository. One database file (clients.db) in the given base directory.
pub struct SqliteClientRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteClientRepo {
    /// Connect to (or create) the SQLite database and ensure the schema exists.
    /// Call this once at startup; the returned repo is safe to share via Arc.
    ///
    /// Sets WAL mode and synchronous=NORMAL.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, RepoError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| RepoError::new(e.to_string()))?;
        let db_path = base.join("clients.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| RepoError::new(e.to_string()))?;
        let conn = db.connect().map_err(|e| RepoError::new(e.to_string()))?;

        // PRAGMA returns a row; use query and drain it (execute fails when rows are returned).
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| RepoError::new(format!("{} failed: {}", pragma, e)))?;
            while rows
                .next()
                .await
                .map_err(|e| RepoError::new(e.to_string()))?
                .is_some()
            {}
        }

        conn.execute(CLIENTS_TABLE, ())
            .await
            .map_err(|e| RepoError::new(e.to_string()))?;

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn loan_to_json(loan: Option<&Loan>) -> Result<Option<String>, RepoError> {
        loan.map(serde_json::to_string::<Loan>)
            .transpose()
            .map_err(|e| RepoError::new(format!("encode loan: {}", e)))
    }

    /// TEXT or NULL column. Other storage classes are an error, not a conversion.
    fn text_column(row: &libsql::Row, idx: i32) -> Result<Option<String>, RepoError> {
        let value = row.get_value(idx).map_err(|e| RepoError::new(e.to_string()))?;
        match value {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s)),
            other => Err(RepoError::new(format!(
                "read client: column {} holds {:?}, expected text",
                idx, other
            ))),
        }
    }

    fn json_to_loan(s: Option<&str>) -> Result<Option<Loan>, RepoError> {
        s.map(serde_json::from_str::<Loan>)
            .transpose()
            .map_err(|e| RepoError::new(format!("decode loan: {}", e)))
    }
}

#[async_trait::async_trait]
impl ClientRepo for SqliteClientRepo {
    async fn by_ktp_number(&self, ktp_number: &str) -> Result<Option<Client>, RepoError> {
        let conn = self.db.connect().map_err(|e| RepoError::new(e.to_string()))?;
        let mut rows = conn
            .query(
                "SELECT ktp_number, gender, birth_date, name, loan_json FROM clients WHERE ktp_number = ?1",
                params![ktp_number],
            )
            .await
            .map_err(|e| RepoError::new(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| RepoError::new(e.to_string()))?
        else {
            return Ok(None);
        };
        let text = |idx: i32| -> Result<String, RepoError> {
            Self::text_column(&row, idx)?.ok_or_else(|| {
                RepoError::new(format!("read client {}: column {} is NULL", ktp_number, idx))
            })
        };
        let data = ClientData {
            ktp_number: text(0)?,
            gender: text(1)?,
            birth_date: text(2)?,
            name: text(3)?,
        };
        let loan_json = Self::text_column(&row, 4)?;
        let loan = Self::json_to_loan(loan_json.as_deref())?;
        Ok(Some(Client::from_parts(data, loan)))
    }

    async fn save(&self, client: &Client) -> Result<(), RepoError> {
        let loan_json = Self::loan_to_json(client.active_loan())?;
        let conn = self.db.connect().map_err(|e| RepoError::new(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO clients (ktp_number, gender, birth_date, name, loan_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (ktp_number) DO UPDATE SET
                gender = excluded.gender,
                birth_date = excluded.birth_date,
                name = excluded.name,
                loan_json = excluded.loan_json
            "#,
            params![
                client.ktp_number(),
                client.gender(),
                client.birth_date(),
                client.name(),
                loan_json
            ],
        )
        .await
        .map_err(|e| RepoError::new(e.to_string()))?;
        debug!(ktp_number = client.ktp_number(), "saved client");
        Ok(())
    }
}
