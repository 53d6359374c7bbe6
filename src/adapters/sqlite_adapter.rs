//! SQLite trade store.
//!
//! `countries` and `companies` keyed by unique name, `trades` referencing both
//! by id, and `contacts` hanging off companies. Reads join the names back so
//! the domain only ever sees flattened [`TradeTransaction`]s.

use crate::domain::config_validation::pool_size;
use crate::domain::directory::Directory;
use crate::domain::error::TradeMapError;
use crate::domain::transaction::{CompanyId, TradeTransaction};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store::{
    CompanyRecord, Contact, ContactDetails, ImportSummary, TradeSink, TradeStore,
};
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params, params_from_iter};
use std::collections::HashMap;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS countries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS companies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        country_id INTEGER REFERENCES countries(id),
        address TEXT,
        website TEXT
    );
    CREATE TABLE IF NOT EXISTS trades (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        seller_company_id INTEGER REFERENCES companies(id),
        buyer_company_id INTEGER REFERENCES companies(id),
        origin_country_id INTEGER REFERENCES countries(id),
        destination_country_id INTEGER REFERENCES countries(id),
        product_description TEXT,
        hs_code TEXT,
        exit_port TEXT,
        entry_port TEXT,
        trade_date TEXT,
        unit_price REAL NOT NULL DEFAULT 0,
        quantity_kg REAL NOT NULL DEFAULT 0,
        total_value_usd REAL NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL REFERENCES companies(id),
        contact_name TEXT NOT NULL,
        position TEXT,
        email TEXT,
        phone TEXT,
        linkedin_url TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_contacts_company ON contacts(company_id);
    CREATE INDEX IF NOT EXISTS idx_trades_seller ON trades(seller_company_id);
    CREATE INDEX IF NOT EXISTS idx_trades_buyer ON trades(buyer_company_id);
    CREATE INDEX IF NOT EXISTS idx_trades_origin ON trades(origin_country_id);
    CREATE INDEX IF NOT EXISTS idx_trades_destination ON trades(destination_country_id);";

const SELECT_TRADES: &str = "
    SELECT oc.name, sc.name, t.seller_company_id,
           dc.name, bc.name, t.buyer_company_id,
           t.product_description, t.hs_code,
           t.quantity_kg, t.unit_price, t.total_value_usd,
           t.trade_date, t.exit_port, t.entry_port
    FROM trades t
    LEFT JOIN countries oc ON oc.id = t.origin_country_id
    LEFT JOIN companies sc ON sc.id = t.seller_company_id
    LEFT JOIN countries dc ON dc.id = t.destination_country_id
    LEFT JOIN companies bc ON bc.id = t.buyer_company_id";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Names bound per `IN (...)` query, below SQLite's variable limit.
const NAMES_PER_QUERY: usize = 500;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradeMapError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TradeMapError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = pool_size(config, "sqlite")?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| TradeMapError::Database {
                    reason: e.to_string(),
                })?;

        tracing::debug!(path = %db_path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    /// Single-connection pool: every in-memory connection is its own database.
    pub fn in_memory() -> Result<Self, TradeMapError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TradeMapError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TradeMapError> {
        self.pool.get().map_err(TradeMapError::database)
    }

    pub fn initialize_schema(&self) -> Result<(), TradeMapError> {
        self.conn()?
            .execute_batch(SCHEMA)
            .map_err(|e: rusqlite::Error| TradeMapError::DatabaseQuery {
                reason: e.to_string(),
            })
    }

    fn query_trades(
        &self,
        filter: &str,
        param: Option<i64>,
    ) -> Result<Vec<TradeTransaction>, TradeMapError> {
        let conn = self.conn()?;
        let sql = format!("{SELECT_TRADES} {filter} ORDER BY t.id");
        let mut stmt = conn.prepare(&sql).map_err(TradeMapError::query)?;

        let rows = match param {
            Some(id) => stmt.query_map(params![id], row_to_transaction),
            None => stmt.query_map([], row_to_transaction),
        }
        .map_err(TradeMapError::query)?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(row.map_err(TradeMapError::query)?);
        }
        Ok(transactions)
    }

    fn company_id(&self, name: &str) -> Result<Option<i64>, TradeMapError> {
        self.conn()?
            .query_row(
                "SELECT id FROM companies WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(TradeMapError::query)
    }

    fn country_id(&self, name: &str) -> Result<Option<i64>, TradeMapError> {
        self.conn()?
            .query_row(
                "SELECT id FROM countries WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(TradeMapError::query)
    }
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<TradeTransaction> {
    let date = match row.get::<_, Option<String>>(11)? {
        Some(s) => Some(NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };

    Ok(TradeTransaction {
        origin_country: row.get(0)?,
        origin_company: row.get(1)?,
        seller_id: row.get::<_, Option<i64>>(2)?.map(CompanyId),
        destination_country: row.get(3)?,
        destination_company: row.get(4)?,
        buyer_id: row.get::<_, Option<i64>>(5)?.map(CompanyId),
        product_description: row.get(6)?,
        product_code: row.get(7)?,
        quantity_kg: row.get(8)?,
        unit_price: row.get(9)?,
        value: row.get(10)?,
        date,
        exit_port: row.get(12)?,
        entry_port: row.get(13)?,
    })
}

fn name_map(
    tx: &rusqlite::Transaction<'_>,
    table: &str,
) -> Result<HashMap<String, i64>, TradeMapError> {
    let mut stmt = tx
        .prepare(&format!("SELECT name, id FROM {table}"))
        .map_err(TradeMapError::query)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(TradeMapError::query)?;
    let mut map = HashMap::new();
    for row in rows {
        let (name, id) = row.map_err(TradeMapError::query)?;
        map.insert(name, id);
    }
    Ok(map)
}

impl TradeSink for SqliteAdapter {
    fn import(
        &self,
        transactions: &[TradeTransaction],
        batch_size: usize,
    ) -> Result<ImportSummary, TradeMapError> {
        let batch_size = batch_size.max(1);
        let directory = Directory::from_transactions(transactions);
        let mut conn = self.conn()?;

        let tx = conn.transaction().map_err(TradeMapError::query)?;
        for name in directory.countries() {
            tx.execute(
                "INSERT INTO countries (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
                params![name],
            )
            .map_err(TradeMapError::query)?;
        }
        let country_ids = name_map(&tx, "countries")?;
        tx.commit().map_err(TradeMapError::query)?;
        tracing::info!(countries = directory.countries().len(), "countries upserted");

        for chunk in directory.companies().chunks(batch_size) {
            let tx = conn.transaction().map_err(TradeMapError::query)?;
            for company in chunk {
                let country_id = company
                    .country
                    .as_deref()
                    .and_then(|c| country_ids.get(c).copied());
                tx.execute(
                    "INSERT INTO companies (name, country_id) VALUES (?1, ?2)
                     ON CONFLICT(name) DO UPDATE
                     SET country_id = COALESCE(excluded.country_id, companies.country_id)",
                    params![company.name, country_id],
                )
                .map_err(TradeMapError::query)?;
            }
            tx.commit().map_err(TradeMapError::query)?;
        }
        let company_ids = {
            let tx = conn.transaction().map_err(TradeMapError::query)?;
            let map = name_map(&tx, "companies")?;
            tx.commit().map_err(TradeMapError::query)?;
            map
        };
        tracing::info!(companies = directory.companies().len(), "companies upserted");

        let country = |name: &Option<String>| name.as_deref().and_then(|n| country_ids.get(n).copied());
        let company = |name: &Option<String>| name.as_deref().and_then(|n| company_ids.get(n).copied());

        let mut inserted = 0usize;
        for chunk in transactions.chunks(batch_size) {
            let tx = conn.transaction().map_err(TradeMapError::query)?;
            for t in chunk {
                tx.execute(
                    "INSERT INTO trades (
                        seller_company_id, buyer_company_id, origin_country_id,
                        destination_country_id, product_description, hs_code,
                        exit_port, entry_port, trade_date,
                        unit_price, quantity_kg, total_value_usd)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        company(&t.origin_company),
                        company(&t.destination_company),
                        country(&t.origin_country),
                        country(&t.destination_country),
                        t.product_description,
                        t.product_code,
                        t.exit_port,
                        t.entry_port,
                        t.date.map(|d| d.format(DATE_FORMAT).to_string()),
                        t.unit_price,
                        t.quantity_kg,
                        t.value,
                    ],
                )
                .map_err(TradeMapError::query)?;
            }
            tx.commit().map_err(TradeMapError::query)?;
            inserted += chunk.len();
            tracing::debug!(inserted, total = transactions.len(), "trade batch committed");
        }

        Ok(ImportSummary {
            countries: directory.countries().len(),
            companies: directory.companies().len(),
            trades: inserted,
        })
    }

    fn update_company_profile(
        &self,
        name: &str,
        address: Option<&str>,
        website: Option<&str>,
    ) -> Result<bool, TradeMapError> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE companies
                 SET address = COALESCE(?2, address), website = COALESCE(?3, website)
                 WHERE name = ?1",
                params![name, address, website],
            )
            .map_err(TradeMapError::query)?;
        Ok(changed > 0)
    }

    fn add_contact(
        &self,
        company: &str,
        contact: &ContactDetails,
    ) -> Result<Option<i64>, TradeMapError> {
        let Some(company_id) = self.company_id(company)? else {
            return Ok(None);
        };
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO contacts (company_id, contact_name, position, email, phone, linkedin_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                company_id,
                contact.contact_name,
                contact.position,
                contact.email,
                contact.phone,
                contact.linkedin_url,
            ],
        )
        .map_err(TradeMapError::query)?;
        Ok(Some(conn.last_insert_rowid()))
    }
}

impl TradeStore for SqliteAdapter {
    fn all_transactions(&self) -> Result<Vec<TradeTransaction>, TradeMapError> {
        self.query_trades("", None)
    }

    fn country_transactions(&self, country: &str) -> Result<Vec<TradeTransaction>, TradeMapError> {
        match self.country_id(country)? {
            Some(id) => self.query_trades(
                "WHERE t.origin_country_id = ?1 OR t.destination_country_id = ?1",
                Some(id),
            ),
            None => Ok(Vec::new()),
        }
    }

    fn company_transactions(
        &self,
        company: CompanyId,
    ) -> Result<Vec<TradeTransaction>, TradeMapError> {
        self.query_trades(
            "WHERE t.seller_company_id = ?1 OR t.buyer_company_id = ?1",
            Some(company.0),
        )
    }

    fn find_company(&self, name: &str) -> Result<Option<CompanyRecord>, TradeMapError> {
        self.conn()?
            .query_row(
                "SELECT c.id, c.name, co.name, c.address, c.website
                 FROM companies c
                 LEFT JOIN countries co ON co.id = c.country_id
                 WHERE c.name = ?1",
                params![name],
                |row| {
                    Ok(CompanyRecord {
                        id: CompanyId(row.get(0)?),
                        name: row.get(1)?,
                        country_name: row.get(2)?,
                        address: row.get(3)?,
                        website: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(TradeMapError::query)
    }

    fn list_countries(&self) -> Result<Vec<String>, TradeMapError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT name FROM countries ORDER BY name")
            .map_err(TradeMapError::query)?;
        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(TradeMapError::query)?;

        let mut countries = Vec::new();
        for row in rows {
            countries.push(row.map_err(TradeMapError::query)?);
        }
        Ok(countries)
    }

    fn company_countries(&self, names: &[&str]) -> Result<HashMap<String, String>, TradeMapError> {
        let conn = self.conn()?;
        let mut homes = HashMap::new();
        for chunk in names.chunks(NAMES_PER_QUERY) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT c.name, co.name
                     FROM companies c
                     JOIN countries co ON co.id = c.country_id
                     WHERE c.name IN ({placeholders})"
                ))
                .map_err(TradeMapError::query)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .map_err(TradeMapError::query)?;
            for row in rows {
                let (company, country) = row.map_err(TradeMapError::query)?;
                homes.insert(company, country);
            }
        }
        Ok(homes)
    }

    fn company_contacts(&self, company: CompanyId) -> Result<Vec<Contact>, TradeMapError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, contact_name, position, email, phone, linkedin_url
                 FROM contacts WHERE company_id = ?1 ORDER BY id",
            )
            .map_err(TradeMapError::query)?;
        let rows = stmt
            .query_map(params![company.0], |row| {
                Ok(Contact {
                    id: row.get(0)?,
                    details: ContactDetails {
                        contact_name: row.get(1)?,
                        position: row.get(2)?,
                        email: row.get(3)?,
                        phone: row.get(4)?,
                        linkedin_url: row.get(5)?,
                    },
                })
            })
            .map_err(TradeMapError::query)?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row.map_err(TradeMapError::query)?);
        }
        Ok(contacts)
    }
}
