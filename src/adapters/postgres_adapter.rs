//! PostgreSQL trade store. Same table layout as the SQLite store.

use crate::domain::config_validation::pool_size;
use crate::domain::directory::Directory;
use crate::domain::error::TradeMapError;
use crate::domain::transaction::{CompanyId, TradeTransaction};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store::{
    CompanyRecord, Contact, ContactDetails, ImportSummary, TradeSink, TradeStore,
};
use chrono::NaiveDate;
use postgres::types::ToSql;
use postgres::{NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use std::collections::HashMap;

type Manager = PostgresConnectionManager<NoTls>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS countries (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS companies (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        country_id BIGINT REFERENCES countries(id),
        address TEXT,
        website TEXT
    );
    CREATE TABLE IF NOT EXISTS trades (
        id BIGSERIAL PRIMARY KEY,
        seller_company_id BIGINT REFERENCES companies(id),
        buyer_company_id BIGINT REFERENCES companies(id),
        origin_country_id BIGINT REFERENCES countries(id),
        destination_country_id BIGINT REFERENCES countries(id),
        product_description TEXT,
        hs_code TEXT,
        exit_port TEXT,
        entry_port TEXT,
        trade_date DATE,
        unit_price DOUBLE PRECISION NOT NULL DEFAULT 0,
        quantity_kg DOUBLE PRECISION NOT NULL DEFAULT 0,
        total_value_usd DOUBLE PRECISION NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS contacts (
        id BIGSERIAL PRIMARY KEY,
        company_id BIGINT NOT NULL REFERENCES companies(id),
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

pub struct PostgresAdapter {
    pool: Pool<Manager>,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradeMapError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| TradeMapError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let pg_config: postgres::Config =
            connection_string
                .parse()
                .map_err(|e: postgres::Error| TradeMapError::ConfigInvalid {
                    section: "postgres".into(),
                    key: "connection_string".into(),
                    reason: e.to_string(),
                })?;

        let pool_size = pool_size(config, "postgres")?;
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(PostgresConnectionManager::new(pg_config, NoTls))
            .map_err(|e: r2d2::Error| TradeMapError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, TradeMapError> {
        self.pool.get().map_err(TradeMapError::database)
    }

    pub fn initialize_schema(&self) -> Result<(), TradeMapError> {
        self.conn()?
            .batch_execute(SCHEMA)
            .map_err(|e| TradeMapError::DatabaseQuery {
                reason: e.to_string(),
            })
    }

    fn query_trades(
        &self,
        filter: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<TradeTransaction>, TradeMapError> {
        let sql = format!("{SELECT_TRADES} {filter} ORDER BY t.id");
        let rows = self
            .conn()?
            .query(sql.as_str(), params)
            .map_err(TradeMapError::query)?;
        Ok(rows.iter().map(row_to_transaction).collect())
    }
}

fn row_to_transaction(row: &Row) -> TradeTransaction {
    TradeTransaction {
        origin_country: row.get(0),
        origin_company: row.get(1),
        seller_id: row.get::<_, Option<i64>>(2).map(CompanyId),
        destination_country: row.get(3),
        destination_company: row.get(4),
        buyer_id: row.get::<_, Option<i64>>(5).map(CompanyId),
        product_description: row.get(6),
        product_code: row.get(7),
        quantity_kg: row.get(8),
        unit_price: row.get(9),
        value: row.get(10),
        date: row.get::<_, Option<NaiveDate>>(11),
        exit_port: row.get(12),
        entry_port: row.get(13),
    }
}

fn name_map(
    tx: &mut postgres::Transaction<'_>,
    table: &str,
) -> Result<HashMap<String, i64>, TradeMapError> {
    let rows = tx
        .query(format!("SELECT name, id FROM {table}").as_str(), &[])
        .map_err(TradeMapError::query)?;
    Ok(rows
        .iter()
        .map(|row| (row.get::<_, String>(0), row.get::<_, i64>(1)))
        .collect())
}

impl TradeSink for PostgresAdapter {
    fn import(
        &self,
        transactions: &[TradeTransaction],
        batch_size: usize,
    ) -> Result<ImportSummary, TradeMapError> {
        let batch_size = batch_size.max(1);
        let directory = Directory::from_transactions(transactions);
        let mut conn = self.conn()?;

        let mut tx = conn.transaction().map_err(TradeMapError::query)?;
        for name in directory.countries() {
            tx.execute(
                "INSERT INTO countries (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
                &[name],
            )
            .map_err(TradeMapError::query)?;
        }
        let country_ids = name_map(&mut tx, "countries")?;
        tx.commit().map_err(TradeMapError::query)?;
        tracing::info!(countries = directory.countries().len(), "countries upserted");

        for chunk in directory.companies().chunks(batch_size) {
            let mut tx = conn.transaction().map_err(TradeMapError::query)?;
            for company in chunk {
                let country_id: Option<i64> = company
                    .country
                    .as_deref()
                    .and_then(|c| country_ids.get(c).copied());
                tx.execute(
                    "INSERT INTO companies (name, country_id) VALUES ($1, $2)
                     ON CONFLICT (name) DO UPDATE
                     SET country_id = COALESCE(EXCLUDED.country_id, companies.country_id)",
                    &[&company.name, &country_id],
                )
                .map_err(TradeMapError::query)?;
            }
            tx.commit().map_err(TradeMapError::query)?;
        }
        let mut tx = conn.transaction().map_err(TradeMapError::query)?;
        let company_ids = name_map(&mut tx, "companies")?;
        tx.commit().map_err(TradeMapError::query)?;
        tracing::info!(companies = directory.companies().len(), "companies upserted");

        let country = |name: &Option<String>| name.as_deref().and_then(|n| country_ids.get(n).copied());
        let company = |name: &Option<String>| name.as_deref().and_then(|n| company_ids.get(n).copied());

        let mut inserted = 0usize;
        for chunk in transactions.chunks(batch_size) {
            let mut tx = conn.transaction().map_err(TradeMapError::query)?;
            for t in chunk {
                tx.execute(
                    "INSERT INTO trades (
                        seller_company_id, buyer_company_id, origin_country_id,
                        destination_country_id, product_description, hs_code,
                        exit_port, entry_port, trade_date,
                        unit_price, quantity_kg, total_value_usd)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                    &[
                        &company(&t.origin_company),
                        &company(&t.destination_company),
                        &country(&t.origin_country),
                        &country(&t.destination_country),
                        &t.product_description,
                        &t.product_code,
                        &t.exit_port,
                        &t.entry_port,
                        &t.date,
                        &t.unit_price,
                        &t.quantity_kg,
                        &t.value,
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
                 SET address = COALESCE($2, address), website = COALESCE($3, website)
                 WHERE name = $1",
                &[&name, &address, &website],
            )
            .map_err(TradeMapError::query)?;
        Ok(changed > 0)
    }

    fn add_contact(
        &self,
        company: &str,
        contact: &ContactDetails,
    ) -> Result<Option<i64>, TradeMapError> {
        let row = self
            .conn()?
            .query_opt(
                "INSERT INTO contacts (company_id, contact_name, position, email, phone, linkedin_url)
                 SELECT id, $2, $3, $4, $5, $6 FROM companies WHERE name = $1
                 RETURNING id",
                &[
                    &company,
                    &contact.contact_name,
                    &contact.position,
                    &contact.email,
                    &contact.phone,
                    &contact.linkedin_url,
                ],
            )
            .map_err(TradeMapError::query)?;
        Ok(row.map(|row| row.get(0)))
    }
}

impl TradeStore for PostgresAdapter {
    fn all_transactions(&self) -> Result<Vec<TradeTransaction>, TradeMapError> {
        self.query_trades("", &[])
    }

    fn country_transactions(&self, country: &str) -> Result<Vec<TradeTransaction>, TradeMapError> {
        let id: Option<i64> = self
            .conn()?
            .query_opt("SELECT id FROM countries WHERE name = $1", &[&country])
            .map_err(TradeMapError::query)?
            .map(|row| row.get(0));

        match id {
            Some(id) => self.query_trades(
                "WHERE t.origin_country_id = $1 OR t.destination_country_id = $1",
                &[&id],
            ),
            None => Ok(Vec::new()),
        }
    }

    fn company_transactions(
        &self,
        company: CompanyId,
    ) -> Result<Vec<TradeTransaction>, TradeMapError> {
        self.query_trades(
            "WHERE t.seller_company_id = $1 OR t.buyer_company_id = $1",
            &[&company.0],
        )
    }

    fn find_company(&self, name: &str) -> Result<Option<CompanyRecord>, TradeMapError> {
        let row = self
            .conn()?
            .query_opt(
                "SELECT c.id, c.name, co.name, c.address, c.website
                 FROM companies c
                 LEFT JOIN countries co ON co.id = c.country_id
                 WHERE c.name = $1",
                &[&name],
            )
            .map_err(TradeMapError::query)?;

        Ok(row.map(|row| CompanyRecord {
            id: CompanyId(row.get(0)),
            name: row.get(1),
            country_name: row.get(2),
            address: row.get(3),
            website: row.get(4),
        }))
    }

    fn list_countries(&self) -> Result<Vec<String>, TradeMapError> {
        let rows = self
            .conn()?
            .query("SELECT name FROM countries ORDER BY name COLLATE \"C\"", &[])
            .map_err(TradeMapError::query)?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn company_countries(&self, names: &[&str]) -> Result<HashMap<String, String>, TradeMapError> {
        let rows = self
            .conn()?
            .query(
                "SELECT c.name, co.name
                 FROM companies c
                 JOIN countries co ON co.id = c.country_id
                 WHERE c.name = ANY($1)",
                &[&names],
            )
            .map_err(TradeMapError::query)?;
        Ok(rows
            .iter()
            .map(|row| (row.get::<_, String>(0), row.get::<_, String>(1)))
            .collect())
    }

    fn company_contacts(&self, company: CompanyId) -> Result<Vec<Contact>, TradeMapError> {
        let rows = self
            .conn()?
            .query(
                "SELECT id, contact_name, position, email, phone, linkedin_url
                 FROM contacts WHERE company_id = $1 ORDER BY id",
                &[&company.0],
            )
            .map_err(TradeMapError::query)?;
        Ok(rows
            .iter()
            .map(|row| Contact {
                id: row.get(0),
                details: ContactDetails {
                    contact_name: row.get(1),
                    position: row.get(2),
                    email: row.get(3),
                    phone: row.get(4),
                    linkedin_url: row.get(5),
                },
            })
            .collect())
    }
}
