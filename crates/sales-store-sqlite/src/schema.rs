//! SQL schema for the plugin sales SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Plugin directory; sales reference it but are not constrained by it so a
-- sale for a not-yet-registered plugin can still be stored.
CREATE TABLE IF NOT EXISTS plugins (
    plugin_id INTEGER PRIMARY KEY,
    name      TEXT NOT NULL
);

-- One row per remote transaction. Rows are upserted on sale_id and never
-- deleted.
CREATE TABLE IF NOT EXISTS sales (
    sale_id      INTEGER PRIMARY KEY,   -- remote id; upsert key
    plugin_id    INTEGER NOT NULL,
    edition      TEXT NOT NULL,
    renewal      INTEGER NOT NULL,      -- 0 = new license, 1 = renewal
    gross_amount REAL NOT NULL,
    net_amount   REAL NOT NULL,
    customer     TEXT NOT NULL,
    date_sold    TEXT NOT NULL          -- 'YYYY-MM-DD HH:MM:SS', UTC
);

CREATE INDEX IF NOT EXISTS sales_date_sold_idx ON sales(date_sold);
CREATE INDEX IF NOT EXISTS sales_customer_idx  ON sales(customer);
CREATE INDEX IF NOT EXISTS sales_plugin_idx    ON sales(plugin_id);

PRAGMA user_version = 1;
";
