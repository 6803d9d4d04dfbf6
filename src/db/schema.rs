use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Licenses (the entitlement unit)
        -- owner_id: NULL = unredeemed, available key; set exactly once at redemption
        -- is_active: 0 = administratively revoked; dominates plan/expiry
        -- expires_at: NULL is meaningful only for plan = 'lifetime'
        CREATE TABLE IF NOT EXISTS licenses (
            id TEXT PRIMARY KEY,
            key TEXT NOT NULL UNIQUE,
            plan TEXT NOT NULL CHECK (plan IN ('lifetime', 'monthly')),
            owner_id TEXT,
            hwid TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            expires_at INTEGER,
            redeemed_at INTEGER,
            created_by TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_licenses_owner ON licenses(owner_id, is_active, created_at DESC);

        -- HWID conflict observations (audit trail for suspected sharing)
        CREATE TABLE IF NOT EXISTS hwid_conflicts (
            id TEXT PRIMARY KEY,
            license_id TEXT NOT NULL REFERENCES licenses(id) ON DELETE CASCADE,
            bound_hwid TEXT NOT NULL,
            reported_hwid TEXT NOT NULL,
            observed_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_hwid_conflicts_license ON hwid_conflicts(license_id, observed_at DESC);
        "#,
    )?;
    Ok(())
}
