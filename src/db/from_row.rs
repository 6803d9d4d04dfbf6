//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::{HwidConflict, LicensePlan, LicenseRecord};

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupted rows.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub const LICENSE_COLS: &str =
    "id, key, plan, owner_id, hwid, is_active, expires_at, redeemed_at, created_by, created_at";

pub const HWID_CONFLICT_COLS: &str = "id, license_id, bound_hwid, reported_hwid, observed_at";

impl FromRow for LicenseRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let plan: LicensePlan = parse_enum(row, 2, "plan")?;
        Ok(LicenseRecord {
            id: row.get(0)?,
            key: row.get(1)?,
            plan,
            owner_id: row.get(3)?,
            hwid: row.get(4)?,
            is_active: row.get::<_, i32>(5)? != 0,
            expires_at: row.get(6)?,
            redeemed_at: row.get(7)?,
            created_by: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

impl FromRow for HwidConflict {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(HwidConflict {
            id: row.get(0)?,
            license_id: row.get(1)?,
            bound_hwid: row.get(2)?,
            reported_hwid: row.get(3)?,
            observed_at: row.get(4)?,
        })
    }
}
