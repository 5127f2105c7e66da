use rusqlite::{named_params, Connection, Row};
use tracing::debug;

use crate::error::{Error, Result};
use crate::parcel::{Parcel, ParcelStatus};

const INSERT_PARCEL: &str = "INSERT INTO parcel (client, status, address, created_at) \
     VALUES (:client, :status, :address, :created_at)";

const SELECT_BY_NUMBER: &str = "SELECT number, client, status, address, created_at \
     FROM parcel WHERE number = :number";

const SELECT_BY_CLIENT: &str = "SELECT number, client, status, address, created_at \
     FROM parcel WHERE client = :client";

const SELECT_STATUS: &str = "SELECT status FROM parcel WHERE number = :number";

const UPDATE_STATUS: &str = "UPDATE parcel SET status = :status WHERE number = :number";

const UPDATE_ADDRESS: &str =
    "UPDATE parcel SET address = :address WHERE number = :number AND status = :status";

const DELETE_PARCEL: &str = "DELETE FROM parcel WHERE number = :number AND status = :status";

/// Data access for the `parcel` table.
///
/// The store borrows a connection owned by the caller. Every call runs its
/// statements directly on that connection, without an explicit transaction.
#[derive(Debug, Clone, Copy)]
pub struct ParcelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ParcelStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Insert `parcel` and return the number storage assigned to it.
    ///
    /// `parcel.number` is ignored.
    pub fn add(&self, parcel: &Parcel) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(INSERT_PARCEL)?;
        stmt.execute(named_params! {
            ":client": parcel.client,
            ":status": parcel.status,
            ":address": parcel.address,
            ":created_at": parcel.created_at,
        })?;
        let number = self.conn.last_insert_rowid();
        debug!(number, client = parcel.client, "parcel added");
        Ok(number)
    }

    /// Fetch a single parcel.
    ///
    /// A missing parcel is reported as the engine's "no rows" error; see
    /// [`Error::is_not_found`].
    pub fn get(&self, number: i64) -> Result<Parcel> {
        let mut stmt = self.conn.prepare_cached(SELECT_BY_NUMBER)?;
        let parcel = stmt.query_row(named_params! { ":number": number }, parcel_from_row)?;
        Ok(parcel)
    }

    /// All parcels owned by `client`, in storage order. Empty when none match.
    pub fn get_by_client(&self, client: i64) -> Result<Vec<Parcel>> {
        let mut stmt = self.conn.prepare_cached(SELECT_BY_CLIENT)?;
        let rows = stmt.query_map(named_params! { ":client": client }, parcel_from_row)?;
        let mut parcels = Vec::new();
        for row in rows {
            parcels.push(row?);
        }
        debug!(client, count = parcels.len(), "parcels loaded for client");
        Ok(parcels)
    }

    /// Overwrite the status unconditionally. Returns the number of rows
    /// changed, which is zero when the parcel does not exist.
    pub fn set_status(&self, number: i64, status: &ParcelStatus) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(UPDATE_STATUS)?;
        let changed = stmt.execute(named_params! {
            ":status": status,
            ":number": number,
        })?;
        debug!(number, %status, changed, "parcel status set");
        Ok(changed)
    }

    /// Change the delivery address while the parcel is still `registered`.
    ///
    /// Fails when the parcel does not exist. For any other status the address
    /// is left untouched and `Ok(0)` is returned.
    pub fn set_address(&self, number: i64, address: &str) -> Result<usize> {
        let current: ParcelStatus = self
            .conn
            .prepare_cached(SELECT_STATUS)?
            .query_row(named_params! { ":number": number }, |row| row.get(0))?;

        let mut stmt = self.conn.prepare_cached(UPDATE_ADDRESS)?;
        let changed = stmt.execute(named_params! {
            ":address": address,
            ":number": number,
            ":status": ParcelStatus::Registered,
        })?;
        if changed == 0 {
            debug!(number, status = %current, "address not changed");
        } else {
            debug!(number, "parcel address set");
        }
        Ok(changed)
    }

    /// Delete the parcel if it is still `registered`. Returns the number of
    /// rows removed; zero when the parcel is absent or already moving.
    pub fn delete(&self, number: i64) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(DELETE_PARCEL)?;
        let removed = stmt
            .execute(named_params! {
                ":number": number,
                ":status": ParcelStatus::Registered,
            })
            .map_err(Error::Exec)?;
        debug!(number, removed, "parcel delete");
        Ok(removed)
    }
}

fn parcel_from_row(row: &Row<'_>) -> rusqlite::Result<Parcel> {
    Ok(Parcel {
        number: row.get(0)?,
        client: row.get(1)?,
        status: row.get(2)?,
        address: row.get(3)?,
        created_at: row.get(4)?,
    })
}
