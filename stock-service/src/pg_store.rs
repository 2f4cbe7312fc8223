use async_trait::async_trait;
use diesel_async::pooled_connection::{bb8::Pool, PoolError};
use diesel_async::AsyncPgConnection;
use shared::{ReservationRecord, StockItem, StockKind};
use uuid::Uuid;
use crate::store::{NewReservation, NewStockItem, StockStore, StoreError};

pub type DbPool = Pool<AsyncPgConnection>;

impl From<bb8::RunError<PoolError>> for StoreError {
    fn from(e: bb8::RunError<PoolError>) -> Self {
        StoreError::Pool(e.to_string())
    }
}

// Every stock kind owns an items table and a ledger table with identical
// columns; this expands the same queries against each pair.
macro_rules! stock_queries {
    ($module:ident, $items:ident, $ledger:ident) => {
        mod $module {
            use diesel::prelude::*;
            use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
            use uuid::Uuid;
            use crate::models::{DbReservation, DbStockItem};
            use crate::schema::{$items, $ledger};
            use crate::store::{NewReservation, NewStockItem};

            pub async fn list_items(conn: &mut AsyncPgConnection) -> QueryResult<Vec<DbStockItem>> {
                $items::table
                    .order($items::created_at.desc())
                    .load::<DbStockItem>(conn)
                    .await
            }

            pub async fn get_item(conn: &mut AsyncPgConnection, item_id: Uuid) -> QueryResult<Option<DbStockItem>> {
                $items::table
                    .find(item_id)
                    .first::<DbStockItem>(conn)
                    .await
                    .optional()
            }

            pub async fn insert_item(conn: &mut AsyncPgConnection, item: NewStockItem) -> QueryResult<DbStockItem> {
                diesel::insert_into($items::table)
                    .values((
                        $items::item_id.eq(item.item_id),
                        $items::name.eq(item.name),
                        $items::quantity.eq(item.quantity),
                    ))
                    .get_result::<DbStockItem>(conn)
                    .await
            }

            pub async fn decrement_if_available(
                conn: &mut AsyncPgConnection,
                item_id: Uuid,
                quantity: i32,
            ) -> QueryResult<Option<DbStockItem>> {
                diesel::update(
                    $items::table
                        .filter($items::item_id.eq(item_id))
                        .filter($items::quantity.ge(quantity)),
                )
                .set($items::quantity.eq($items::quantity - quantity))
                .get_result::<DbStockItem>(conn)
                .await
                .optional()
            }

            pub async fn credit(conn: &mut AsyncPgConnection, item_id: Uuid, quantity: i32) -> QueryResult<usize> {
                diesel::update($items::table.filter($items::item_id.eq(item_id)))
                    .set($items::quantity.eq($items::quantity + quantity))
                    .execute(conn)
                    .await
            }

            pub async fn append_reservation(
                conn: &mut AsyncPgConnection,
                entry: NewReservation,
            ) -> QueryResult<DbReservation> {
                diesel::insert_into($ledger::table)
                    .values((
                        $ledger::record_id.eq(entry.record_id),
                        $ledger::item_id.eq(entry.item_id),
                        $ledger::requester_label.eq(entry.requester_label),
                        $ledger::location_label.eq(entry.location_label),
                        $ledger::quantity.eq(entry.quantity),
                    ))
                    .get_result::<DbReservation>(conn)
                    .await
            }

            pub async fn reserve_atomic(
                conn: &mut AsyncPgConnection,
                entry: NewReservation,
            ) -> QueryResult<Option<DbReservation>> {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    Box::pin(async move {
                        if decrement_if_available(conn, entry.item_id, entry.quantity).await?.is_none() {
                            return Ok(None);
                        }
                        let row = append_reservation(conn, entry).await?;
                        Ok(Some(row))
                    })
                })
                .await
            }

            pub async fn list_reservations(conn: &mut AsyncPgConnection) -> QueryResult<Vec<DbReservation>> {
                $ledger::table
                    .order($ledger::created_at.desc())
                    .load::<DbReservation>(conn)
                    .await
            }

            pub async fn get_reservation(conn: &mut AsyncPgConnection, record_id: Uuid) -> QueryResult<Option<DbReservation>> {
                $ledger::table
                    .find(record_id)
                    .first::<DbReservation>(conn)
                    .await
                    .optional()
            }

            pub async fn list_reservations_for_item(
                conn: &mut AsyncPgConnection,
                item_id: Uuid,
            ) -> QueryResult<Vec<DbReservation>> {
                $ledger::table
                    .filter($ledger::item_id.eq(item_id))
                    .order($ledger::created_at.desc())
                    .load::<DbReservation>(conn)
                    .await
            }
        }
    };
}

stock_queries!(medicine_rows, medicine, medicine_reservations);
stock_queries!(tool_rows, tools, tool_reservations);

macro_rules! per_kind {
    ($kind:expr, $op:ident($($arg:expr),*)) => {
        match $kind {
            StockKind::Medicine => medicine_rows::$op($($arg),*).await,
            StockKind::Tool => tool_rows::$op($($arg),*).await,
        }
    };
}

pub struct PgStockStore {
    pool: DbPool,
}

impl PgStockStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockStore for PgStockStore {
    async fn list_items(&self, kind: StockKind) -> Result<Vec<StockItem>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = per_kind!(kind, list_items(&mut conn))?;
        Ok(rows.into_iter().map(StockItem::from).collect())
    }

    async fn get_item(&self, kind: StockKind, item_id: Uuid) -> Result<Option<StockItem>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = per_kind!(kind, get_item(&mut conn, item_id))?;
        Ok(row.map(StockItem::from))
    }

    async fn insert_item(&self, kind: StockKind, item: NewStockItem) -> Result<StockItem, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = per_kind!(kind, insert_item(&mut conn, item))?;
        Ok(row.into())
    }

    async fn decrement_if_available(
        &self,
        kind: StockKind,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<StockItem>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = per_kind!(kind, decrement_if_available(&mut conn, item_id, quantity))?;
        Ok(row.map(StockItem::from))
    }

    async fn credit(&self, kind: StockKind, item_id: Uuid, quantity: i32) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let updated_rows = per_kind!(kind, credit(&mut conn, item_id, quantity))?;
        if updated_rows == 0 {
            return Err(StoreError::MissingRow(item_id));
        }
        Ok(())
    }

    async fn append_reservation(
        &self,
        kind: StockKind,
        entry: NewReservation,
    ) -> Result<ReservationRecord, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = per_kind!(kind, append_reservation(&mut conn, entry))?;
        Ok(row.into())
    }

    async fn reserve_atomic(
        &self,
        kind: StockKind,
        entry: NewReservation,
    ) -> Result<Option<ReservationRecord>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = per_kind!(kind, reserve_atomic(&mut conn, entry))?;
        Ok(row.map(ReservationRecord::from))
    }

    async fn list_reservations(&self, kind: StockKind) -> Result<Vec<ReservationRecord>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = per_kind!(kind, list_reservations(&mut conn))?;
        Ok(rows.into_iter().map(ReservationRecord::from).collect())
    }

    async fn get_reservation(
        &self,
        kind: StockKind,
        record_id: Uuid,
    ) -> Result<Option<ReservationRecord>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = per_kind!(kind, get_reservation(&mut conn, record_id))?;
        Ok(row.map(ReservationRecord::from))
    }

    async fn list_reservations_for_item(
        &self,
        kind: StockKind,
        item_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = per_kind!(kind, list_reservations_for_item(&mut conn, item_id))?;
        Ok(rows.into_iter().map(ReservationRecord::from).collect())
    }
}
