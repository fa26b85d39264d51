use sqlx::PgConnection;

/// A live database connection lent out by an [ExternalConnectivity]
pub trait ConnectionHandle: Send {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Gives driven adapters access to external systems without tying business logic
/// to how those systems are reached
pub trait ExternalConnectivity: Send {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}

/// Something which can open a unit-of-work against the database
pub trait Transactable: Send + Sync {
    type Handle: ExternalConnectivity + TransactionHandle;

    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}

/// An open unit-of-work. Dropping it without calling [TransactionHandle::commit] rolls it back.
pub trait TransactionHandle {
    async fn commit(self) -> Result<(), anyhow::Error>;
}
