//! Startup reconciliation of the tasks table. Older databases were created before tasks
//! carried a derived `year`, so the column may have to be added and filled in before the
//! API can rely on it.

use crate::domain::schema::driven_ports::SchemaMigrator;
use crate::external_connections::{Transactable, TransactionHandle};
use thiserror::Error;
use tracing::{error, info};

pub const TASKS_TABLE: &str = "tasks";
pub const YEAR_COLUMN: &str = "year";

pub mod driven_ports {
    use crate::external_connections::ExternalConnectivity;

    pub trait SchemaMigrator {
        /// Creates the tasks table and its indexes if they are absent
        async fn ensure_tasks_table(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Looks up whether the live schema has the given column on the given table
        async fn column_exists(
            &self,
            table: &str,
            column: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        /// Adds the nullable year column. Must tolerate the column appearing concurrently.
        async fn add_year_column(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Fills in the year of every row missing one from its due date, returning how many
        /// rows changed
        async fn backfill_years(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<u64, anyhow::Error>;
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema reconciliation failed to {step}: {cause}")]
    StepFailed {
        step: &'static str,
        #[source]
        cause: anyhow::Error,
    },
}

trait OrSchemaStep<T> {
    fn or_fail_step(self, step: &'static str) -> Result<T, SchemaError>;
}

impl<T> OrSchemaStep<T> for Result<T, anyhow::Error> {
    fn or_fail_step(self, step: &'static str) -> Result<T, SchemaError> {
        self.map_err(|cause| SchemaError::StepFailed { step, cause })
    }
}

/// What [reconcile_schema] ended up doing
#[derive(Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub year_column_added: bool,
    /// Number of rows whose year was filled in, or `None` if the backfill failed
    pub rows_backfilled: Option<u64>,
}

/// Brings the tasks table up to date. The table and year column are settled in one
/// transaction and any failure there is returned. The backfill runs in a second transaction
/// afterward; its failure is only logged, leaving affected rows without a year.
pub async fn reconcile_schema(
    ext_cxn: &impl Transactable,
    migrator: &impl SchemaMigrator,
) -> Result<ReconcileOutcome, SchemaError> {
    let mut schema_txn = ext_cxn
        .start_transaction()
        .await
        .or_fail_step("begin the schema transaction")?;
    migrator
        .ensure_tasks_table(&mut schema_txn)
        .await
        .or_fail_step("create the tasks table")?;
    let has_year_column = migrator
        .column_exists(TASKS_TABLE, YEAR_COLUMN, &mut schema_txn)
        .await
        .or_fail_step("inspect the tasks table")?;
    if has_year_column {
        info!("Column '{YEAR_COLUMN}' already present, nothing to add");
    } else {
        migrator
            .add_year_column(&mut schema_txn)
            .await
            .or_fail_step("add the year column")?;
        info!("Added column '{YEAR_COLUMN}' to '{TASKS_TABLE}'");
    }
    schema_txn
        .commit()
        .await
        .or_fail_step("commit schema changes")?;

    let rows_backfilled = match backfill_years(ext_cxn, migrator).await {
        Ok(row_count) => {
            info!(row_count, "Backfilled missing task years");
            Some(row_count)
        }
        Err(backfill_err) => {
            error!("Could not backfill task years, some tasks will have no year: {backfill_err:#}");
            None
        }
    };

    Ok(ReconcileOutcome {
        year_column_added: !has_year_column,
        rows_backfilled,
    })
}

async fn backfill_years(
    ext_cxn: &impl Transactable,
    migrator: &impl SchemaMigrator,
) -> Result<u64, anyhow::Error> {
    let mut backfill_txn = ext_cxn.start_transaction().await?;
    let row_count = migrator.backfill_years(&mut backfill_txn).await?;
    backfill_txn.commit().await?;

    Ok(row_count)
}
