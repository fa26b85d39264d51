use crate::domain;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{query, query_scalar};

pub struct DbSchemaMigrator;

impl domain::schema::driven_ports::SchemaMigrator for DbSchemaMigrator {
    async fn ensure_tasks_table(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query(
            "CREATE TABLE IF NOT EXISTS tasks (\
                id UUID PRIMARY KEY, \
                title VARCHAR NOT NULL, \
                description VARCHAR, \
                due_date TIMESTAMPTZ NOT NULL, \
                is_completed BOOLEAN NOT NULL DEFAULT FALSE, \
                year INTEGER\
             )",
        )
        .execute(cxn.borrow_connection())
        .await
        .context("creating the tasks table")?;

        query("CREATE INDEX IF NOT EXISTS ix_tasks_title ON tasks (title)")
            .execute(cxn.borrow_connection())
            .await
            .context("creating the task title index")?;

        Ok(())
    }

    async fn column_exists(
        &self,
        table: &str,
        column: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let exists: bool = query_scalar(
            "SELECT EXISTS (\
                SELECT 1 FROM information_schema.columns c \
                WHERE c.table_schema = current_schema() \
                AND c.table_name = $1 \
                AND c.column_name = $2\
             )",
        )
        .bind(table)
        .bind(column)
        .fetch_one(cxn.borrow_connection())
        .await
        .with_context(|| format!("checking for column {table}.{column}"))?;

        Ok(exists)
    }

    async fn add_year_column(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        query("ALTER TABLE tasks ADD COLUMN IF NOT EXISTS year INTEGER")
            .execute(cxn.borrow_connection())
            .await
            .context("adding the year column to tasks")?;

        Ok(())
    }

    async fn backfill_years(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<u64, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query(
            "UPDATE tasks SET year = EXTRACT(YEAR FROM due_date AT TIME ZONE 'UTC')::INTEGER \
             WHERE year IS NULL AND due_date IS NOT NULL",
        )
        .execute(cxn.borrow_connection())
        .await
        .context("backfilling task years from due dates")?;

        Ok(result.rows_affected())
    }
}
