use super::test_util::prepare_db_and_test;
use crate::domain::schema::reconcile_schema;
use crate::persistence::ExternalConnectivity;
use crate::persistence::db_schema_driven_ports::DbSchemaMigrator;
use sqlx::{PgPool, query, query_scalar};

async fn create_legacy_table(pool: &PgPool) {
    query(
        "CREATE TABLE tasks (\
            id UUID PRIMARY KEY, \
            title VARCHAR NOT NULL, \
            description VARCHAR, \
            due_date TIMESTAMPTZ NOT NULL, \
            is_completed BOOLEAN NOT NULL DEFAULT FALSE\
         )",
    )
    .execute(pool)
    .await
    .expect("Could not create legacy table");

    query(
        "INSERT INTO tasks (id, title, due_date) VALUES \
            (gen_random_uuid(), 'New year party', '2024-12-31T23:30:00-05:00'), \
            (gen_random_uuid(), 'Pay rent', '2025-03-01T00:00:00Z')",
    )
    .execute(pool)
    .await
    .expect("Could not insert legacy rows");
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn legacy_table_gets_year_column_and_backfill() {
    prepare_db_and_test(|pool| async move {
        create_legacy_table(&pool).await;
        let ext_cxn = ExternalConnectivity::new(pool.clone());

        let outcome = reconcile_schema(&ext_cxn, &DbSchemaMigrator)
            .await
            .expect("Reconciliation failed");

        assert!(outcome.year_column_added);
        assert_eq!(Some(2), outcome.rows_backfilled);
        let years: Vec<Option<i32>> =
            query_scalar("SELECT year FROM tasks ORDER BY due_date ASC")
                .fetch_all(&pool)
                .await
                .expect("Could not read years");
        assert_eq!(vec![Some(2025), Some(2025)], years);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn second_run_changes_nothing() {
    prepare_db_and_test(|pool| async move {
        let ext_cxn = ExternalConnectivity::new(pool.clone());

        let first = reconcile_schema(&ext_cxn, &DbSchemaMigrator)
            .await
            .expect("First reconciliation failed");
        let second = reconcile_schema(&ext_cxn, &DbSchemaMigrator)
            .await
            .expect("Second reconciliation failed");

        assert!(!first.year_column_added);
        assert!(!second.year_column_added);
        assert_eq!(Some(0), second.rows_backfilled);
        let year_columns: i64 = query_scalar(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = 'tasks' AND column_name = 'year'",
        )
        .fetch_one(&pool)
        .await
        .expect("Could not count columns");
        assert_eq!(1, year_columns);
    });
}
