use crate::app_env::test::TEST_DB_URL;
use crate::persistence;
use axum::Router;
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use sqlx::{Connection, PgConnection, PgPool};
use std::env;
use std::future::Future;
use std::panic;
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

/// A throwaway database created for a single test
struct TestDatabase {
    base_url: String,
    db_name: String,
}

impl TestDatabase {
    async fn create(base_url: &str) -> Result<Self, sqlx::Error> {
        let db_id: u32 = thread_rng().gen_range(10_000..99_999);
        let db_name = format!("test_db_{db_id}");
        let mut conn = PgConnection::connect(base_url).await?;

        sqlx::query(format!("CREATE DATABASE {db_name}").as_str())
            .execute(&mut conn)
            .await?;
        conn.close().await?;

        Ok(Self {
            base_url: base_url.to_owned(),
            db_name,
        })
    }

    fn url(&self) -> String {
        format!("{}/{}", self.base_url, self.db_name)
    }

    async fn drop_database(self) {
        let mut conn = match PgConnection::connect(&self.base_url).await {
            Ok(cxn) => cxn,
            Err(conn_err) => {
                println!(
                    "Failed to reconnect to drop test database {}, please remove it manually. Error: {conn_err}",
                    self.db_name
                );
                return;
            }
        };

        let drop_result = sqlx::query(format!("DROP DATABASE IF EXISTS {}", self.db_name).as_str())
            .execute(&mut conn)
            .await;
        if let Err(db_err) = drop_result {
            println!(
                "Failed to drop test database {}, please remove it manually. Error: {db_err}",
                self.db_name
            );
        }
    }
}

/// Creates an empty database for the test, hands the test a pool connected to it, and drops the
/// database afterward even if the test panics.
///
/// Expects that the TEST_DB_URL environment variable is populated
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    F: FnOnce(PgPool) -> R,
    R: Future<Output = ()> + Send + 'static,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let base_url = env::var(TEST_DB_URL).unwrap_or_else(|_| {
            panic!("You must provide the {TEST_DB_URL} environment variable as the base postgres connection string")
        });
        let test_db = TestDatabase::create(&base_url)
            .await
            .unwrap_or_else(|db_err| panic!("Failed to start test database: {db_err}"));

        let pool = persistence::connect_sqlx(&test_db.url())
            .await
            .unwrap_or_else(|db_err| panic!("Failed to connect to test database: {db_err:#}"));
        let test_outcome = tokio::spawn(test_fn(pool.clone())).await;

        pool.close().await;
        test_db.drop_database().await;

        if let Err(join_err) = test_outcome {
            if join_err.is_panic() {
                panic::resume_unwind(join_err.into_panic());
            }
            panic!("Test task was cancelled: {join_err}");
        }
    });
}

/// Reconciles the schema of the test database and builds the full application router on top of it
pub async fn reconciled_router(pool: PgPool) -> Router {
    let ext_cxn = persistence::ExternalConnectivity::new(pool);
    crate::domain::schema::reconcile_schema(
        &ext_cxn,
        &persistence::db_schema_driven_ports::DbSchemaMigrator,
    )
    .await
    .expect("Schema reconciliation failed");

    let shared_data = std::sync::Arc::new(crate::SharedData { ext_cxn });
    crate::routes::build_router(shared_data, std::path::Path::new("frontend"))
}
