//! 仓库扫描端到端测试
//!
//! 设置 `PROXYBEAN_TEST_DATABASE_URL` 时额外对真实数据库执行查询

use std::sync::Arc;

use proxybean_core::prelude::*;
use proxybean_sql::{repository_scan, RepositoryScan, SqlClient};

mod repository {
    use proxybean_macros::proxy_bean;
    use proxybean_sql::{sql_object, SqlClient, SqlResult};

    pub struct RepositoryConfig;

    #[proxy_bean]
    pub trait BookRepository: Send + Sync {
        fn table(&self) -> &'static str;

        fn count(&self) -> SqlResult<i64>;
    }

    pub struct PgBookRepository {
        client: SqlClient,
    }

    impl BookRepository for PgBookRepository {
        fn table(&self) -> &'static str {
            "books"
        }

        fn count(&self) -> SqlResult<i64> {
            self.client.with_connection(|connection| {
                let row = connection.query_one("SELECT COUNT(*) FROM books", &[])?;
                Ok(row.get::<_, i64>(0))
            })
        }
    }

    sql_object!(BookRepository => |client| PgBookRepository { client });
}

use repository::BookRepository;

repository_scan!(repository::RepositoryConfig);

fn context_with_datasource() -> Arc<ApplicationContext> {
    ApplicationContext::builder()
        .add_property_source(Box::new(
            MapPropertySource::new("test")
                .with_property("datasource.url", "postgres://app@127.0.0.1:1/library")
                .with_property("datasource.connection-timeout-secs", 1i64),
        ))
        .build()
}

#[test]
fn test_repository_is_attached_to_configured_client() {
    let context = context_with_datasource();
    context.refresh().unwrap();

    let books = context.get_interface::<dyn BookRepository>("bookRepository").unwrap();
    assert_eq!(books.table(), "books");

    let client = context.get_bean_by_type::<SqlClient>().unwrap();
    assert!(client.attach::<dyn BookRepository>().is_ok());
}

#[test]
fn test_repository_without_datasource_fails_eagerly() {
    let context = ApplicationContext::builder().build();
    assert!(context.refresh().is_err());
}

#[test]
fn test_lazy_repository_scan_defers_client_lookup() {
    let context = ApplicationContext::builder()
        .declared_scans(false)
        .bean_scan(
            ScanSite::of::<repository::RepositoryConfig>(),
            RepositoryScan::new().with_lazy_initialization(true).into(),
        )
        .build();
    context.refresh().unwrap();

    assert!(context.contains_bean("bookRepository"));
    assert!(context.get_interface::<dyn BookRepository>("bookRepository").is_err());
}

#[test]
fn test_unreachable_database_surfaces_as_sql_error() {
    let context = context_with_datasource();
    context.refresh().unwrap();

    let books = context.get_interface::<dyn BookRepository>("bookRepository").unwrap();
    assert!(books.count().is_err());
}

#[tokio::test]
async fn test_repository_call_on_runtime_thread_returns_error() {
    let context = context_with_datasource();
    context.refresh().unwrap();

    let books = context.get_interface::<dyn BookRepository>("bookRepository").unwrap();
    assert!(books.count().is_err());
}

#[tokio::test]
async fn test_query_on_runtime_thread_against_live_database() {
    let Ok(url) = std::env::var("PROXYBEAN_TEST_DATABASE_URL") else {
        return;
    };
    let context = ApplicationContext::builder()
        .add_property_source(Box::new(MapPropertySource::new("test").with_property("datasource.url", url)))
        .build();
    context.refresh().unwrap();

    let client = context.get_bean_by_type::<SqlClient>().unwrap();
    let value = client
        .with_connection(|connection| Ok(connection.query_one("SELECT 1::INT4", &[])?.get::<_, i32>(0)))
        .unwrap();
    assert_eq!(value, 1);
}
