use std::sync::Arc;

use proxybean_core::prelude::*;
use proxybean_sql::{repository_scan, RepositoryScan, SqlClient};

// ==================== 仓库定义 ====================

mod repository {
    use proxybean_macros::proxy_bean;
    use proxybean_sql::{sql_object, SqlClient, SqlResult};

    /// 扫描声明所在的位置，扫描本模块
    pub struct RepositoryConfig;

    /// 用户仓库 - 单例
    #[proxy_bean]
    pub trait UserRepository: Send + Sync {
        fn count(&self) -> SqlResult<i64>;

        fn find_name(&self, id: i32) -> SqlResult<Option<String>>;
    }

    /// 审计仓库 - 每个请求一个实例
    #[proxy_bean("request")]
    pub trait AuditRepository: Send + Sync {
        fn record(&self, action: &str);

        fn entries(&self) -> Vec<String>;
    }

    pub struct PgUserRepository {
        client: SqlClient,
    }

    impl UserRepository for PgUserRepository {
        fn count(&self) -> SqlResult<i64> {
            self.client.with_connection(|connection| {
                let row = connection.query_one("SELECT COUNT(*) FROM users", &[])?;
                Ok(row.get(0))
            })
        }

        fn find_name(&self, id: i32) -> SqlResult<Option<String>> {
            self.client.with_connection(|connection| {
                let row = connection.query_opt("SELECT name FROM users WHERE id = $1", &[&id])?;
                Ok(row.map(|row| row.get(0)))
            })
        }
    }

    /// 请求内累积的审计记录，请求结束时丢弃
    pub struct RequestAuditRepository {
        entries: parking_lot::Mutex<Vec<String>>,
    }

    impl AuditRepository for RequestAuditRepository {
        fn record(&self, action: &str) {
            self.entries.lock().push(action.to_string());
        }

        fn entries(&self) -> Vec<String> {
            self.entries.lock().clone()
        }
    }

    sql_object!(UserRepository => |client| PgUserRepository { client });
    sql_object!(AuditRepository => |_client| RequestAuditRepository {
        entries: parking_lot::Mutex::new(Vec::new()),
    });
}

use repository::{AuditRepository, UserRepository};

repository_scan!(repository::RepositoryConfig, RepositoryScan::new());

// ==================== 请求处理 ====================

fn handle_request(context: &Arc<ApplicationContext>, request_id: &str, user_id: i32) -> ApplicationResult<()> {
    // 会话结束时释放本次请求的实例
    let _request = context.request_scope().begin_context(request_id);

    let audit = context.get_interface::<dyn AuditRepository>("auditRepository")?;
    audit.record(&format!("lookup user {}", user_id));

    let users = context.get_interface::<dyn UserRepository>("userRepository")?;
    match users.find_name(user_id) {
        Ok(Some(name)) => println!("   [{}] user {} is {}", request_id, user_id, name),
        Ok(None) => println!("   [{}] user {} not found", request_id, user_id),
        Err(e) => println!("   [{}] query failed: {}", request_id, e),
    }

    // 同一请求内拿到的是同一个审计仓库
    let same_audit = context.get_interface::<dyn AuditRepository>("auditRepository")?;
    same_audit.record("done");
    println!("   [{}] audit trail: {:?}", request_id, audit.entries());
    Ok(())
}

#[tokio::main]
async fn main() -> ApplicationResult<()> {
    println!("\n╔════════════════════════════════════════════════════╗");
    println!("║        ProxyBean - Repository Scan Demo            ║");
    println!("╚════════════════════════════════════════════════════╝\n");

    let config_paths = ["demos/repository-demo/application.toml", "application.toml"];
    let config_file = config_paths
        .iter()
        .find(|path| std::path::Path::new(path).exists())
        .copied()
        .unwrap_or("application.toml");

    let context = ProxyBeanApplication::new("RepositoryDemo")
        .config_file(config_file)
        .env_prefix("APP_")
        .run()
        .await?;

    println!("\n📦 Registered beans:");
    for name in context.get_bean_names() {
        println!("   - {}", name);
    }

    let client = context.get_bean_by_type::<SqlClient>()?;
    println!("\n🗄️  {:?}", client);

    println!("\n👤 Users:");
    let users = context.get_interface::<dyn UserRepository>("userRepository")?;
    match users.count() {
        Ok(count) => println!("   {} user(s) in database", count),
        Err(e) => tracing::warn!("Database not reachable, skipping queries: {}", e),
    }

    println!("\n📝 Requests:");
    handle_request(&context, "req-1", 1)?;
    handle_request(&context, "req-2", 2)?;

    context.shutdown().await;
    println!("\n✅ Demo finished");
    Ok(())
}
