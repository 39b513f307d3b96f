// ==========================================
// ESBoost 排放配额系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建库 (schema_version / config / permit_record)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 显式指定数据库路径的环境变量
pub const DB_PATH_ENV: &str = "ESBOOST_DB_PATH";

/// 数据库文件名
pub const DB_FILE_NAME: &str = "esboost_permits.db";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS permit_record (
            record_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            permit_year INTEGER NOT NULL,
            active_permits INTEGER NOT NULL CHECK (active_permits >= 0),
            company_name TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, permit_year)
        );

        CREATE INDEX IF NOT EXISTS idx_permit_record_user
            ON permit_record(user_id, permit_year DESC);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 ESBOOST_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    let env_path = std::env::var(DB_PATH_ENV).ok();
    let app_dir = dirs::data_dir().map(|dir| dir.join("esboost")).filter(|dir| {
        // 显式路径优先时不创建数据目录
        if env_path.as_deref().map_or(false, |p| !p.trim().is_empty()) {
            return true;
        }
        match std::fs::create_dir_all(dir) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "无法创建数据目录，使用当前目录");
                false
            }
        }
    });

    resolve_db_path(env_path.as_deref(), app_dir)
}

/// 按优先级解析数据库路径（纯函数，不访问环境与文件系统）
///
/// - env: ESBOOST_DB_PATH 的值（空白视为未设置）
/// - app_dir: 可用的应用数据目录
pub fn resolve_db_path(env: Option<&str>, app_dir: Option<PathBuf>) -> String {
    if let Some(trimmed) = env.map(str::trim).filter(|p| !p.is_empty()) {
        return trimmed.to_string();
    }

    app_dir
        .map(|dir| dir.join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(DB_FILE_NAME))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let scopes: i64 = conn
            .query_row("SELECT COUNT(*) FROM config_scope", [], |row| row.get(0))
            .unwrap();
        assert_eq!(scopes, 1);
    }

    #[test]
    fn test_resolve_db_path_env_override() {
        let app_dir = Some(PathBuf::from("/data/esboost"));
        assert_eq!(
            resolve_db_path(Some("  /tmp/esboost_test.db  "), app_dir.clone()),
            "/tmp/esboost_test.db"
        );
        // 空白环境变量视为未设置
        assert_eq!(
            resolve_db_path(Some("   "), app_dir),
            PathBuf::from("/data/esboost/esboost_permits.db").to_string_lossy()
        );
    }

    #[test]
    fn test_resolve_db_path_fallbacks() {
        assert_eq!(
            resolve_db_path(None, Some(PathBuf::from("/data/esboost"))),
            PathBuf::from("/data/esboost/esboost_permits.db").to_string_lossy()
        );
        assert_eq!(
            resolve_db_path(None, None),
            PathBuf::from("./esboost_permits.db").to_string_lossy()
        );
    }

    #[test]
    fn test_permit_record_rejects_negative_permits() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO permit_record VALUES ('r1', 'u1', 2025, -1, 'ACME', NULL, 'x', 'x')",
            [],
        );
        assert!(result.is_err());
    }
}
