// ==========================================
// ESBoost 排放配额系统 - 配额登记仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 每个 (user_id, permit_year) 仅一行, 写入走 UPSERT
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::permit_record::PermitRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT
        record_id, user_id, permit_year, active_permits,
        company_name, notes, created_at, updated_at
    FROM permit_record
"#;

// ==========================================
// PermitRecordRepository - 配额登记仓储
// ==========================================
/// 配额登记仓储
/// 职责: 管理 permit_record 表的读写
pub struct PermitRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PermitRecordRepository {
    /// 创建新的 PermitRecordRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入配额登记
    ///
    /// 同一 (user_id, permit_year) 已存在时更新配额数/公司名/备注,
    /// 保留原 record_id 与 created_at
    ///
    /// # 返回
    /// - Ok(PermitRecord): 落库后的记录
    pub fn upsert(&self, record: &PermitRecord) -> RepositoryResult<PermitRecord> {
        {
            let conn = self.get_conn()?;
            conn.execute(
                r#"
                INSERT INTO permit_record (
                    record_id, user_id, permit_year, active_permits,
                    company_name, notes, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(user_id, permit_year) DO UPDATE SET
                    active_permits = excluded.active_permits,
                    company_name = excluded.company_name,
                    notes = excluded.notes,
                    updated_at = excluded.updated_at
                "#,
                params![
                    record.record_id,
                    record.user_id,
                    record.permit_year,
                    record.active_permits,
                    record.company_name,
                    record.notes,
                    record.created_at,
                    record.updated_at,
                ],
            )?;
        }

        self.find_by_user_and_year(&record.user_id, record.permit_year)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "PermitRecord".to_string(),
                id: format!("{}/{}", record.user_id, record.permit_year),
            })
    }

    /// 按 (user_id, permit_year) 查询
    ///
    /// # 返回
    /// - Ok(Some(PermitRecord)): 找到
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find_by_user_and_year(
        &self,
        user_id: &str,
        permit_year: i32,
    ) -> RepositoryResult<Option<PermitRecord>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE user_id = ?1 AND permit_year = ?2", SELECT_COLUMNS);
        let record = conn
            .query_row(&sql, params![user_id, permit_year], map_row)
            .optional()?;
        Ok(record)
    }

    /// 查询用户最新年度的登记
    pub fn find_latest_by_user(&self, user_id: &str) -> RepositoryResult<Option<PermitRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE user_id = ?1 ORDER BY permit_year DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let record = conn.query_row(&sql, params![user_id], map_row).optional()?;
        Ok(record)
    }

    /// 查询用户全部登记 (年度倒序)
    pub fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<PermitRecord>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE user_id = ?1 ORDER BY permit_year DESC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![user_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 删除登记
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 记录不存在
    pub fn delete(&self, user_id: &str, permit_year: i32) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM permit_record WHERE user_id = ?1 AND permit_year = ?2",
            params![user_id, permit_year],
        )?;
        Ok(affected > 0)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<PermitRecord> {
    Ok(PermitRecord {
        record_id: row.get(0)?,
        user_id: row.get(1)?,
        permit_year: row.get(2)?,
        active_permits: row.get(3)?,
        company_name: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
