// ==========================================
// ESBoost 排放配额系统 - 配置管理器
// ==========================================
// 职责: 配额默认参数的加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::permit::{DEFAULT_TARGET_BUFFER_MONTHS, DEFAULT_WARNING_THRESHOLD_PCT};
use crate::i18n::{normalize_locale, DEFAULT_LOCALE};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 默认月均排放 (tCO₂/月), 未提供实测数据时使用
pub const DEFAULT_CONSUMPTION_T_PER_MONTH: f64 = 32_000.0;

// ==========================================
// PermitsDefaults - 配额计算默认参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitsDefaults {
    pub target_buffer_months: f64,
    pub warning_threshold_pct: f64,
    pub avg_consumption_rate_t_per_month: f64,
    pub locale: String,
}

impl Default for PermitsDefaults {
    fn default() -> Self {
        Self {
            target_buffer_months: DEFAULT_TARGET_BUFFER_MONTHS,
            warning_threshold_pct: DEFAULT_WARNING_THRESHOLD_PCT,
            avg_consumption_rate_t_per_month: DEFAULT_CONSUMPTION_T_PER_MONTH,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 配额计算参数 =====

    /// 读取数值配置，缺失或非法时返回默认值
    ///
    /// `accept` 为合法性判定，非法值记录告警
    fn get_f64_or_default(
        &self,
        key: &str,
        default: f64,
        accept: fn(f64) -> bool,
    ) -> Result<f64, Box<dyn Error>> {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<f64>() {
            Ok(v) if accept(v) => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = default,
                    "配置值非法，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 获取目标缓冲期（月，默认 12）
    pub fn get_target_buffer_months(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or_default(
            config_keys::PERMITS_TARGET_BUFFER_MONTHS,
            DEFAULT_TARGET_BUFFER_MONTHS,
            |v| v.is_finite() && v >= 0.0,
        )
    }

    /// 获取预警阈值（%，默认 80）
    pub fn get_warning_threshold_pct(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or_default(
            config_keys::PERMITS_WARNING_THRESHOLD_PCT,
            DEFAULT_WARNING_THRESHOLD_PCT,
            |v| v.is_finite() && (0.0..=100.0).contains(&v),
        )
    }

    /// 获取默认月均排放（tCO₂/月，默认 32000）
    pub fn get_default_consumption_rate(&self) -> Result<f64, Box<dyn Error>> {
        self.get_f64_or_default(
            config_keys::PERMITS_DEFAULT_CONSUMPTION_T_PER_MONTH,
            DEFAULT_CONSUMPTION_T_PER_MONTH,
            |v| v.is_finite() && v > 0.0,
        )
    }

    /// 获取界面语言（默认 en，不支持的语言回退到 en）
    pub fn get_ui_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self
            .get_config_value(config_keys::UI_LOCALE)?
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        Ok(normalize_locale(&value).to_string())
    }

    /// 获取配额计算默认参数
    pub fn get_permits_defaults(&self) -> Result<PermitsDefaults, Box<dyn Error>> {
        Ok(PermitsDefaults {
            target_buffer_months: self.get_target_buffer_months()?,
            warning_threshold_pct: self.get_warning_threshold_pct()?,
            avg_consumption_rate_t_per_month: self.get_default_consumption_rate()?,
            locale: self.get_ui_locale()?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 配额计算
    pub const PERMITS_TARGET_BUFFER_MONTHS: &str = "permits_target_buffer_months";
    pub const PERMITS_WARNING_THRESHOLD_PCT: &str = "permits_warning_threshold_pct";
    pub const PERMITS_DEFAULT_CONSUMPTION_T_PER_MONTH: &str =
        "permits_default_consumption_t_per_month";

    // 界面
    pub const UI_LOCALE: &str = "ui_locale";
}
