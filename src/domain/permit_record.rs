// ==========================================
// ESBoost 排放配额系统 - 配额登记实体
// ==========================================
// 存储: permit_record 表
// 约束: 每个 (user_id, permit_year) 仅一行
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户的 EU 配额登记 (按年度)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitRecord {
    pub record_id: String,
    pub user_id: String,
    pub permit_year: i32,
    pub active_permits: u32,
    pub company_name: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PermitRecord {
    /// 构造新的登记记录 (record_id 与时间戳自动生成)
    pub fn new(
        user_id: &str,
        permit_year: i32,
        active_permits: u32,
        company_name: &str,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            record_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            permit_year,
            active_permits,
            company_name: company_name.to_string(),
            notes,
            created_at: now,
            updated_at: now,
        }
    }
}
