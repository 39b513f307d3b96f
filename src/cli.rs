// ==========================================
// ESBoost 排放配额系统 - 命令行计算入口
// ==========================================
// calc 子命令的主体: JSON 输入 -> 状态 JSON
// 不读写文件/数据库, 由 main.rs 负责 I/O
// ==========================================

use crate::domain::PermitInventoryInput;
use crate::engine::{status_label, PermitsEngine};
use anyhow::{Context, Result};
use serde_json::{json, Value};

/// 从原始 JSON 计算配额状态
///
/// 返回 `{ "status": PermitsStatus, "status_label": String | null }`。
/// JSON 格式错误返回 Err; 输入非法 (缺字段/消耗率 <= 0) 返回
/// `is_valid: false` 且 status_label 为 null。
pub fn calculate_from_json(raw: &str, locale: &str) -> Result<Value> {
    let input: PermitInventoryInput =
        serde_json::from_str(raw).context("malformed permit inventory JSON")?;

    let engine = PermitsEngine::with_locale(locale);
    let status = engine.calculate_permits_status(&input);
    tracing::info!(
        is_valid = status.is_valid,
        locale = engine.locale(),
        "permit status calculated"
    );

    let label = status
        .data
        .as_ref()
        .map(|d| status_label(d.status_light, d.years_remaining, engine.locale()));

    Ok(json!({
        "status": status,
        "status_label": label,
    }))
}
