// ==========================================
// ESBoost 排放配额系统 - 领域类型定义
// ==========================================
// 配额状态灯: 分级制, 不是评分制
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 配额状态灯 (Status Light)
// ==========================================
// 顺序: Green < Yellow < Red (风险递增)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLight {
    Green,  // 余量充足 (> 24 个月)
    Yellow, // 关注 (12 ~ 24 个月)
    Red,    // 危险 (<= 12 个月 或 无配额)
}

impl StatusLight {
    /// 对应的 i18n 状态文案键
    pub fn label_key(&self) -> &'static str {
        match self {
            StatusLight::Green => "permits.status_label.green",
            StatusLight::Yellow => "permits.status_label.yellow",
            StatusLight::Red => "permits.status_label.red",
        }
    }
}

impl fmt::Display for StatusLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLight::Green => write!(f, "green"),
            StatusLight::Yellow => write!(f, "yellow"),
            StatusLight::Red => write!(f, "red"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_light_serde_lowercase() {
        let json = serde_json::to_string(&StatusLight::Yellow).unwrap();
        assert_eq!(json, "\"yellow\"");

        let parsed: StatusLight = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(parsed, StatusLight::Red);
    }

    #[test]
    fn test_status_light_ordering() {
        assert!(StatusLight::Green < StatusLight::Yellow);
        assert!(StatusLight::Yellow < StatusLight::Red);
    }
}
