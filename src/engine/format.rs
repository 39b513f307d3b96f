// ==========================================
// ESBoost 排放配额系统 - 展示格式化
// ==========================================
// 职责: 数字千分位、年数显示、状态文案
// 说明: 仅影响展示, 不影响计算结果
// ==========================================

use crate::domain::types::StatusLight;
use crate::i18n::t_with_args_in;

/// 年数显示上限
const YEARS_DISPLAY_CAP: f64 = 10.0;

/// 千分位格式化
///
/// 最多保留 3 位小数, 去掉末尾 0 (en / zh-CN 均使用 `,` 分组)
///
/// # 示例
/// ```
/// use esboost_permits::engine::format::format_number;
/// assert_eq!(format_number(1_234_567.5), "1,234,567.5");
/// ```
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = int_part == "0" && frac_part.is_empty();
    let mut out = String::new();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// 年数显示: 保留 1 位小数, 超过 10 年显示 ">10.0"
pub fn format_years(years: f64) -> String {
    if years > YEARS_DISPLAY_CAP {
        format!(">{:.1}", YEARS_DISPLAY_CAP)
    } else {
        format!("{:.1}", years)
    }
}

/// 月数显示: 整数不带小数, 否则保留 1 位
pub fn format_months(months: f64) -> String {
    if months.fract() == 0.0 {
        format!("{:.0}", months)
    } else {
        format!("{:.1}", months)
    }
}

/// 状态文案 (带 emoji 前缀)
pub fn status_label(status: StatusLight, years: f64, locale: &str) -> String {
    t_with_args_in(locale, status.label_key(), &[("years", &format_years(years))])
}
