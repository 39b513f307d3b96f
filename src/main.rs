// ==========================================
// ESBoost 排放配额系统 - 命令行入口
// ==========================================
// 用法:
//   esboost-permits calc <input.json | -> [locale]
//   esboost-permits save <user_id> <permit_year> <active_permits> <company_name> [notes]
//   esboost-permits status <user_id> [permit_year] [avg_consumption_t_per_month] [cumulative_emissions_t]
//
// calc 读取 PermitInventoryInput JSON, 不访问数据库
// save/status 使用 ESBOOST_DB_PATH (缺省为用户数据目录)
// 结果写 stdout (JSON); 日志写 stderr, ESBOOST_LOG_FORMAT=json 时输出 JSON 日志
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use esboost_permits::api::{PermitsApi, PermitsStatusQuery};
use esboost_permits::cli::calculate_from_json;
use esboost_permits::config::ConfigManager;
use esboost_permits::db::{get_default_db_path, init_schema, open_sqlite_connection};
use esboost_permits::logging;
use esboost_permits::repository::PermitRecordRepository;
use serde_json::json;
use std::io::Read;
use std::sync::Arc;

const USAGE: &str = "usage:
  esboost-permits calc <input.json | -> [locale]
  esboost-permits save <user_id> <permit_year> <active_permits> <company_name> [notes]
  esboost-permits status <user_id> [permit_year] [avg_consumption_t_per_month] [cumulative_emissions_t]";

fn main() -> Result<()> {
    if std::env::var("ESBOOST_LOG_FORMAT").as_deref() == Ok("json") {
        logging::init_json();
    } else {
        logging::init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("calc") => run_calc(&args[1..]),
        Some("save") => run_save(&args[1..]),
        Some("status") => run_status(&args[1..]),
        _ => bail!(USAGE),
    }
}

/// 纯计算: JSON 输入 -> 配额状态
fn run_calc(args: &[String]) -> Result<()> {
    let source = args.first().ok_or_else(|| anyhow!(USAGE))?;
    let locale = args.get(1).map(String::as_str).unwrap_or("en");

    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {}", source))?
    };

    print_json(&calculate_from_json(&raw, locale)?)
}

/// 保存配额登记
fn run_save(args: &[String]) -> Result<()> {
    if args.len() < 4 {
        bail!(USAGE);
    }
    let permit_year: i32 = args[1].parse().context("permit_year must be an integer")?;
    let active_permits: u32 = args[2]
        .parse()
        .context("active_permits must be a non-negative integer")?;

    let api = open_api()?;
    let record = api.save_permit_record(
        &args[0],
        permit_year,
        active_permits,
        &args[3],
        args.get(4).cloned(),
    )?;
    print_json(&json!(record))
}

/// 基于登记查询配额状态
fn run_status(args: &[String]) -> Result<()> {
    let user_id = args.first().ok_or_else(|| anyhow!(USAGE))?;
    let permit_year = parse_optional::<i32>(args.get(1), "permit_year")?;
    let query = PermitsStatusQuery {
        avg_consumption_rate_t_per_month: parse_optional(args.get(2), "avg_consumption_t_per_month")?,
        cumulative_emissions_t: parse_optional(args.get(3), "cumulative_emissions_t")?,
        ..Default::default()
    };

    let api = open_api()?;
    let view = api.get_permits_status(user_id, permit_year, &query)?;
    print_json(&json!(view))
}

/// 打开数据库并组装 API
fn open_api() -> Result<PermitsApi> {
    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, "使用数据库");

    {
        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("failed to open {}", db_path))?;
        init_schema(&conn).context("failed to initialize schema")?;
    }

    let repo = PermitRecordRepository::new(&db_path)?;
    let config = ConfigManager::new(&db_path).map_err(|e| anyhow!(e.to_string()))?;
    Ok(PermitsApi::new(Arc::new(repo), Arc::new(config)))
}

/// 可选位置参数, "-" 视为未提供
fn parse_optional<T: std::str::FromStr>(arg: Option<&String>, name: &str) -> Result<Option<T>> {
    match arg.map(|s| s.trim()).filter(|s| !s.is_empty() && *s != "-") {
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("invalid {}: {}", name, s)),
        None => Ok(None),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
