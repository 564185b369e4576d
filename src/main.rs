// ==========================================
// 服装生产管理系统 - 主入口
// ==========================================
// 职责: 打开数据库、确保表结构、输出生产状态概览
// ==========================================

use anyhow::Context;
use garment_production::app::{get_default_db_path, AppState};
use garment_production::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", garment_production::APP_NAME);
    tracing::info!("系统版本: {}", garment_production::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let app_state = AppState::new(db_path.clone())
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("无法初始化AppState: {}", db_path))?;

    let stats = app_state
        .production_api
        .get_statistics()
        .context("统计查询失败")?;
    tracing::info!(
        total = stats.total,
        not_started = stats.not_started,
        in_progress = stats.in_progress,
        on_hold = stats.on_hold,
        completed = stats.completed,
        ready_for_billing = stats.ready_for_billing,
        "生产状态概览"
    );

    Ok(())
}
