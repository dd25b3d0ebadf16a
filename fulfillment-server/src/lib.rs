//! Fulfillment Server - 订单履约核心
//!
//! # 架构概述
//!
//! - **订单引擎** (`orders`): redb 存储、状态账本、状态迁移、命令处理
//! - **定价** (`pricing`): 加购计数器驱动的阶梯价
//! - **对账** (`reconciliation`): 部分签收、补发订单、退货入库
//! - **库存** (`inventory`): 库存流水 (唯一的库存变更途径)
//! - **审计** (`audit`): 操作日志
//! - **HTTP API** (`api`): 命令入口与查询接口
//!
//! # 模块结构
//!
//! ```text
//! fulfillment-server/src/
//! ├── core/            # 配置、状态、服务器
//! ├── api/             # HTTP 路由和处理器
//! ├── orders/          # 存储、账本、迁移、命令
//! ├── pricing/         # 行价与订单总价
//! ├── reconciliation/  # 部分签收与退货
//! ├── inventory/       # 库存流水
//! ├── audit/           # 操作日志
//! └── utils/           # 日志等工具
//! ```

pub mod api;
pub mod audit;
pub mod core;
pub mod inventory;
pub mod orders;
pub mod pricing;
pub mod reconciliation;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use orders::{EngineOptions, FulfillmentManager, OrderStorage};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env、创建工作目录、初始化日志
pub fn setup_environment() -> anyhow::Result<()> {
    // .env 文件可选
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;

    let log_dir = config.log_dir();
    let log_dir = log_dir
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Log directory is not valid UTF-8"))?;
    init_logger_with_file(&config.log_level, config.log_json, Some(log_dir))?;
    Ok(())
}
