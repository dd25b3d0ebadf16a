use crate::core::{Config, Result};
use crate::orders::FulfillmentManager;
use std::sync::Arc;

/// 服务器状态 - 持有配置与订单引擎
///
/// Clone 成本很低 (引擎内部为 Arc)，作为 axum 的 State 使用。
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Arc<Config>,
    /// 订单履约引擎
    pub manager: FulfillmentManager,
}

impl ServerState {
    pub fn new(config: Config, manager: FulfillmentManager) -> Self {
        Self {
            config: Arc::new(config),
            manager,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 确保工作目录存在
    /// 2. 打开数据库 (work_dir/DB_FILE)
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let db_path = config.db_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = FulfillmentManager::new(&db_path, config.engine_options())?;
        tracing::info!(db_path = %db_path.display(), "Order database opened");
        Ok(Self::new(config.clone(), manager))
    }

    pub fn manager(&self) -> &FulfillmentManager {
        &self.manager
    }
}
