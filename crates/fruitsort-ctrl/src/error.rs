//! 控制层错误类型定义

use fruitsort_sim::SimError;
use fruitsort_vision::VisionError;
use thiserror::Error;

/// 控制层错误类型
///
/// 瞬态故障（传感器暂不可用、分类失败、状态队列满）不会出现在这里，
/// 它们按周期策略就地处理；能传播到调用方的都是致命错误。
#[derive(Error, Debug)]
pub enum CtrlError {
    /// 工作单元错误（断开、非法指令）
    #[error("cell error: {0}")]
    Cell(#[from] SimError),

    /// 配置错误
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// 配置加载与校验错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// 字段取值非法
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// 视觉配置校验失败
    #[error(transparent)]
    Vision(#[from] VisionError),
}
