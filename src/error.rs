use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 发布说明流程错误类型
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ReleaseError {
    #[error("仓库不可用: {message}")]
    RepositoryUnavailable { message: String, path: Option<String> },

    #[error("提交范围解析失败: {range} - {message}")]
    RangeResolution { range: String, message: String },

    #[error("Git 命令执行失败: {message}")]
    GitCommand { message: String },
}

impl ReleaseError {
    /// 创建仓库不可用错误
    pub fn unavailable(message: impl Into<String>, path: Option<String>) -> Self {
        ReleaseError::RepositoryUnavailable {
            message: message.into(),
            path,
        }
    }

    /// 创建范围解析错误，携带尝试过的范围表达式
    pub fn range(range: impl Into<String>, message: impl Into<String>) -> Self {
        ReleaseError::RangeResolution {
            range: range.into(),
            message: message.into(),
        }
    }

    /// 创建 Git 命令错误
    pub fn git(message: impl Into<String>) -> Self {
        ReleaseError::GitCommand {
            message: message.into(),
        }
    }

    /// 检查错误是否可由调用方恢复（用空提交列表继续流程）
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReleaseError::RangeResolution { .. })
    }
}

/// 流程阶段标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    CommitDiscovery,
    NotesAssembly,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::CommitDiscovery => "commit_discovery",
            Stage::NotesAssembly => "notes_assembly",
        }
    }
}

/// 单个阶段内记录的非致命错误
///
/// 材料化单个提交失败时记录一条并继续，整个 run 不中断。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl StageError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        StageError {
            stage,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
