use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::error::ReleaseError;
use crate::git::{DiscoveryRequest, GitRepo, RangeResolver, RangeResult};
use crate::notes::{build_release_notes, ReleaseNotes};

/// 流水线最终报告
///
/// 每个阶段产出一个不可变结果值，逐级组合而不是在共享状态上原地
/// 修改；阶段内记录的非致命错误留在各自的结果里，只记一份
/// （见 `discovery.errors`）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub discovery: RangeResult,
    pub notes: ReleaseNotes,
}

/// 执行发现加组装的完整流水线
///
/// 仓库打不开或 tag/HEAD 无法查询时直接失败；范围表达式无法求值
/// 属于可恢复错误，降级为空提交列表并把告警记入报告。
pub async fn run_pipeline(config: &Config) -> Result<PipelineReport, ReleaseError> {
    let repo = GitRepo::open(&config.repo_path).await?;
    let resolver = RangeResolver::new(repo);

    let request = DiscoveryRequest {
        since_ref: config.since_ref.clone(),
    };
    let discovery = resolver.run_or_empty(&request).await?;

    let notes = build_release_notes(&discovery);
    info!(
        version = %notes.version,
        section_count = notes.sections.len(),
        "release notes assembled"
    );

    Ok(PipelineReport { discovery, notes })
}
