use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ReleaseError, Stage, StageError};
use crate::git::repo::GitRepo;
use crate::git::tag::{list_release_tags, Tag};

/// 起点引用的三态约定
///
/// - `Auto`：未指定，按 tag 拓扑自动探测范围
/// - `AllHistory`：显式要求完整历史（对应"显式空 override"）
/// - `Ref`：显式指定起点引用，原样使用，不做 tag 探测
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinceRef {
    #[default]
    Auto,
    AllHistory,
    Ref(String),
}

/// 范围来源的上下文标签，固定枚举，供展示层使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeContext {
    SinceOverride { since_ref: Option<String> },
    InitialRelease,
    UnreleasedChanges,
    LastRelease,
}

impl fmt::Display for RangeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeContext::SinceOverride {
                since_ref: Some(r),
            } => write!(f, "commits since {}", r),
            RangeContext::SinceOverride { since_ref: None } => {
                write!(f, "commits since beginning of history")
            }
            RangeContext::InitialRelease => write!(f, "initial release - showing all commits"),
            RangeContext::UnreleasedChanges => write!(f, "unreleased changes since last tag"),
            RangeContext::LastRelease => write!(f, "changes in last release"),
        }
    }
}

/// 范围内发现的一个提交
///
/// 材料化时与第一父提交（根提交与空树）做 diff 得到 `changed_paths`，
/// 之后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    pub message: String,
    pub author: String,
    pub authored_at: DateTime<Utc>,
    pub changed_paths: Vec<String>,
}

/// 一次发现运行的完整结果
///
/// `commits` 恰好是从 `end_ref` 可达而从 `start_ref` 不可达的提交集合
/// （`start_ref` 缺省时为 `end_ref` 的全部可达提交），按日志遍历顺序
/// 从新到旧排列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeResult {
    pub start_ref: Option<String>,
    pub end_ref: String,
    pub context_label: RangeContext,
    pub commits: Vec<CommitRecord>,
    pub all_tags: Vec<String>,
    pub latest_tag: Option<String>,
    /// 单个提交材料化失败时记录在此，run 继续尽力完成
    pub errors: Vec<StageError>,
}

/// 发现请求参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub since_ref: SinceRef,
}

/// 根据 override、当前 HEAD 与 tag 列表决定提交范围
///
/// 纯函数状态机：
/// 1. 显式 override 原样生效；
/// 2. 无 tag 时取全部历史（首次发布）；
/// 3. HEAD 已离开最新 tag 时取最新 tag 到 HEAD（未发布变更）；
/// 4. HEAD 停在最新 tag 且存在上一个 tag 时取两个 tag 之间；
/// 5. 仅有一个 tag 且 HEAD 停在其上时取该 tag 的全部可达历史。
pub fn resolve_range(
    since_ref: &SinceRef,
    head_commit: Option<&str>,
    tags: &[Tag],
) -> (Option<String>, String, RangeContext) {
    match since_ref {
        SinceRef::Ref(r) => (
            Some(r.clone()),
            "HEAD".to_string(),
            RangeContext::SinceOverride {
                since_ref: Some(r.clone()),
            },
        ),
        SinceRef::AllHistory => (
            None,
            "HEAD".to_string(),
            RangeContext::SinceOverride { since_ref: None },
        ),
        SinceRef::Auto => {
            if tags.is_empty() {
                return (None, "HEAD".to_string(), RangeContext::InitialRelease);
            }

            let latest = &tags[0];
            // 同键多 tag 共指 HEAD 时只看提交身份，不关心取到哪个 tag 对象
            let head_at_latest = head_commit == Some(latest.target_commit_id.as_str());

            if !head_at_latest {
                (
                    Some(latest.name.clone()),
                    "HEAD".to_string(),
                    RangeContext::UnreleasedChanges,
                )
            } else if tags.len() >= 2 {
                (
                    Some(tags[1].name.clone()),
                    latest.name.clone(),
                    RangeContext::LastRelease,
                )
            } else {
                (None, latest.name.clone(), RangeContext::LastRelease)
            }
        }
    }
}

/// 提交范围解析器
///
/// 对仓库只读，不创建 tag、commit 或 ref；每次 `run` 相互独立。
pub struct RangeResolver {
    repo: GitRepo,
}

impl RangeResolver {
    pub fn new(repo: GitRepo) -> Self {
        RangeResolver { repo }
    }

    pub fn repo(&self) -> &GitRepo {
        &self.repo
    }

    /// 列出按版本降序排序的全部 tag
    pub async fn list_release_tags(&self) -> Result<Vec<Tag>, ReleaseError> {
        list_release_tags(&self.repo).await
    }

    /// 解析当前仓库状态下应采用的提交范围
    pub async fn resolve_range(
        &self,
        since_ref: &SinceRef,
    ) -> Result<(Option<String>, String, RangeContext), ReleaseError> {
        let tags = self.list_release_tags().await?;
        let head = self.repo.head_commit().await?;
        Ok(resolve_range(since_ref, head.as_deref(), &tags))
    }

    /// 材料化范围内的提交，从新到旧
    ///
    /// 范围表达式无法求值（如 tag 已被删除）时整体返回
    /// `RangeResolution` 错误；单个提交读取失败则记入返回的
    /// 错误列表并继续。
    pub async fn materialize(
        &self,
        start_ref: Option<&str>,
        end_ref: &str,
    ) -> Result<(Vec<CommitRecord>, Vec<StageError>), ReleaseError> {
        let range = match start_ref {
            Some(start) => format!("{}..{}", start, end_ref),
            None => end_ref.to_string(),
        };

        // 空仓库：HEAD 尚无提交时必须无错返回空序列
        if start_ref.is_none() && end_ref == "HEAD" && self.repo.head_commit().await?.is_none() {
            debug!("repository has no commits, returning empty range");
            return Ok((Vec::new(), Vec::new()));
        }

        let output = self.repo.output(&["rev-list", range.as_str()]).await?;
        if !output.status.success() {
            return Err(ReleaseError::range(
                range,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let mut commits = Vec::new();
        let mut errors = Vec::new();

        for id in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match self.read_commit(id).await {
                Ok(record) => commits.push(record),
                Err(e) => {
                    // 损坏的提交对象不中断整体发现，记录后继续
                    warn!("failed to materialize commit {}: {}", id, e);
                    errors.push(StageError::new(
                        Stage::CommitDiscovery,
                        format!("commit {}: {}", id, e),
                    ));
                }
            }
        }

        Ok((commits, errors))
    }

    /// 读取单个提交的元数据与改动路径
    async fn read_commit(&self, id: &str) -> Result<CommitRecord, ReleaseError> {
        let meta = self
            .repo
            .run(&["show", "-s", "--format=%H%x1f%P%x1f%an%x1f%at%x1f%B", id])
            .await?;

        let mut fields = meta.splitn(5, '\u{1f}');
        let commit_id = fields
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ReleaseError::git(format!("empty metadata for commit {}", id)))?
            .to_string();
        let parents = fields.next().unwrap_or("").trim().to_string();
        let author = fields.next().unwrap_or("").trim().to_string();
        let timestamp_raw = fields.next().unwrap_or("").trim().to_string();
        let message = fields.next().unwrap_or("").trim().to_string();

        let seconds: i64 = timestamp_raw.parse().map_err(|_| {
            ReleaseError::git(format!(
                "invalid author timestamp '{}' for commit {}",
                timestamp_raw, commit_id
            ))
        })?;
        let authored_at = Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
            ReleaseError::git(format!(
                "author timestamp {} out of range for commit {}",
                seconds, commit_id
            ))
        })?;

        let first_parent = parents.split_whitespace().next().map(str::to_string);
        let changed_paths = self
            .changed_paths(&commit_id, first_parent.as_deref())
            .await?;

        Ok(CommitRecord {
            id: commit_id,
            message,
            author,
            authored_at,
            changed_paths,
        })
    }

    /// 与第一父提交（根提交与空树）做 diff，收集前后路径
    ///
    /// 路径保持 diff 枚举的插入顺序；重命名或复制贡献前后两个路径，
    /// 两者相同则只记一次。
    async fn changed_paths(
        &self,
        id: &str,
        first_parent: Option<&str>,
    ) -> Result<Vec<String>, ReleaseError> {
        let stdout = match first_parent {
            Some(parent) => {
                self.repo
                    .run(&[
                        "diff-tree", "-r", "--no-commit-id", "--name-status", "-M", parent, id,
                    ])
                    .await?
            }
            None => {
                self.repo
                    .run(&[
                        "diff-tree", "-r", "--no-commit-id", "--name-status", "-M", "--root", id,
                    ])
                    .await?
            }
        };

        let mut paths = Vec::new();
        for line in stdout.lines() {
            let mut columns = line.split('\t');
            let status = columns.next().unwrap_or("").trim();
            if status.is_empty() {
                continue;
            }

            let first = match columns.next() {
                Some(p) if !p.is_empty() => p,
                _ => continue,
            };
            match columns.next() {
                Some(second) if !second.is_empty() && second != first => {
                    paths.push(first.to_string());
                    paths.push(second.to_string());
                }
                _ => paths.push(first.to_string()),
            }
        }

        Ok(paths)
    }

    /// 执行完整的发现流程：列 tag、定范围、材料化、回填 tag 字段
    ///
    /// 范围无法求值时返回 `RangeResolution` 错误，是否以空列表继续
    /// 由调用方决定（见 `run_or_empty`）。
    pub async fn run(&self, request: &DiscoveryRequest) -> Result<RangeResult, ReleaseError> {
        self.run_impl(request, false).await
    }

    /// 同 `run`，但可恢复的范围解析失败降级为空提交列表加一条阶段错误
    pub async fn run_or_empty(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<RangeResult, ReleaseError> {
        self.run_impl(request, true).await
    }

    async fn run_impl(
        &self,
        request: &DiscoveryRequest,
        lenient: bool,
    ) -> Result<RangeResult, ReleaseError> {
        let tags = self.list_release_tags().await?;
        let head = self.repo.head_commit().await?;
        let (start_ref, end_ref, context_label) =
            resolve_range(&request.since_ref, head.as_deref(), &tags);

        debug!(
            start = start_ref.as_deref().unwrap_or("<history start>"),
            end = %end_ref,
            "resolved commit range"
        );

        let (commits, errors) = match self.materialize(start_ref.as_deref(), &end_ref).await {
            Ok(pair) => pair,
            Err(e) if lenient && e.is_recoverable() => {
                warn!("range materialization failed, continuing with empty commit list: {}", e);
                (
                    Vec::new(),
                    vec![StageError::new(Stage::CommitDiscovery, e.to_string())],
                )
            }
            Err(e) => return Err(e),
        };

        // 长驻进程中 tag 可能并发新增，结果字段用重新查询的列表
        let current_tags = self.list_release_tags().await?;

        info!(
            commit_count = commits.len(),
            context = %context_label,
            "commit discovery finished"
        );

        Ok(RangeResult {
            start_ref,
            end_ref,
            context_label,
            commits,
            latest_tag: current_tags.first().map(|t| t.name.clone()),
            all_tags: current_tags.into_iter().map(|t| t.name).collect(),
            errors,
        })
    }
}
