use std::path::{Path, PathBuf};
use std::process::Output;

use tokio::process::Command;

use crate::error::ReleaseError;

/// Git 仓库句柄
///
/// 所有查询通过 `git -C <root>` 子进程完成，纯只读：
/// 本模块从不创建或修改 tag、commit、ref。
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// 打开并校验仓库
    ///
    /// 路径不是 git 仓库或 git 本身不可执行时返回 `RepositoryUnavailable`。
    pub async fn open(path: impl AsRef<Path>) -> Result<GitRepo, ReleaseError> {
        let root = path.as_ref().to_path_buf();
        let path_display = root.display().to_string();

        let output = Command::new("git")
            .arg("-C")
            .arg(&root)
            .args(["rev-parse", "--git-dir"])
            .output()
            .await
            .map_err(|e| {
                ReleaseError::unavailable(
                    format!("Failed to run git: {}", e),
                    Some(path_display.clone()),
                )
            })?;

        if !output.status.success() {
            return Err(ReleaseError::unavailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
                Some(path_display),
            ));
        }

        Ok(GitRepo { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 执行一条 git 子命令并返回原始输出
    ///
    /// 仅在进程无法启动时报错；非零退出码由调用方根据语境解释。
    pub(crate) async fn output(&self, args: &[&str]) -> Result<Output, ReleaseError> {
        Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .await
            .map_err(|e| ReleaseError::git(format!("Failed to run git {}: {}", args.join(" "), e)))
    }

    /// 执行 git 子命令，要求成功并返回标准输出文本
    pub(crate) async fn run(&self, args: &[&str]) -> Result<String, ReleaseError> {
        let output = self.output(args).await?;

        if !output.status.success() {
            return Err(ReleaseError::git(format!(
                "git {} failed with exit code {:?}: {}",
                args.join(" "),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// 当前 HEAD 指向的提交
    ///
    /// 空仓库（分支尚未诞生）或游离引用无法解析时返回 `None`。
    pub async fn head_commit(&self) -> Result<Option<String>, ReleaseError> {
        let output = self
            .output(&["rev-parse", "--verify", "--quiet", "HEAD^{commit}"])
            .await?;

        if !output.status.success() {
            return Ok(None);
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            Ok(None)
        } else {
            Ok(Some(id))
        }
    }
}
