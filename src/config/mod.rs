use std::env;
use std::path::PathBuf;

use crate::git::SinceRef;

/// 运行配置
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// 仓库路径，默认当前目录
    pub repo_path: String,
    /// 范围起点约定：未设置为自动探测，空串为完整历史，其余为显式引用
    pub since_ref: SinceRef,
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config {
            repo_path: ".".to_string(),
            since_ref: SinceRef::Auto,
        };

        // 加载配置文件
        #[cfg(not(test))]
        config.load_from_env_file();
        // 加载环境变量（覆盖配置文件）
        config.load_from_env();

        config
    }

    pub fn load_from_env_file(&mut self) {
        // 尝试从用户主目录加载
        if let Ok(home) = env::var("HOME") {
            let user_env_path = PathBuf::from(format!("{}/.git-release-notes/.env", home));
            if user_env_path.exists() {
                dotenvy::from_path(user_env_path).ok();
            }
        }

        // 尝试从当前目录加载
        dotenvy::dotenv().ok();
    }

    pub fn load_from_env(&mut self) {
        if let Ok(path) = env::var("GIT_RELEASE_REPO_PATH") {
            let path = path.trim();
            if !path.is_empty() {
                self.repo_path = path.to_string();
            }
        }
        // 变量缺省与显式置空是两种不同的约定
        if let Ok(since) = env::var("GIT_RELEASE_SINCE_REF") {
            if since.trim().is_empty() {
                self.since_ref = SinceRef::AllHistory;
            } else {
                self.since_ref = SinceRef::Ref(since.trim().to_string());
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
