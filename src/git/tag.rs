use serde::{Deserialize, Serialize};

use crate::error::ReleaseError;
use crate::git::repo::GitRepo;

/// 版本排序键
///
/// 去掉可选的 `v` 前缀后按 `.` 拆分并解析为非负整数，右侧补零到三段。
/// 任何一段解析失败（非数字、空串）得到哨兵值 `(-1, -1, -1)`，
/// 使畸形 tag 名在降序排序中排到所有合法语义化版本之后。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionKey(pub i64, pub i64, pub i64);

impl VersionKey {
    pub const MALFORMED: VersionKey = VersionKey(-1, -1, -1);

    pub fn parse(name: &str) -> VersionKey {
        let stripped = name.strip_prefix('v').unwrap_or(name);

        let mut parts = Vec::new();
        for component in stripped.split('.') {
            match component.parse::<u32>() {
                Ok(n) => parts.push(n as i64),
                Err(_) => return VersionKey::MALFORMED,
            }
        }

        while parts.len() < 3 {
            parts.push(0);
        }

        VersionKey(parts[0], parts[1], parts[2])
    }

    pub fn is_malformed(&self) -> bool {
        *self == VersionKey::MALFORMED
    }
}

/// 仓库中的一个 tag，只读快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub target_commit_id: String,
}

impl Tag {
    pub fn version_key(&self) -> VersionKey {
        VersionKey::parse(&self.name)
    }
}

/// 列出仓库全部 tag，按 VersionKey 降序排序
///
/// 不做过滤：非数字命名的 tag 也会返回，只是排在最后。
/// 同键 tag 按名字升序保持稳定顺序。
pub async fn list_release_tags(repo: &GitRepo) -> Result<Vec<Tag>, ReleaseError> {
    // %(*objectname) 是附注 tag 剥离后的提交；轻量 tag 该字段为空
    let stdout = repo
        .run(&[
            "for-each-ref",
            "refs/tags",
            "--format=%(refname:short)%09%(objectname)%09%(*objectname)",
        ])
        .await?;

    let mut tags = Vec::new();
    for line in stdout.lines() {
        let mut fields = line.split('\t');
        let name = match fields.next() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => continue,
        };
        let object = fields.next().unwrap_or("").trim();
        let peeled = fields.next().unwrap_or("").trim();

        let target = if peeled.is_empty() { object } else { peeled };
        if target.is_empty() {
            continue;
        }

        tags.push(Tag {
            name,
            target_commit_id: target.to_string(),
        });
    }

    sort_by_version(&mut tags);
    Ok(tags)
}

/// 按 VersionKey 降序排序，同键按名字升序
pub fn sort_by_version(tags: &mut [Tag]) {
    tags.sort_by(|a, b| {
        b.version_key()
            .cmp(&a.version_key())
            .then_with(|| a.name.cmp(&b.name))
    });
}
