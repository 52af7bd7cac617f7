use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::git::{CommitRecord, RangeResult};
use crate::notes::categorize::{categorize_commit, detect_breaking_change, Category};

/// 单条发布说明条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEntry {
    /// 提交消息的首行
    pub summary: String,
    /// 提交 id 的短形式（8 位）
    pub commit_id: String,
    /// 消息正文的其余行，没有则为 None
    pub details: Option<String>,
}

/// 发布说明中的一个小节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSection {
    pub category: Category,
    pub title: String,
    pub importance: u8,
    pub entries: Vec<NoteEntry>,
}

/// 一次发布的结构化说明
///
/// 只产出类型化数据，不负责 markdown/HTML 渲染。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseNotes {
    pub version: String,
    pub date: DateTime<Utc>,
    pub summary: String,
    pub sections: Vec<ReleaseSection>,
    pub breaking_changes: Vec<String>,
    pub has_breaking_changes: bool,
}

fn short_id(id: &str) -> &str {
    if id.len() > 8 {
        &id[..8]
    } else {
        id
    }
}

fn entry_for(record: &CommitRecord) -> NoteEntry {
    let mut lines = record.message.lines();
    let summary = lines.next().unwrap_or("").trim().to_string();

    let details: Vec<String> = lines
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    NoteEntry {
        summary,
        commit_id: short_id(&record.id).to_string(),
        details: if details.is_empty() {
            None
        } else {
            Some(details.join("\n"))
        },
    }
}

/// 生成发布摘要语句
fn release_summary(sections: &[ReleaseSection], breaking_changes: &[String]) -> String {
    let mut parts = Vec::new();

    if !breaking_changes.is_empty() {
        parts.push("This release contains breaking changes.".to_string());
    }

    let stats: Vec<String> = sections
        .iter()
        .filter(|s| !s.entries.is_empty())
        .map(|s| format!("{} {}", s.entries.len(), s.title.to_lowercase()))
        .collect();

    match stats.len() {
        0 => {}
        1 => parts.push(format!("This release includes {} changes.", stats[0])),
        _ => {
            let head = stats[..stats.len() - 1].join(", ");
            parts.push(format!(
                "This release includes {} and {} changes.",
                head,
                stats[stats.len() - 1]
            ));
        }
    }

    parts.join(" ")
}

/// 由发现结果组装结构化发布说明
///
/// 版本号取范围终点：终点是 tag 时直接采用，终点是 HEAD 时记为
/// `Unreleased`。日期取范围内最新提交的作者时间，范围为空时取当前时间。
pub fn build_release_notes(discovery: &RangeResult) -> ReleaseNotes {
    let mut grouped: Vec<(Category, Vec<NoteEntry>)> = Category::all()
        .iter()
        .map(|c| (*c, Vec::new()))
        .collect();
    let mut breaking_changes = Vec::new();

    for record in &discovery.commits {
        let category = categorize_commit(record);
        if let Some((_, entries)) = grouped.iter_mut().find(|(c, _)| *c == category) {
            entries.push(entry_for(record));
        }

        if detect_breaking_change(record) {
            let first_line = record.message.lines().next().unwrap_or("").trim();
            breaking_changes.push(format!("{} ({})", first_line, short_id(&record.id)));
        }
    }

    let mut sections: Vec<ReleaseSection> = grouped
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(category, entries)| ReleaseSection {
            category,
            title: category.title().to_string(),
            importance: category.importance(),
            entries,
        })
        .collect();
    // 重要度高的小节排前，同重要度保持类别表顺序
    sections.sort_by(|a, b| b.importance.cmp(&a.importance));

    let version = if discovery.end_ref == "HEAD" {
        "Unreleased".to_string()
    } else {
        discovery.end_ref.clone()
    };

    let date = discovery
        .commits
        .iter()
        .map(|c| c.authored_at)
        .max()
        .unwrap_or_else(Utc::now);

    let summary = release_summary(&sections, &breaking_changes);
    let has_breaking_changes = !breaking_changes.is_empty();

    ReleaseNotes {
        version,
        date,
        summary,
        sections,
        breaking_changes,
        has_breaking_changes,
    }
}
