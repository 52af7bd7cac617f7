use serde::{Deserialize, Serialize};

use crate::git::CommitRecord;

/// 提交类别，按 keep-a-changelog 的惯例划分
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Added,
    Changed,
    Deprecated,
    Removed,
    Fixed,
    Security,
}

impl Category {
    pub fn title(&self) -> &'static str {
        match self {
            Category::Added => "Added",
            Category::Changed => "Changed",
            Category::Deprecated => "Deprecated",
            Category::Removed => "Removed",
            Category::Fixed => "Fixed",
            Category::Security => "Security",
        }
    }

    /// 类别重要度，用于小节排序
    pub fn importance(&self) -> u8 {
        match self {
            Category::Security => 4,
            Category::Added => 3,
            Category::Removed => 3,
            Category::Changed => 2,
            Category::Deprecated => 2,
            Category::Fixed => 1,
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::Added,
            Category::Changed,
            Category::Deprecated,
            Category::Removed,
            Category::Fixed,
            Category::Security,
        ]
    }
}

/// 类别关键字表，按表内顺序匹配
struct CategoryRule {
    category: Category,
    keywords: &'static [&'static str],
}

static CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Added,
        keywords: &["feat", "feature", "add"],
    },
    CategoryRule {
        category: Category::Changed,
        keywords: &["change", "update", "enhance"],
    },
    CategoryRule {
        category: Category::Deprecated,
        keywords: &["deprecate"],
    },
    CategoryRule {
        category: Category::Removed,
        keywords: &["remove", "delete"],
    },
    CategoryRule {
        category: Category::Fixed,
        keywords: &["fix", "bug", "patch"],
    },
    CategoryRule {
        category: Category::Security,
        keywords: &["security", "vuln", "cve"],
    },
];

/// 根据提交消息归类
///
/// 安全类关键字优先级最高，先于其他规则检查；没有任何关键字
/// 命中时归入 `Changed`。
pub fn categorize_commit(record: &CommitRecord) -> Category {
    let message = record.message.to_lowercase();
    if message.is_empty() {
        return Category::Changed;
    }

    let security_keywords = CATEGORY_RULES
        .iter()
        .find(|rule| rule.category == Category::Security)
        .map(|rule| rule.keywords)
        .unwrap_or(&[]);
    if security_keywords.iter().any(|kw| message.contains(kw)) {
        return Category::Security;
    }

    for rule in CATEGORY_RULES {
        if rule.keywords.iter().any(|kw| message.contains(kw)) {
            return rule.category;
        }
    }

    Category::Changed
}

/// 破坏性变更的指示短语
static BREAKING_INDICATORS: &[&str] = &[
    "breaking change",
    "breaking-change",
    "breaks backward compatibility",
    "migration required",
];

/// 检测提交是否包含破坏性变更
pub fn detect_breaking_change(record: &CommitRecord) -> bool {
    let message = record.message.to_lowercase();
    BREAKING_INDICATORS
        .iter()
        .any(|indicator| message.contains(indicator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(message: &str) -> CommitRecord {
        CommitRecord {
            id: "0123456789abcdef".to_string(),
            message: message.to_string(),
            author: "tester".to_string(),
            authored_at: Utc::now(),
            changed_paths: Vec::new(),
        }
    }

    #[test]
    fn test_categorize_by_keyword() {
        let cases = vec![
            ("feat: add user login", Category::Added),
            ("update dependency versions", Category::Changed),
            ("deprecate old config format", Category::Deprecated),
            ("remove legacy endpoint", Category::Removed),
            ("fix: null pointer in parser", Category::Fixed),
            ("refactor internals", Category::Changed),
        ];

        for (message, expected) in cases {
            assert_eq!(
                categorize_commit(&record(message)),
                expected,
                "message '{}' should be {:?}",
                message,
                expected
            );
        }
    }

    #[test]
    fn test_security_wins_over_other_keywords() {
        // "update" 同时命中 Changed，但安全关键字优先
        let commit = record("update openssl to patch CVE-2024-1234");
        assert_eq!(categorize_commit(&commit), Category::Security);
    }

    #[test]
    fn test_empty_message_defaults_to_changed() {
        assert_eq!(categorize_commit(&record("")), Category::Changed);
    }

    #[test]
    fn test_detect_breaking_change_phrases() {
        assert!(detect_breaking_change(&record(
            "feat: new api\n\nBREAKING CHANGE: removes v1 endpoints"
        )));
        assert!(detect_breaking_change(&record(
            "schema rework, migration required"
        )));
        assert!(!detect_breaking_change(&record("fix: typo in readme")));
    }
}
