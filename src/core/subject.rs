use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEntry {
    #[serde(rename = "name")]
    pub label: String,
    pub task: String,
}

impl SubjectEntry {
    fn new(label: &str, task: &str) -> Self {
        Self {
            label: label.to_string(),
            task: task.to_string(),
        }
    }
}

/// Built-in entries: (label, task).
const DEFAULT_SUBJECTS: [(&str, &str); 6] = [
    ("语文", "这是一个可以展示晚自习任务的看板"),
    ("数学", "你可以点击各科的文本进行修改"),
    ("英语", "修改后的内容会保存在本地"),
    ("物理", "标题的日期与底部的一言会自动更新"),
    ("化学", "点击一言文本可以设置刷新间隔"),
    ("生物", "右上角可以更换背景"),
];

pub fn default_subjects() -> Vec<SubjectEntry> {
    DEFAULT_SUBJECTS
        .iter()
        .map(|(label, task)| SubjectEntry::new(label, task))
        .collect()
}

/// A stored list is usable only if it keeps the built-in labels in order.
pub fn has_builtin_labels(entries: &[SubjectEntry]) -> bool {
    entries.len() == DEFAULT_SUBJECTS.len()
        && entries
            .iter()
            .zip(DEFAULT_SUBJECTS.iter())
            .all(|(entry, (label, _))| entry.label == *label)
}

/// In-progress edit of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub index: usize,
    pub text: String,
}

/// The fixed subject list plus the single in-place editor.
#[derive(Debug, Clone)]
pub struct SubjectBoard {
    entries: Vec<SubjectEntry>,
    editing: Option<EditBuffer>,
}

impl Default for SubjectBoard {
    fn default() -> Self {
        Self::new(default_subjects())
    }
}

impl SubjectBoard {
    /// Falls back to the built-in entries when `entries` does not match them.
    pub fn new(entries: Vec<SubjectEntry>) -> Self {
        let entries = if has_builtin_labels(&entries) {
            entries
        } else {
            log::warn!(
                "Stored subject list has {} entries with unexpected labels, using defaults",
                entries.len()
            );
            default_subjects()
        };
        Self {
            entries,
            editing: None,
        }
    }

    pub fn entries(&self) -> &[SubjectEntry] {
        &self.entries
    }

    pub fn editing(&self) -> Option<&EditBuffer> {
        self.editing.as_ref()
    }

    /// Start editing `index`, replacing any other open edit.
    pub fn edit(&mut self, index: usize) {
        if let Some(entry) = self.entries.get(index) {
            self.editing = Some(EditBuffer {
                index,
                text: entry.task.clone(),
            });
        }
    }

    pub fn input(&mut self, text: String) {
        if let Some(ref mut buffer) = self.editing {
            buffer.text = text;
        }
    }

    pub fn cancel(&mut self) {
        self.editing = None;
    }

    /// Replace the task at `index` and close the editor.
    ///
    /// Returns the full list to persist, or `None` if the index is out of range.
    pub fn save(&mut self, index: usize, text: String) -> Option<&[SubjectEntry]> {
        let entry = self.entries.get_mut(index)?;
        entry.task = text;
        self.editing = None;
        Some(&self.entries)
    }

    /// Save whatever the open editor holds.
    pub fn commit(&mut self) -> Option<&[SubjectEntry]> {
        let EditBuffer { index, text } = self.editing.take()?;
        self.save(index, text)
    }
}
