//! The insight memo: an append-only, in-process list of free-text insights.

use tokio::sync::Mutex;

/// Rendered when no insights have been appended yet.
pub const EMPTY_MEMO_PLACEHOLDER: &str =
    "No insights recorded yet. Use the append_insight tool to add one.";

const MEMO_HEADER: &str = "Insights collected so far:";

/// Ordered, append-only insight list. Grows unbounded for the lifetime of
/// the process and is never persisted.
#[derive(Debug, Default)]
pub struct InsightMemo {
    entries: Mutex<Vec<String>>,
}

impl InsightMemo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an insight. Content is never rejected or deduplicated.
    pub async fn append(&self, insight: impl Into<String>) {
        self.entries.lock().await.push(insight.into());
    }

    /// Renders the memo as one document, one bullet per insight in insertion
    /// order. Recomputed on every call.
    pub async fn render(&self) -> String {
        let entries = self.entries.lock().await;
        if entries.is_empty() {
            return EMPTY_MEMO_PLACEHOLDER.to_string();
        }
        let mut memo = String::from(MEMO_HEADER);
        memo.push('\n');
        for entry in entries.iter() {
            memo.push_str("\n- ");
            memo.push_str(entry);
        }
        memo
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
