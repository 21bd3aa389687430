use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ATTACHMENTS: usize = 5;
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// A photo or document staged on the wizard. Only its metadata ever leaves the
/// wizard; the file itself is collected later by staff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self { name: name.into(), size_bytes, content_type: None }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentLimits {
    pub max_count: usize,
    pub max_bytes: u64,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self { max_count: DEFAULT_MAX_ATTACHMENTS, max_bytes: DEFAULT_MAX_ATTACHMENT_BYTES }
    }
}

/// What happened to an incoming batch. Nothing here is an error: the batch is
/// truncated to fit and the counts are only a warning surface for the host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentOutcome {
    pub accepted: usize,
    pub dropped_over_cap: Vec<String>,
    pub rejected_oversize: Vec<String>,
}

impl AttachmentOutcome {
    pub fn is_truncated(&self) -> bool {
        !self.dropped_over_cap.is_empty() || !self.rejected_oversize.is_empty()
    }
}

/// Appends `batch` to `staged` in order, skipping oversize files and dropping
/// whatever no longer fits under the cap.
pub fn stage_batch(
    staged: &mut Vec<Attachment>,
    batch: Vec<Attachment>,
    limits: &AttachmentLimits,
) -> AttachmentOutcome {
    let mut outcome = AttachmentOutcome::default();

    for attachment in batch {
        if attachment.size_bytes > limits.max_bytes {
            outcome.rejected_oversize.push(attachment.name);
            continue;
        }
        if staged.len() >= limits.max_count {
            outcome.dropped_over_cap.push(attachment.name);
            continue;
        }
        staged.push(attachment);
        outcome.accepted += 1;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::{stage_batch, Attachment, AttachmentLimits};

    fn photos(prefix: &str, count: usize) -> Vec<Attachment> {
        (0..count).map(|index| Attachment::new(format!("{prefix}-{index}.jpg"), 2_048)).collect()
    }

    #[test]
    fn batch_is_truncated_at_cap_preserving_existing_order() {
        let limits = AttachmentLimits::default();
        let mut staged = photos("first", 3);

        let outcome = stage_batch(&mut staged, photos("second", 4), &limits);

        assert_eq!(staged.len(), 5);
        assert_eq!(outcome.accepted, 2);
        assert_eq!(outcome.dropped_over_cap, vec!["second-2.jpg", "second-3.jpg"]);
        let names: Vec<&str> = staged.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["first-0.jpg", "first-1.jpg", "first-2.jpg", "second-0.jpg", "second-1.jpg"]
        );
    }

    #[test]
    fn oversize_files_are_skipped_without_consuming_slots() {
        let limits = AttachmentLimits { max_count: 2, max_bytes: 1_000 };
        let mut staged = Vec::new();
        let batch = vec![
            Attachment::new("huge.mov", 50_000),
            Attachment::new("a.jpg", 900),
            Attachment::new("b.jpg", 10).with_content_type("image/jpeg"),
        ];

        let outcome = stage_batch(&mut staged, batch, &limits);

        assert_eq!(outcome.accepted, 2);
        assert_eq!(outcome.rejected_oversize, vec!["huge.mov"]);
        assert!(outcome.dropped_over_cap.is_empty());
        assert!(outcome.is_truncated());
        assert_eq!(staged[1].content_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn full_list_accepts_nothing() {
        let limits = AttachmentLimits::default();
        let mut staged = photos("full", 5);
        let outcome = stage_batch(&mut staged, photos("late", 1), &limits);
        assert_eq!(outcome.accepted, 0);
        assert_eq!(staged.len(), 5);
    }
}
