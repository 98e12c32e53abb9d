//! Destination and naming policies for classified files.

use crate::models::{Category, FileDescriptor};

/// Confidence gate deciding the destination bucket.
#[derive(Debug, Clone, Copy)]
pub struct RoutingPolicy {
    threshold: f32,
}

impl RoutingPolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Below the threshold everything converges into the review bucket,
    /// whatever the assigned category; at or above it the bucket is the
    /// category itself. Hard classifier failures carry confidence 0.0 and
    /// land here by the same rule.
    pub fn bucket(&self, descriptor: &FileDescriptor) -> Category {
        if descriptor.confidence < self.threshold {
            return Category::ToVerify;
        }
        descriptor.category.unwrap_or(Category::ToVerify)
    }
}

/// Derives the canonical final name. The run date is fixed at construction
/// so every file in one run shares the same stamp.
#[derive(Debug, Clone)]
pub struct RenamePolicy {
    run_date: String,
}

impl RenamePolicy {
    pub fn new(run_date: impl Into<String>) -> Self {
        Self {
            run_date: run_date.into(),
        }
    }

    pub fn for_today() -> Self {
        Self::new(chrono::Local::now().format("%Y-%m-%d").to_string())
    }

    /// `{date}_{category}_{cleaned-stem}{extension}`. Pure: the same
    /// descriptor, date and category always derive the same name. The
    /// ASSIGNED category is embedded even when routing diverts the file to
    /// review, so a human re-classifying it still sees the guess.
    pub fn derive(&self, descriptor: &FileDescriptor) -> String {
        let stem = descriptor
            .name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&descriptor.name);
        let cleaned = stem.to_lowercase().replace([' ', '_'], "-");
        let category = descriptor.category.unwrap_or(Category::ToVerify);
        format!(
            "{}_{}_{}{}",
            self.run_date,
            category.label(),
            cleaned,
            descriptor.extension
        )
    }
}
