//! Clone request, result and progress types

use serde::{Deserialize, Serialize};

/// How a clone treats what the target already holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Only add what is missing
    #[default]
    Merge,
    /// Delete every target category and product first
    Replace,
}

/// Input of a clone run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneRequest {
    pub source_tenant_id: String,
    pub target_tenant_id: String,
    #[serde(default = "default_true")]
    pub copy_categories: bool,
    #[serde(default = "default_true")]
    pub copy_products: bool,
    #[serde(default)]
    pub merge_strategy: MergeStrategy,
    #[serde(default = "default_true")]
    pub copy_images: bool,
    /// Copy image binaries instead of referencing the source URL
    #[serde(default)]
    pub physical_duplicate: bool,
    #[serde(default = "default_max_products")]
    pub max_products: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_products() -> usize {
    1000
}

impl CloneRequest {
    /// Copy everything, merge strategy, quick image fidelity
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_tenant_id: source.into(),
            target_tenant_id: target.into(),
            copy_categories: true,
            copy_products: true,
            merge_strategy: MergeStrategy::Merge,
            copy_images: true,
            physical_duplicate: false,
            max_products: default_max_products(),
        }
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn with_categories(mut self, copy: bool) -> Self {
        self.copy_categories = copy;
        self
    }

    pub fn with_products(mut self, copy: bool) -> Self {
        self.copy_products = copy;
        self
    }

    pub fn with_images(mut self, copy: bool) -> Self {
        self.copy_images = copy;
        self
    }

    pub fn with_physical_duplicate(mut self, physical: bool) -> Self {
        self.physical_duplicate = physical;
        self
    }

    pub fn with_max_products(mut self, cap: usize) -> Self {
        self.max_products = cap;
        self
    }
}

/// Outcome of a clone run
///
/// `success == false` means an abort-level error (missing tenant, quota,
/// identical tenants) or cancellation. Item-level failures only show up
/// in `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneResult {
    pub success: bool,
    pub cancelled: bool,
    pub categories_cloned: usize,
    pub products_cloned: usize,
    pub images_cloned: usize,
    pub errors: Vec<String>,
}

impl CloneResult {
    pub(crate) fn aborted(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Default::default()
        }
    }
}

/// One progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneProgress {
    pub step_index: usize,
    pub total_steps: usize,
    pub message: String,
    pub percentage: u8,
}

impl CloneProgress {
    pub fn new(step_index: usize, total_steps: usize, message: impl Into<String>) -> Self {
        let percentage = if total_steps == 0 {
            100
        } else {
            (step_index.min(total_steps) * 100 / total_steps) as u8
        };
        Self {
            step_index,
            total_steps,
            message: message.into(),
            percentage,
        }
    }
}

/// Receives progress updates synchronously between pipeline steps
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: CloneProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(CloneProgress) + Send + Sync,
{
    fn report(&self, progress: CloneProgress) {
        self(progress)
    }
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, progress: CloneProgress) {
        tracing::info!(
            step = progress.step_index,
            total = progress.total_steps,
            percentage = progress.percentage,
            "{}",
            progress.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_json() {
        let req: CloneRequest =
            serde_json::from_str(r#"{"sourceTenantId":"a","targetTenantId":"b"}"#).unwrap();
        assert_eq!(req, CloneRequest::new("a", "b"));
        assert!(!req.physical_duplicate);
        assert_eq!(req.max_products, 1000);
    }

    #[test]
    fn test_strategy_serializes_lowercase() {
        let req = CloneRequest::new("a", "b").with_strategy(MergeStrategy::Replace);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["mergeStrategy"], "replace");
    }

    #[test]
    fn test_result_is_camel_case() {
        let result = CloneResult {
            success: true,
            products_cloned: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["productsCloned"], 2);
        assert_eq!(json["cancelled"], false);
    }

    #[test]
    fn test_progress_percentage() {
        assert_eq!(CloneProgress::new(0, 6, "start").percentage, 0);
        assert_eq!(CloneProgress::new(3, 6, "half").percentage, 50);
        assert_eq!(CloneProgress::new(6, 6, "done").percentage, 100);
        assert_eq!(CloneProgress::new(1, 0, "empty").percentage, 100);
    }
}
