use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::client::AnalysisError;
use super::upload::{ImageUpload, Preview};

pub const NO_IMAGE_ADVISORY: &str = "Please upload an image first!";
pub const ANALYSIS_FAILED: &str = "Failed to analyze image. Try again.";

/// State of the food-analysis page while it is displayed.
#[derive(Debug)]
pub struct AnalysisScreen {
    generation: u64,
    image: Option<ImageUpload>,
    result: Option<Value>,
    advisory: Option<&'static str>,
    loading: bool,
    cancel: CancellationToken,
}

/// Everything needed to run one analysis without holding the screen.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub generation: u64,
    pub image: String,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeRejection {
    NoImage,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisView {
    pub preview_url: Option<String>,
    pub loading: bool,
    pub advisory: Option<&'static str>,
    /// Pretty-printed JSON of the last result.
    pub result: Option<String>,
}

impl Default for AnalysisScreen {
    fn default() -> Self {
        Self {
            generation: 0,
            image: None,
            result: None,
            advisory: None,
            loading: false,
            cancel: CancellationToken::new(),
        }
    }
}

impl AnalysisScreen {
    /// Replaces the image. A request still running for the old image is
    /// cancelled and its outcome will be dropped by `finish`.
    pub fn select_image(&mut self, upload: ImageUpload) {
        if self.loading {
            self.cancel.cancel();
            self.cancel = CancellationToken::new();
            self.generation += 1;
            self.loading = false;
            info!("in-flight analysis superseded by new image");
        }
        if let Some(old) = self.image.replace(upload) {
            info!(preview_id = %old.preview.id, "preview released");
        }
        self.advisory = None;
        self.result = None;
    }

    pub fn preview(&self, id: Uuid) -> Option<&Preview> {
        self.image
            .as_ref()
            .map(|img| &img.preview)
            .filter(|p| p.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Marks the screen as loading and hands out the request inputs.
    /// Without an image the advisory is shown and nothing is sent.
    pub fn begin(&mut self) -> Result<AnalysisTicket, AnalyzeRejection> {
        if self.loading {
            return Err(AnalyzeRejection::Busy);
        }
        let Some(image) = self.image.as_ref() else {
            self.advisory = Some(NO_IMAGE_ADVISORY);
            return Err(AnalyzeRejection::NoImage);
        };
        let ticket = AnalysisTicket {
            generation: self.generation,
            image: image.data_uri.clone(),
            cancel: self.cancel.clone(),
        };
        self.advisory = None;
        self.result = None;
        self.loading = true;
        Ok(ticket)
    }

    /// Publishes the outcome of `begin`. Returns `false` when the screen was
    /// reset in the meantime and the outcome is dropped.
    pub fn finish(&mut self, generation: u64, outcome: Result<Value, AnalysisError>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        self.result = Some(match outcome {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "food analysis failed");
                serde_json::json!({ "error": ANALYSIS_FAILED })
            }
        });
        true
    }

    /// Tears the screen down: cancels any in-flight request and releases the
    /// preview.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        if let Some(img) = self.image.take() {
            info!(preview_id = %img.preview.id, "preview released");
        }
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    pub fn view(&self) -> AnalysisView {
        AnalysisView {
            preview_url: self.image.as_ref().map(|img| img.preview.url()),
            loading: self.is_loading(),
            advisory: self.advisory,
            result: self
                .result()
                .and_then(|v| serde_json::to_string_pretty(v).ok()),
        }
    }
}
