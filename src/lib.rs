//! # allergen-extract
//!
//! Client for a food-label extraction service: pick a PDF, upload it, and
//! review the allergens and nutrition values the service found.
//!
//! ## Workflow Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Select    FileSelector validates the media type and stages the file
//!  ├─ 2. Submit    WorkflowController: Idle → Uploading, issues a request id
//!  ├─ 3. Extract   HttpExtractionClient POSTs multipart to {base}/extract (60 s budget)
//!  ├─ 4. Settle    Uploading → Success(result) | Failure(message); stale replies dropped
//!  └─ 5. Present   ResultView renders 10 allergen rows + 6 nutrition rows, exports JSON
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use allergen_extract::{render, ClientConfig, HttpExtractionClient, UploadSession};
//! use allergen_extract::selector::{FileSelector, Candidate, SelectionSource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Service URL from ALLERGEN_API_URL, else http://localhost:8000
//!     let client = HttpExtractionClient::new(ClientConfig::from_env()?)?;
//!     let mut session = UploadSession::new(Arc::new(client));
//!
//!     let mut selector = FileSelector::new();
//!     selector.select(SelectionSource::Picker, Candidate::from_path("label.pdf").await?)?;
//!
//!     if let Some(file) = selector.take() {
//!         if let Some(result) = session.upload(file).await.and_then(|s| s.result()) {
//!             println!("{}", render(result));
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `allergen-extract` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod selector;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{Extractor, HealthStatus, HttpExtractionClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use controller::{
    Command, ErrorMessage, RequestId, UploadSession, WorkflowController, WorkflowEvent,
    WorkflowState,
};
pub use error::{ExtractError, SelectionError};
pub use model::{Allergen, ExtractionResult, Nutrient, ProcessingMethod, StagedFile};
pub use selector::FileSelector;
pub use view::{export_json, render, write_export, DisplayModel};
