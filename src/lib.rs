// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod analysis;
pub mod api;
pub mod error;
pub mod narrative;
pub mod provider;
pub mod report;
pub mod resolve;
pub mod revenue;

// ---- Re-exports for stable public API ----
pub use crate::analysis::{
    AnalyzerConfig, ChannelMetrics, FinancialAnalyzer, LoanRecommendation, RiskLevel,
    SensitivityAnalysis,
};
pub use crate::api::{router, AppState};
pub use crate::error::{AnalyzeError, Result};
pub use crate::provider::{ChannelId, MetricsProvider};
pub use crate::report::{get_channel_report, FinancialReport};
