//! analysis.rs — deterministic financial model: sensitivity analysis,
//! bucketed risk score, loan recommendation, confidence score.
//!
//! All parameters live in an immutable `AnalyzerConfig` handed to the
//! analyzer at construction, so alternate parameter sets are testable
//! without touching global state. The scenario multipliers (x1.2 / x0.8)
//! and the tier thresholds (0.3 / 0.6) are fixed design constants of the
//! model, not configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyzeError, Result};
use crate::revenue::DEFAULT_RPM;

pub const ENV_CONFIG_PATH: &str = "ANALYZER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/analyzer.toml";

// ---- Data model ----

/// Immutable per-request snapshot of a channel's public counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub subscriber_count: u64,
    pub total_views: u64,
    /// Views summed over uploads published inside the trailing window.
    pub views_in_window: u64,
    pub window_days: u32,
    pub video_count: u64,
    pub estimated_revenue_usd: f64,
}

/// Revenue projections under the three RPM scenarios.
///
/// `revenue_volatility` and `growth_rate` are defined as 0.0 when
/// `base_revenue` is 0 (neutral/no-signal convention; see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityAnalysis {
    pub base_revenue: f64,
    pub optimistic_revenue: f64,
    pub pessimistic_revenue: f64,
    pub revenue_volatility: f64,
    /// Clamped to [-0.05, 0.15].
    pub growth_rate: f64,
    /// Sum of four bucketed factors, capped at 1.0. The uncapped sum can
    /// reach 1.5, so the worst bucket combinations are indistinguishable
    /// after the cap - a known modeling quirk, kept for output parity.
    pub risk_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier thresholds at exactly 0.3 and 0.6.
    pub fn from_score(risk_score: f64) -> Self {
        if risk_score < 0.3 {
            Self::Low
        } else if risk_score < 0.6 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn repayment_months(self) -> u32 {
        match self {
            Self::Low => 24,
            Self::Medium => 18,
            Self::High => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecommendation {
    pub recommended_advance: f64,
    pub max_loan_amount: f64,
    pub risk_adjusted_amount: f64,
    pub repayment_period_months: u32,
    /// Annual rate as a percentage (e.g. 18.0 for high risk).
    pub interest_rate_percent: f64,
    pub monthly_payment: f64,
    pub risk_level: RiskLevel,
    /// Clamped to [0.5, 1.0].
    pub confidence_score: f64,
}

// ---- Configuration ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpmScenarios {
    pub base: f64,
    pub optimistic: f64,
    pub pessimistic: f64,
}

impl Default for RpmScenarios {
    fn default() -> Self {
        Self {
            base: DEFAULT_RPM,
            optimistic: 7.5,
            pessimistic: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPremiums {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for RiskPremiums {
    fn default() -> Self {
        Self {
            low: 0.02,
            medium: 0.05,
            high: 0.10,
        }
    }
}

impl RiskPremiums {
    pub fn for_level(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanTerms {
    /// Months of revenue backing the base loan amount.
    pub advance_multiplier: f64,
    pub risk_adjustment_factor: f64,
    /// Annual base rate, fractional (0.08 = 8%).
    pub base_interest_rate: f64,
    pub risk_premium: RiskPremiums,
}

impl Default for LoanTerms {
    fn default() -> Self {
        Self {
            advance_multiplier: 12.0,
            risk_adjustment_factor: 0.7,
            base_interest_rate: 0.08,
            risk_premium: RiskPremiums::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub rpm: RpmScenarios,
    pub loan: LoanTerms,
}

impl AnalyzerConfig {
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("reading analyzer config from {}: {e}", path.display())
        })?;
        let cfg: Self = toml::from_str(&content)?;
        Ok(cfg)
    }

    /// Load using env var + fallback:
    /// 1) $ANALYZER_CONFIG_PATH (must exist and parse)
    /// 2) config/analyzer.toml (if present)
    /// 3) built-in defaults
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            return Self::load_from(Path::new(&p));
        }
        let default = Path::new(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(default);
        }
        Ok(Self::default())
    }
}

// ---- Analyzer ----

pub struct FinancialAnalyzer {
    config: AnalyzerConfig,
}

impl FinancialAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Revenue projection under the three RPM scenarios plus the composite
    /// risk score.
    pub fn sensitivity(&self, metrics: &ChannelMetrics) -> Result<SensitivityAnalysis> {
        validate_metrics(metrics)?;

        let base_revenue = metrics.estimated_revenue_usd;
        let rpm = &self.config.rpm;
        let optimistic_revenue = base_revenue * (rpm.optimistic / rpm.base) * 1.2;
        let pessimistic_revenue = base_revenue * (rpm.pessimistic / rpm.base) * 0.8;

        let (revenue_volatility, growth_rate) = if base_revenue == 0.0 {
            (0.0, 0.0)
        } else {
            (
                (optimistic_revenue - pessimistic_revenue) / base_revenue,
                ((optimistic_revenue - base_revenue) / base_revenue).clamp(-0.05, 0.15),
            )
        };

        Ok(SensitivityAnalysis {
            base_revenue,
            optimistic_revenue,
            pessimistic_revenue,
            revenue_volatility,
            growth_rate,
            risk_score: self.risk_score(metrics),
        })
    }

    /// Composite risk in [0,1]: four independent bucketed factors summed,
    /// capped at 1.0.
    fn risk_score(&self, metrics: &ChannelMetrics) -> f64 {
        let mut score: f64 = 0.0;

        // Audience size.
        score += if metrics.subscriber_count > 10_000_000 {
            0.1
        } else if metrics.subscriber_count > 1_000_000 {
            0.2
        } else {
            0.4
        };

        // View consistency (average views per upload).
        let avg_views = metrics.total_views as f64 / metrics.video_count.max(1) as f64;
        score += if avg_views > 1_000_000.0 {
            0.1
        } else if avg_views > 100_000.0 {
            0.2
        } else {
            0.4
        };

        // Content volume.
        score += if metrics.video_count > 100 {
            0.1
        } else if metrics.video_count > 50 {
            0.2
        } else {
            0.3
        };

        // Revenue stability.
        score += if metrics.estimated_revenue_usd > 100_000.0 {
            0.1
        } else if metrics.estimated_revenue_usd > 10_000.0 {
            0.2
        } else {
            0.4
        };

        score.min(1.0)
    }

    /// Size and price the advance from the risk score.
    pub fn recommend_loan(
        &self,
        metrics: &ChannelMetrics,
        sensitivity: &SensitivityAnalysis,
    ) -> LoanRecommendation {
        let terms = &self.config.loan;

        let base_loan = metrics.estimated_revenue_usd * terms.advance_multiplier;
        let risk_adjusted =
            base_loan * (1.0 - sensitivity.risk_score * terms.risk_adjustment_factor);

        let risk_level = RiskLevel::from_score(sensitivity.risk_score);
        let interest_rate = terms.base_interest_rate + terms.risk_premium.for_level(risk_level);
        let months = risk_level.repayment_months();

        LoanRecommendation {
            recommended_advance: risk_adjusted,
            max_loan_amount: base_loan,
            risk_adjusted_amount: risk_adjusted,
            repayment_period_months: months,
            interest_rate_percent: interest_rate * 100.0,
            monthly_payment: monthly_payment(risk_adjusted, interest_rate / 12.0, months),
            risk_level,
            confidence_score: self.confidence(metrics, sensitivity),
        }
    }

    /// Data-quality confidence in [0.5, 1.0].
    fn confidence(&self, metrics: &ChannelMetrics, sensitivity: &SensitivityAnalysis) -> f64 {
        let mut confidence: f64 = 0.8;

        if metrics.subscriber_count > 1_000_000 {
            confidence += 0.1;
        } else if metrics.subscriber_count < 100_000 {
            confidence -= 0.1;
        }

        if sensitivity.revenue_volatility < 0.3 {
            confidence += 0.05;
        } else if sensitivity.revenue_volatility > 0.7 {
            confidence -= 0.05;
        }

        if metrics.video_count > 50 {
            confidence += 0.05;
        }

        confidence.clamp(0.5, 1.0)
    }
}

/// Standard fixed-rate amortization. Requires `monthly_rate > 0`, which the
/// positive base rate guarantees.
pub fn monthly_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    let factor = (1.0 + monthly_rate).powi(months as i32);
    principal * monthly_rate * factor / (factor - 1.0)
}

fn validate_metrics(metrics: &ChannelMetrics) -> Result<()> {
    let revenue = metrics.estimated_revenue_usd;
    if !revenue.is_finite() || revenue < 0.0 {
        return Err(AnalyzeError::validation(format!(
            "estimated revenue must be a non-negative finite number, got {revenue}"
        )));
    }
    Ok(())
}
