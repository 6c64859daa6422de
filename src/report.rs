//! report.rs — assembles the final `FinancialReport` and drives the whole
//! pipeline: resolve → aggregate → estimate → analyze → assemble.

use serde::{Deserialize, Serialize};

use crate::aggregate;
use crate::analysis::{
    AnalyzerConfig, ChannelMetrics, FinancialAnalyzer, LoanRecommendation, SensitivityAnalysis,
};
use crate::error::Result;
use crate::narrative::NarrativeClient;
use crate::provider::MetricsProvider;
use crate::resolve;
use crate::revenue;

/// Scenario loan sizing factors. Distinct from the risk-adjustment factor
/// used for the base case; the base scenario carries the computed advance.
const OPTIMISTIC_LOAN_FACTOR: f64 = 0.8;
const PESSIMISTIC_LOAN_FACTOR: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProjection {
    pub revenue: f64,
    pub loan_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenarios {
    pub optimistic: ScenarioProjection,
    pub base: ScenarioProjection,
    pub pessimistic: ScenarioProjection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub channel_id: String,
    pub metrics: ChannelMetrics,
    pub sensitivity: SensitivityAnalysis,
    pub loan: LoanRecommendation,
    pub scenarios: Scenarios,
    pub narrative: String,
}

/// The single public pipeline entry: free-form reference in, full report
/// out. Every internal fault surfaces as a structured `AnalyzeError`.
pub async fn get_channel_report(
    provider: &dyn MetricsProvider,
    narrative: &dyn NarrativeClient,
    config: &AnalyzerConfig,
    reference: &str,
    window_days: u32,
) -> Result<FinancialReport> {
    // Validation precedes any network call, including the resolver's search.
    if window_days == 0 {
        return Err(crate::error::AnalyzeError::validation(
            "window must be at least one day",
        ));
    }

    let id = resolve::resolve(provider, reference).await?;
    let mut metrics = aggregate::fetch_metrics(provider, &id, window_days).await?;
    metrics.estimated_revenue_usd =
        revenue::estimate_revenue(metrics.views_in_window, config.rpm.base)?;

    let analyzer = FinancialAnalyzer::new(config.clone());
    let sensitivity = analyzer.sensitivity(&metrics)?;
    let loan = analyzer.recommend_loan(&metrics, &sensitivity);
    let scenarios = build_scenarios(config, &sensitivity, &loan);

    let prompt = build_prompt(&metrics, &sensitivity, &loan);
    let text = match narrative.generate(&prompt).await {
        Some(text) => text,
        None => fallback_narrative(&metrics, &sensitivity, &loan),
    };

    tracing::info!(
        channel = id.as_str(),
        risk_score = sensitivity.risk_score,
        advance = loan.recommended_advance,
        narrative_provider = narrative.provider_name(),
        "assembled channel report"
    );

    Ok(FinancialReport {
        channel_id: id.0,
        metrics,
        sensitivity,
        loan,
        scenarios,
        narrative: text,
    })
}

fn build_scenarios(
    config: &AnalyzerConfig,
    sensitivity: &SensitivityAnalysis,
    loan: &LoanRecommendation,
) -> Scenarios {
    let multiplier = config.loan.advance_multiplier;
    Scenarios {
        optimistic: ScenarioProjection {
            revenue: sensitivity.optimistic_revenue,
            loan_amount: sensitivity.optimistic_revenue * multiplier * OPTIMISTIC_LOAN_FACTOR,
        },
        base: ScenarioProjection {
            revenue: sensitivity.base_revenue,
            loan_amount: loan.recommended_advance,
        },
        pessimistic: ScenarioProjection {
            revenue: sensitivity.pessimistic_revenue,
            loan_amount: sensitivity.pessimistic_revenue * multiplier * PESSIMISTIC_LOAN_FACTOR,
        },
    }
}

/// Structured prompt for the narrative collaborator, built purely from
/// already-computed fields.
fn build_prompt(
    metrics: &ChannelMetrics,
    sensitivity: &SensitivityAnalysis,
    loan: &LoanRecommendation,
) -> String {
    format!(
        "You are a senior creator-economy analyst and financial advisor.\n\
         \n\
         Channel metrics:\n\
         - Subscribers: {subs}\n\
         - Total views: {views}\n\
         - Views in the last {days} days: {recent}\n\
         - Videos: {videos}\n\
         \n\
         Financial analysis:\n\
         - Base revenue: ${base:.0}\n\
         - Optimistic revenue: ${opt:.0}\n\
         - Pessimistic revenue: ${pess:.0}\n\
         - Risk score: {risk:.2}\n\
         - Revenue volatility: {vol:.2}\n\
         \n\
         Loan recommendation:\n\
         - Recommended advance: ${advance:.0}\n\
         - Risk level: {level:?}\n\
         - Interest rate: {rate:.1}%\n\
         - Repayment period: {months} months\n\
         - Monthly payment: ${payment:.0}\n\
         \n\
         Write a summary of at most 150 words, three opportunity bullets,\n\
         two or three risk factors, and two or three concrete financial\n\
         recommendations.",
        subs = metrics.subscriber_count,
        views = metrics.total_views,
        days = metrics.window_days,
        recent = metrics.views_in_window,
        videos = metrics.video_count,
        base = sensitivity.base_revenue,
        opt = sensitivity.optimistic_revenue,
        pess = sensitivity.pessimistic_revenue,
        risk = sensitivity.risk_score,
        vol = sensitivity.revenue_volatility,
        advance = loan.recommended_advance,
        level = loan.risk_level,
        rate = loan.interest_rate_percent,
        months = loan.repayment_period_months,
        payment = loan.monthly_payment,
    )
}

/// Deterministic templated narrative used when no generator is available.
/// References the same computed fields the live prompt carries.
fn fallback_narrative(
    metrics: &ChannelMetrics,
    sensitivity: &SensitivityAnalysis,
    loan: &LoanRecommendation,
) -> String {
    format!(
        "Channel analysis completed. The channel has {subs} subscribers and \
         {views} total views, with an estimated revenue of ${rev:.0} over the \
         last {days} days. The risk score is {risk:.2} ({level:?} risk), \
         supporting a recommended advance of ${advance:.0} at \
         {rate:.1}% over {months} months (monthly payment ${payment:.0}, \
         confidence {conf:.2}).",
        subs = metrics.subscriber_count,
        views = metrics.total_views,
        rev = metrics.estimated_revenue_usd,
        days = metrics.window_days,
        risk = sensitivity.risk_score,
        level = loan.risk_level,
        advance = loan.recommended_advance,
        rate = loan.interest_rate_percent,
        months = loan.repayment_period_months,
        payment = loan.monthly_payment,
        conf = loan.confidence_score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalyzerConfig, FinancialAnalyzer};

    fn worked_example() -> (ChannelMetrics, SensitivityAnalysis, LoanRecommendation) {
        let metrics = ChannelMetrics {
            subscriber_count: 2_000_000,
            total_views: 50_000_000,
            views_in_window: 1_000_000,
            window_days: 30,
            video_count: 80,
            estimated_revenue_usd: 5000.0,
        };
        let analyzer = FinancialAnalyzer::new(AnalyzerConfig::default());
        let sensitivity = analyzer.sensitivity(&metrics).unwrap();
        let loan = analyzer.recommend_loan(&metrics, &sensitivity);
        (metrics, sensitivity, loan)
    }

    #[test]
    fn scenario_loans_use_their_own_factors() {
        let (_, sensitivity, loan) = worked_example();
        let s = build_scenarios(&AnalyzerConfig::default(), &sensitivity, &loan);

        // optimistic: 9000 * 12 * 0.8 = 86_400
        assert!((s.optimistic.loan_amount - 86_400.0).abs() < 1e-9);
        // pessimistic: 2000 * 12 * 0.6 = 14_400
        assert!((s.pessimistic.loan_amount - 14_400.0).abs() < 1e-9);
        // base carries the computed advance, not a derived figure.
        assert_eq!(s.base.loan_amount, loan.recommended_advance);
        assert_eq!(s.base.revenue, 5000.0);
    }

    #[test]
    fn prompt_carries_the_computed_fields() {
        let (metrics, sensitivity, loan) = worked_example();
        let p = build_prompt(&metrics, &sensitivity, &loan);
        assert!(p.contains("Subscribers: 2000000"));
        assert!(p.contains("Views in the last 30 days: 1000000"));
        assert!(p.contains("Risk score: 1.00"));
        assert!(p.contains("Interest rate: 18.0%"));
        assert!(p.contains("Repayment period: 12 months"));
    }

    #[test]
    fn fallback_narrative_is_deterministic_and_complete() {
        let (metrics, sensitivity, loan) = worked_example();
        let a = fallback_narrative(&metrics, &sensitivity, &loan);
        let b = fallback_narrative(&metrics, &sensitivity, &loan);
        assert_eq!(a, b);
        assert!(a.contains("2000000 subscribers"));
        assert!(a.contains("$18000"));
        assert!(a.contains("18.0%"));
        assert!(a.contains("12 months"));
    }

    #[test]
    fn report_serializes_with_stable_field_names() {
        let (metrics, sensitivity, loan) = worked_example();
        let scenarios = build_scenarios(&AnalyzerConfig::default(), &sensitivity, &loan);
        let report = FinancialReport {
            channel_id: "UCabcdefghij1234567890_-".into(),
            metrics,
            sensitivity,
            loan,
            scenarios,
            narrative: "n/a".into(),
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["metrics"]["subscriber_count"], 2_000_000);
        assert_eq!(v["sensitivity"]["risk_score"], 1.0);
        assert_eq!(v["loan"]["risk_level"], "high");
        assert_eq!(v["loan"]["repayment_period_months"], 12);
        assert!(v["scenarios"]["optimistic"]["loan_amount"].is_f64());
    }
}
