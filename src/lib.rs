//! # Card Portfolio Analytics
//!
//! A library for turning a loose collection of credit card records (typically extracted
//! from credit report PDFs via LLM) into 5/24 eligibility and portfolio statistics.
//!
//! ## Core Concepts
//!
//! - **Account Records**: Partially filled card records. Any field may be missing, and open
//!   dates arrive in several formats.
//! - **5/24 Status**: Active accounts opened within the trailing 720 days. Five or more
//!   means new applications with the tracked issuer family are refused.
//! - **Portfolio Report**: Issuer concentration, per-issuer limits, annual fees, per-card
//!   utilization and account age.
//! - **Dashboard**: Both reports merged with portfolio-wide totals, including the fixed
//!   payload for an owner with no accounts.
//!
//! All computations are pure. The current time is always passed in explicitly.
//!
//! ## Example
//!
//! ```rust,ignore
//! use card_portfolio_analytics::*;
//! use chrono::NaiveDate;
//!
//! let records = vec![AccountRecord {
//!     card_name: Some("Chase Freedom".to_string()),
//!     issuer: Some("Chase".to_string()),
//!     status: Some("Active".to_string()),
//!     open_date: Some("2024-01-01".to_string()),
//!     credit_limit: Some(1000.0),
//!     current_balance: Some(500.0),
//!     ..Default::default()
//! }];
//!
//! let now = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let dashboard = build_dashboard(&records, now).unwrap();
//! assert_eq!(dashboard.five_24_status.remaining_slots, 4);
//! ```

pub mod dashboard;
pub mod eligibility;
pub mod error;
pub mod ingestion;
pub mod portfolio;
pub mod schema;
pub mod utils;

pub use dashboard::{AverageAgeDisplay, DashboardBuilder, DashboardStats};
pub use eligibility::{EligibilityCalculator, EligibilityReport, EligibilityStatus, RecentAccount};
pub use error::{AnalyticsError, Result};
pub use ingestion::{parse_extracted_record, parse_extraction_response};
pub use portfolio::{
    AgeAnalysis, AnnualFeeSummary, CardUtilization, FeeCard, PortfolioAggregator,
    PortfolioReport, PortfolioStats,
};
pub use schema::*;
pub use utils::{parse_open_date, OpenDateFormat, OPEN_DATE_FORMATS};

use chrono::NaiveDateTime;
use log::debug;

#[derive(Debug, Clone, Default)]
pub struct CreditPortfolioAnalyzer {
    config: AnalyticsConfig,
}

impl CreditPortfolioAnalyzer {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "Analyzer configured with a {}-day window and {} account limit",
            config.eligibility.window_days, config.eligibility.max_recent_accounts
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn eligibility(&self, records: &[AccountRecord], now: NaiveDateTime) -> EligibilityReport {
        EligibilityCalculator::new(&self.config.eligibility).compute(records, now)
    }

    pub fn portfolio(
        &self,
        records: &[AccountRecord],
        now: NaiveDateTime,
    ) -> Result<Option<PortfolioReport>> {
        PortfolioAggregator::new(&self.config.portfolio).aggregate(records, now)
    }

    pub fn dashboard(&self, records: &[AccountRecord], now: NaiveDateTime) -> Result<DashboardStats> {
        DashboardBuilder::new(&self.config).build(records, now)
    }
}

pub fn compute_eligibility(records: &[AccountRecord], now: NaiveDateTime) -> EligibilityReport {
    CreditPortfolioAnalyzer::default().eligibility(records, now)
}

pub fn compute_portfolio(
    records: &[AccountRecord],
    now: NaiveDateTime,
) -> Result<Option<PortfolioReport>> {
    CreditPortfolioAnalyzer::default().portfolio(records, now)
}

pub fn build_dashboard(records: &[AccountRecord], now: NaiveDateTime) -> Result<DashboardStats> {
    CreditPortfolioAnalyzer::default().dashboard(records, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn two_card_portfolio() -> Vec<AccountRecord> {
        vec![
            AccountRecord {
                card_name: Some("Recent".to_string()),
                issuer: Some("Chase".to_string()),
                status: Some("Active".to_string()),
                open_date: Some("2024-01-01".to_string()),
                credit_limit: Some(1000.0),
                current_balance: Some(500.0),
                annual_fee: Some(0.0),
                ..Default::default()
            },
            AccountRecord {
                card_name: Some("Veteran".to_string()),
                issuer: Some("Citi".to_string()),
                status: Some("Active".to_string()),
                open_date: Some("2010-01-01".to_string()),
                credit_limit: Some(2000.0),
                current_balance: Some(0.0),
                annual_fee: Some(95.0),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_end_to_end_two_cards() {
        let records = two_card_portfolio();

        let eligibility = compute_eligibility(&records, now());
        assert_eq!(eligibility.cards_in_24_months, 1);
        assert!(eligibility.is_eligible);
        assert_eq!(eligibility.remaining_slots, 4);
        assert_eq!(eligibility.recent_cards[0].card_name, "Recent");

        let portfolio = compute_portfolio(&records, now()).unwrap().unwrap();
        assert_eq!(portfolio.annual_fees.total, 95.0);
        assert_eq!(portfolio.annual_fees.fee_cards_count, 1);
        assert_eq!(portfolio.annual_fees.no_fee_cards_count, 1);
        assert_eq!(portfolio.utilization_breakdown.len(), 2);
        assert_eq!(portfolio.utilization_breakdown[0].utilization, 50.0);
        assert_eq!(portfolio.utilization_breakdown[1].card_name, "Veteran");
        assert_eq!(portfolio.utilization_breakdown[1].utilization, 0.0);

        let dashboard = build_dashboard(&records, now()).unwrap();
        assert_eq!(dashboard.total_credit_limit, 3000.0);
        assert_eq!(dashboard.total_balance, 500.0);
        assert_eq!(dashboard.credit_utilization, 16.7);
        assert_eq!(dashboard.total_annual_fees, 95.0);
        assert_eq!(dashboard.average_age_years, AverageAgeDisplay::Years(14.4));
        assert_eq!(dashboard.top_utilization_cards.len(), 1);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let records = two_card_portfolio();
        let first = build_dashboard(&records, now()).unwrap();
        let second = build_dashboard(&records, now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_analyzer_rejects_invalid_config() {
        let mut config = AnalyticsConfig::default();
        config.eligibility.max_recent_accounts = 0;
        assert!(matches!(
            CreditPortfolioAnalyzer::new(config),
            Err(AnalyticsError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_custom_window_and_limit() {
        let mut config = AnalyticsConfig::default();
        config.eligibility.max_recent_accounts = 1;
        config.eligibility.issuer_family = "Amex".to_string();
        let analyzer = CreditPortfolioAnalyzer::new(config).unwrap();

        let records = two_card_portfolio();
        let report = analyzer.eligibility(&records, now());
        assert!(!report.is_eligible);
        assert_eq!(report.remaining_slots, 0);

        let report = analyzer.eligibility(&records[1..], now());
        assert_eq!(report.recommendation, "You can apply for 1 more Amex cards");
    }
}
