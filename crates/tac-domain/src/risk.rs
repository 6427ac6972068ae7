//! Risk profile and the TaC risk-offset formula
//!
//! `discount = sustainability_score * verification_confidence * weight`
//! `adjusted_rate = max(0, base_rate - discount)`

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Default weight factor (alpha) used by the dashboard
pub const DEFAULT_WEIGHT: f64 = 0.05;

/// Simulator range for the base interest rate (percent)
pub const BASE_RATE_RANGE: RangeInclusive<f64> = 5.0..=25.0;

/// Simulator range for the sustainability score
pub const SCORE_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Simulator range for the verification confidence
pub const CONFIDENCE_RANGE: RangeInclusive<f64> = 0.1..=1.0;

/// Simulator range for the weight factor
pub const WEIGHT_RANGE: RangeInclusive<f64> = 0.01..=0.15;

/// Score added by a successful verification
const SCORE_BOOST: f64 = 5.0;
/// Confidence added by a successful verification
const CONFIDENCE_BOOST: f64 = 0.05;
/// Collateral added by a successful verification
const COLLATERAL_BOOST: f64 = 5000.0;
/// Confidence never boosts past this value
const CONFIDENCE_CAP: f64 = 0.99;

/// Mock financial state of a borrower
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    /// Base interest rate in percent
    pub base_interest_rate: f64,
    /// Sustainability score [0, 100]
    pub sustainability_score: f64,
    /// Verification confidence [0.0, 1.0]
    pub verification_confidence: f64,
    /// Collateral value
    pub collateral_value: f64,
}

impl Default for RiskMetrics {
    fn default() -> Self {
        Self {
            base_interest_rate: 12.0,
            sustainability_score: 65.0,
            verification_confidence: 0.70,
            collateral_value: 120_000.0,
        }
    }
}

impl RiskMetrics {
    /// Apply the demo boost for a successful verification
    ///
    /// This is a cosmetic heuristic, not a computed metric.
    pub fn boosted(&self) -> Self {
        Self {
            base_interest_rate: self.base_interest_rate,
            sustainability_score: (self.sustainability_score + SCORE_BOOST).min(100.0),
            verification_confidence: (self.verification_confidence + CONFIDENCE_BOOST)
                .min(CONFIDENCE_CAP),
            collateral_value: self.collateral_value + COLLATERAL_BOOST,
        }
    }

    /// Merge a partial update into these metrics
    pub fn merged(&self, update: &RiskMetricsUpdate) -> Self {
        Self {
            base_interest_rate: update.base_interest_rate.unwrap_or(self.base_interest_rate),
            sustainability_score: update
                .sustainability_score
                .unwrap_or(self.sustainability_score),
            verification_confidence: update
                .verification_confidence
                .unwrap_or(self.verification_confidence),
            collateral_value: update.collateral_value.unwrap_or(self.collateral_value),
        }
    }

    /// Validate that every field is finite and within its domain
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("baseInterestRate", self.base_interest_rate),
            ("sustainabilityScore", self.sustainability_score),
            ("verificationConfidence", self.verification_confidence),
            ("collateralValue", self.collateral_value),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} must be a finite number", name));
        }
        if self.base_interest_rate < 0.0 {
            return Err("baseInterestRate must not be negative".to_string());
        }
        if !SCORE_RANGE.contains(&self.sustainability_score) {
            return Err("sustainabilityScore must be in [0, 100]".to_string());
        }
        if !(0.0..=1.0).contains(&self.verification_confidence) {
            return Err("verificationConfidence must be in [0, 1]".to_string());
        }
        if self.collateral_value < 0.0 {
            return Err("collateralValue must not be negative".to_string());
        }
        Ok(())
    }
}

/// Partial update of a risk profile; absent fields are left unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetricsUpdate {
    /// New base interest rate
    #[serde(default)]
    pub base_interest_rate: Option<f64>,
    /// New sustainability score
    #[serde(default)]
    pub sustainability_score: Option<f64>,
    /// New verification confidence
    #[serde(default)]
    pub verification_confidence: Option<f64>,
    /// New collateral value
    #[serde(default)]
    pub collateral_value: Option<f64>,
}

/// Outcome of the risk-offset formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateAdjustment {
    /// Discount in percentage points
    pub discount: f64,
    /// Base rate minus discount, floored at zero
    pub adjusted_rate: f64,
    /// Weight factor used
    pub weight: f64,
}

/// Pure calculator for the TaC risk-offset formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskCalculator {
    weight: f64,
}

impl Default for RiskCalculator {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
        }
    }
}

impl RiskCalculator {
    /// Create a calculator with the given weight factor
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }

    /// The weight factor
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Interest discount for a score and confidence
    pub fn discount(&self, sustainability_score: f64, verification_confidence: f64) -> f64 {
        sustainability_score * verification_confidence * self.weight
    }

    /// Apply the formula to explicit inputs
    ///
    /// # Examples
    ///
    /// ```
    /// use tac_domain::risk::RiskCalculator;
    ///
    /// let adj = RiskCalculator::new(0.05).adjust(12.0, 80.0, 0.5);
    /// assert!((adj.discount - 2.0).abs() < 1e-9);
    /// assert!((adj.adjusted_rate - 10.0).abs() < 1e-9);
    /// ```
    pub fn adjust(
        &self,
        base_rate: f64,
        sustainability_score: f64,
        verification_confidence: f64,
    ) -> RateAdjustment {
        let discount = self.discount(sustainability_score, verification_confidence);
        RateAdjustment {
            discount,
            adjusted_rate: (base_rate - discount).max(0.0),
            weight: self.weight,
        }
    }

    /// Apply the formula to a risk profile
    pub fn adjust_metrics(&self, metrics: &RiskMetrics) -> RateAdjustment {
        self.adjust(
            metrics.base_interest_rate,
            metrics.sustainability_score,
            metrics.verification_confidence,
        )
    }
}

/// Inputs of the collateral simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInput {
    /// Base interest rate (percent)
    pub base_rate: f64,
    /// Sustainability score
    pub sustainability_score: f64,
    /// Verification confidence
    pub verification_confidence: f64,
    /// Weight factor; defaults to [`DEFAULT_WEIGHT`]
    #[serde(default)]
    pub weight: Option<f64>,
}

impl SimulationInput {
    /// Check every input against the simulator's slider ranges
    pub fn validate(&self) -> Result<(), String> {
        check_range("baseRate", self.base_rate, &BASE_RATE_RANGE)?;
        check_range("sustainabilityScore", self.sustainability_score, &SCORE_RANGE)?;
        check_range(
            "verificationConfidence",
            self.verification_confidence,
            &CONFIDENCE_RANGE,
        )?;
        if let Some(weight) = self.weight {
            check_range("weight", weight, &WEIGHT_RANGE)?;
        }
        Ok(())
    }

    /// Run the simulation
    pub fn simulate(&self) -> Result<RateAdjustment, String> {
        self.validate()?;
        let calculator = RiskCalculator::new(self.weight.unwrap_or(DEFAULT_WEIGHT));
        Ok(calculator.adjust(
            self.base_rate,
            self.sustainability_score,
            self.verification_confidence,
        ))
    }
}

fn check_range(name: &str, value: f64, range: &RangeInclusive<f64>) -> Result<(), String> {
    if value.is_finite() && range.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "{} must be in [{}, {}], got {}",
            name,
            range.start(),
            range.end(),
            value
        ))
    }
}
