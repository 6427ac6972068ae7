//! Placeholder scoring for the demo
//!
//! No real scoring algorithm exists. The credibility score and the pending
//! verification count are random numbers kept for demo parity; the risk
//! level and recommendations are constants.

use rand::Rng;
use std::ops::Range;

/// Range the placeholder credibility score is drawn from (70 inclusive, 100 exclusive)
pub const CREDIBILITY_RANGE: Range<u32> = 70..100;

/// Risk level reported for every verification
pub const RISK_LEVEL: &str = "Medium";

/// Justification used when the model returns no text
pub const FALLBACK_JUSTIFICATION: &str = "Claim analyzed with moderate confidence.";

/// Recommendations attached to every verification
pub const RECOMMENDATIONS: [&str; 3] = [
    "Include specific metrics and timeframes",
    "Provide third-party verification if available",
    "Document methodology and data sources",
];

/// Draw a placeholder credibility score in `[70, 100)`
pub fn placeholder_credibility<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(CREDIBILITY_RANGE)
}

/// Draw a simulated pending-verification count in `[1, 3]`
pub fn simulated_pending_verifications<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(1..=3)
}

/// Pick the justification text, falling back when the model said nothing
pub fn justification_or_fallback(text: &str) -> String {
    if text.is_empty() {
        FALLBACK_JUSTIFICATION.to_string()
    } else {
        text.to_string()
    }
}
