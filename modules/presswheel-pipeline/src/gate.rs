//! Admission gate: turns a generation attempt's quality signals and
//! confidence into accept / hold-for-review / reject.
//!
//! Rules are evaluated in priority order, first match wins. The three hard
//! disqualifiers come first and dominate any confidence, including 100.

use std::fmt;

use serde::Serialize;

use presswheel_common::QualityChecks;

pub const HIGH_QUALITY_CONFIDENCE: u8 = 90;
pub const ACCEPTABLE_CONFIDENCE: u8 = 80;
pub const REVIEW_CONFIDENCE: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    /// Soft reject: close enough that a human might publish it.
    Review,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    NoSources,
    BannedContent,
    UnverifiedClaims,
    HighQuality,
    AcceptableQuality,
    NeedsManualReview,
    ConfidenceTooLow,
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSources => write!(f, "no sources"),
            Self::BannedContent => write!(f, "banned content"),
            Self::UnverifiedClaims => write!(f, "unverified claims"),
            Self::HighQuality => write!(f, "high quality"),
            Self::AcceptableQuality => write!(f, "acceptable quality"),
            Self::NeedsManualReview => write!(f, "needs manual review"),
            Self::ConfidenceTooLow => write!(f, "confidence too low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    pub verdict: Verdict,
    pub reason: GateReason,
}

impl GateOutcome {
    fn new(verdict: Verdict, reason: GateReason) -> Self {
        Self { verdict, reason }
    }

    pub fn is_accept(&self) -> bool {
        self.verdict == Verdict::Accept
    }

    /// Rules 1-3: disqualified regardless of confidence.
    pub fn is_hard_reject(&self) -> bool {
        matches!(
            self.reason,
            GateReason::NoSources | GateReason::BannedContent | GateReason::UnverifiedClaims
        )
    }
}

/// Total over every input; never fails.
pub fn evaluate(checks: &QualityChecks, confidence: u8) -> GateOutcome {
    use GateReason::*;
    use Verdict::*;

    if !checks.has_sources {
        GateOutcome::new(Reject, NoSources)
    } else if checks.has_banned_words {
        GateOutcome::new(Reject, BannedContent)
    } else if checks.has_unverified_claims {
        GateOutcome::new(Reject, UnverifiedClaims)
    } else if confidence >= HIGH_QUALITY_CONFIDENCE && checks.has_data && checks.structure_valid {
        GateOutcome::new(Accept, HighQuality)
    } else if confidence >= ACCEPTABLE_CONFIDENCE && checks.has_data {
        GateOutcome::new(Accept, AcceptableQuality)
    } else if confidence >= REVIEW_CONFIDENCE {
        GateOutcome::new(Review, NeedsManualReview)
    } else {
        GateOutcome::new(Reject, ConfidenceTooLow)
    }
}
