use architect_core::{StressEstimate, StressTier};

const LOW_MAX: i64 = 4096;
const MEDIUM_MAX: i64 = 16384;

/// Rough stress estimate for a contraption: total demand, a coarse tier and
/// one advisory line. Pure and deterministic.
pub fn estimate(machines: i64, base_stress: i64) -> StressEstimate {
    let total = machines.saturating_mul(base_stress);
    let tier = if total <= LOW_MAX {
        StressTier::Low
    } else if total <= MEDIUM_MAX {
        StressTier::Medium
    } else {
        StressTier::High
    };
    let advice = match tier {
        StressTier::Low => "A couple of water wheels or a small steam engine array is enough.",
        StressTier::Medium => "Use multiple water wheels, a windmill, or a solid steam engine setup.",
        StressTier::High => "High demand: consider large steam engines or splitting power networks.",
    };
    StressEstimate {
        machines,
        base_stress,
        total,
        tier,
        advice: advice.to_string(),
    }
}
