//! Flash budget accounting.

/// A sample set that does not fit in the flash left over by the firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverBudget {
    pub set_name: String,
    /// Bytes to shave off, via trims or a lower sample rate.
    pub over_by: usize,
}

/// Compare a set's total table size against the shared budget.
///
/// Pure; the caller decides whether an overage is a warning or a hard stop.
pub fn check(total: usize, available: usize, set_name: &str) -> Option<OverBudget> {
    if total > available {
        Some(OverBudget {
            set_name: set_name.to_string(),
            over_by: total - available,
        })
    } else {
        None
    }
}
