//! Farmer lifecycle invariants.

use crate::farmer::error::{FarmerError, Result};

/// Only inactive farmers may be physically removed.
#[inline]
pub fn can_delete(active: bool) -> bool {
    !active
}

/// Validates that a farmer has been deactivated before removal.
pub fn ensure_deletable(active: bool) -> Result<()> {
    if !can_delete(active) {
        return Err(FarmerError::ActiveFarmer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_delete() {
        assert!(can_delete(false));
        assert!(!can_delete(true));
    }

    #[test]
    fn test_ensure_deletable() {
        assert!(ensure_deletable(false).is_ok());

        let err = ensure_deletable(true).unwrap_err();
        assert!(matches!(err, FarmerError::ActiveFarmer));
    }
}
