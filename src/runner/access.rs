//! Step Access Policy
//!
//! The access flag is resolved by the catalog (ownership or a purchase)
//! and passed in; this module never looks at local progress.

use crate::types::{Chain, Step};

/// A step is locked iff the chain is monetized and the viewer lacks access
pub fn is_locked(chain: &Chain, _step: &Step, viewer_has_access: bool) -> bool {
    chain.is_premium && !viewer_has_access
}
