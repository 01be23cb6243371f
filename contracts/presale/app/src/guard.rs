//! Single-entry guard for operations that await external replies.

use presale_shared::{ContractResult, PresaleError};

/// Busy flag of one presale instance.
///
/// A Gear program keeps handling other messages while one of its messages
/// waits for a reply, so a second call could otherwise observe a half-applied
/// operation. Every mutating operation enters the guard first and exits it on
/// every return path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReentrancyGuard {
    busy: bool,
}

impl ReentrancyGuard {
    pub fn enter(&mut self) -> ContractResult<()> {
        if self.busy {
            return Err(PresaleError::Reentrant);
        }
        self.busy = true;
        Ok(())
    }

    pub fn exit(&mut self) {
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}
