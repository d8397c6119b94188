use fivecard_core::{Address, CiphertextHandle};
use serde::{Deserialize, Serialize};

/// A committed, still encrypted, card choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub handle: CiphertextHandle,
    /// Signer recovered from the attestation; always the seat's player.
    pub attested_by: Address,
}

/// One side of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    player: Address,
    selection: Option<Selection>,
}

impl Seat {
    pub fn new(player: Address) -> Self {
        Self {
            player,
            selection: None,
        }
    }

    pub fn player(&self) -> &Address {
        &self.player
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn handle(&self) -> Option<CiphertextHandle> {
        self.selection.as_ref().map(|s| s.handle)
    }

    pub fn has_selected(&self) -> bool {
        self.selection.is_some()
    }

    pub fn is(&self, address: &Address) -> bool {
        &self.player == address
    }

    /// Callers check `has_selected` first; a selection is never overwritten.
    pub(crate) fn record(&mut self, selection: Selection) {
        debug_assert!(self.selection.is_none());
        if self.selection.is_none() {
            tracing::debug!("{} committed {}", self.player.short(), selection.handle);
            self.selection = Some(selection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_once() {
        let alice = Address::from_stored("bcrt1qalice".to_string());
        let mut seat = Seat::new(alice.clone());
        assert!(!seat.has_selected());
        assert!(seat.is(&alice));

        let handle = CiphertextHandle::from_bytes([1; 32]);
        seat.record(Selection {
            handle,
            attested_by: alice.clone(),
        });
        assert!(seat.has_selected());
        assert_eq!(seat.handle(), Some(handle));
        assert_eq!(seat.selection().unwrap().attested_by, alice);
    }
}
