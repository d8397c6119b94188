//! Attribution checks for a submitted selection.

use crate::cards::PublicCards;
use crate::commitment::{selection_digest, Submission};
use crate::error::{GameError, Result};
use crate::types::GameId;
use fivecard_core::{Address, CiphertextVerifier, Network};

/// The oracle must vouch that this handle was produced for `caller`.
pub fn check_ciphertext(
    verifier: &dyn CiphertextVerifier,
    game: GameId,
    submission: &Submission,
    caller: &Address,
) -> Result<()> {
    if verifier.verify_ciphertext(&submission.handle, &submission.proof, caller) {
        Ok(())
    } else {
        Err(GameError::InvalidCiphertext(game))
    }
}

/// Find the signer of the attestation and require it to be `caller`.
///
/// The plaintext choice is unknown here, but a legitimate attestation is over
/// the digest of one of the board's values, so each distinct value is tried.
/// The matched value is not kept.
pub fn resolve_attestation(
    game: GameId,
    cards: &PublicCards,
    submission: &Submission,
    caller: &Address,
    network: Network,
) -> Result<Address> {
    for value in cards.distinct() {
        let digest = selection_digest(game, value);
        if let Ok(signer) = submission.signature.recover_address(&digest, network) {
            if &signer == caller {
                return Ok(signer);
            }
        }
    }

    tracing::debug!("No board value of game {} recovers {}", game, caller);
    Err(GameError::BadSignature(game))
}
