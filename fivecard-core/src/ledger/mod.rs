//! Account balances and signed transaction envelopes for the ledger host.

pub mod bank;
pub mod envelope;

pub use bank::Bank;
pub use envelope::Envelope;
