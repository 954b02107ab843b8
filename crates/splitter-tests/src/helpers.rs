//! Shared fixtures for scenario and property tests.

use splitter_core::bank::MemoryBank;
use splitter_core::registry::MembershipTable;
use splitter_core::types::{Address, Amount, AssetId, Weight};
use splitter_ledger::{PullLedger, PushDistributor};

pub type Ledger = PullLedger<MembershipTable, MemoryBank>;
pub type Distributor = PushDistributor<MembershipTable, MemoryBank>;

/// Account the ledger or distributor acts as.
pub const SPLITTER: u8 = 0xAA;
/// External account that funds deposits and distributions.
pub const FUNDER: u8 = 0xF0;
/// Account that never holds a membership.
pub const OUTSIDER: u8 = 0x99;

/// Deterministic address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address::from_seed(seed)
}

/// The token distributed by default.
pub fn token() -> AssetId {
    AssetId::Token(addr(0xEE))
}

/// One membership per weight, owned by `addr(1)`, `addr(2)`, ...
pub fn members(weights: &[Weight]) -> Vec<(Address, Weight)> {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| (addr(i as u8 + 1), *w))
        .collect()
}

pub fn registry(weights: &[Weight]) -> MembershipTable {
    MembershipTable::with_members(&members(weights)).expect("valid membership list")
}

/// Pull ledger over `token()` with the default deposit cap.
pub fn ledger(weights: &[Weight]) -> Ledger {
    PullLedger::new(addr(SPLITTER), token(), registry(weights), MemoryBank::new()).expect("valid ledger")
}

/// Push distributor whose settle asset is `token()`.
pub fn distributor(weights: &[Weight]) -> Distributor {
    PushDistributor::new(addr(SPLITTER), token(), registry(weights), MemoryBank::new())
        .expect("valid distributor")
}

/// Give `FUNDER` `amount` of `asset` and approve `spender` for all of it.
pub fn fund(bank: &mut MemoryBank, asset: AssetId, spender: &Address, amount: Amount) {
    bank.mint(asset, &addr(FUNDER), amount).expect("mint");
    bank.approve(asset, &addr(FUNDER), spender, amount);
}

/// Transfer `amount` of `asset` straight to `to`, bypassing any ledger.
pub fn send(bank: &mut MemoryBank, asset: AssetId, to: &Address, amount: Amount) {
    bank.mint(asset, to, amount).expect("mint");
}
