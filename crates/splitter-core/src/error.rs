//! Error types for Splitter.
//!
//! Every error aborts the triggering operation with no partial ledger
//! mutation. Nothing is retried internally.
use thiserror::Error;

use crate::types::{Address, Amount, AssetId, MembershipId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("membership list is empty")] EmptyMembership,
    #[error("too many memberships: {count} > {max}")] TooManyMemberships { count: usize, max: usize },
    #[error("total weight is zero")] ZeroTotalWeight,
    #[error("already initialized")] AlreadyInitialized,
    #[error("not initialized")] NotInitialized,
    #[error("maximum deposit {max} exceeds the distribution cap {cap}")] MaxDepositTooLarge { max: Amount, cap: Amount },
    #[error("asset mismatch: ledger distributes {expected}, got {got}")] AssetMismatch { expected: AssetId, got: AssetId },
    #[error("restored state is inconsistent")] InconsistentState,
    #[error("membership {id} claimed {claimed}, entitled to {entitled}")] OverClaimed { id: MembershipId, claimed: Amount, entitled: Amount },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("caller {0} holds no membership")] NotAMember(Address),
    #[error("caller {caller} does not own membership {id}")] NotOwner { id: MembershipId, caller: Address },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmptyOperationError {
    #[error("nothing to deposit: {0} holds no balance")] NothingToDeposit(Address),
    #[error("nothing to register")] NothingToRegister,
    #[error("nothing to distribute from {0}")] NothingToDistribute(Address),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverflowError {
    #[error("deposit too large: {amount} > {max}")] DepositTooLarge { amount: Amount, max: Amount },
    #[error("amount exceeds cap: {amount} > {max}")] AmountExceedsCap { amount: Amount, max: Amount },
    #[error("arithmetic overflow")] Arithmetic,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient balance of {asset} at {holder}: have {have}, need {need}")]
    InsufficientBalance { asset: AssetId, holder: Address, have: Amount, need: Amount },
    #[error("insufficient allowance from {owner} to {spender}: have {have}, need {need}")]
    InsufficientAllowance { owner: Address, spender: Address, have: Amount, need: Amount },
    #[error("native payments can only be pushed by {spender}, not pulled from {from}")]
    NativePullNotAllowed { spender: Address, from: Address },
    #[error("transfer rejected: {0}")] Rejected(String),
    #[error("balance overflow at {0}")] BalanceOverflow(Address),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown membership: {0}")] UnknownMembership(MembershipId),
    #[error("{from} does not own membership {id}")] NotCurrentOwner { id: MembershipId, from: Address },
    #[error("invalid address: {0}")] InvalidAddress(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error(transparent)] Setup(#[from] SetupError),
    #[error(transparent)] Authorization(#[from] AuthorizationError),
    #[error(transparent)] EmptyOperation(#[from] EmptyOperationError),
    #[error(transparent)] Overflow(#[from] OverflowError),
    #[error(transparent)] Transfer(#[from] TransferError),
    #[error(transparent)] Registry(#[from] RegistryError),
}
