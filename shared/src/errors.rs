//! Error types shared by the presale, vesting and custody services.

use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;

/// Broad class of a [`PresaleError`].
#[derive(Debug, Clone, Copy, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum ErrorKind {
    /// Rejected at construction.
    Configuration,
    /// Operation invoked in the wrong lifecycle phase.
    State,
    /// Caller lacks the required capability.
    Authorization,
    /// Cap, window or allowance violated.
    Capacity,
    /// Pool provider or payment rail rejected the call.
    External,
}

/// Every named failure a call can end with.
#[derive(Debug, Clone, Copy, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum PresaleError {
    // Configuration.
    InvalidHardCap,
    InvalidSoftCap,
    SoftCapTooLow,
    InvalidContributionLimits,
    InvalidLiquidityShare,
    SlippageTooHigh,
    InvalidPresaleRate,
    InvalidListingRate,
    ListingRateTooHigh,
    InvalidStartTime,
    InvalidEndTime,
    InvalidLockupDuration,
    InvalidVestingBps,
    InvalidVestingDuration,
    HouseFeeTooHigh,
    ZeroAddress,

    // State.
    NotPending,
    NotActive,
    NotFinalized,
    NotStarted,
    AlreadyEnded,
    NotEnded,
    ClaimPeriodExpired,
    RefundNotAvailable,
    RescueNotAvailable,
    RescueProtected,
    WhitelistLocked,
    WrongWhitelistMode,
    PresaleClosed,
    Reentrant,
    StillLocked,
    AlreadyWithdrawn,

    // Authorization.
    Unauthorized,
    NotWhitelisted,
    NotLockOwner,

    // Capacity.
    BelowMinContribution,
    MaxContributionExceeded,
    HardCapExceeded,
    SoftCapNotReached,
    InsufficientDeposit,
    AttachedValueMismatch,
    NoTokensToClaim,
    NoFundsToRefund,
    NoFundsToWithdraw,
    NoTokensToRelease,
    ZeroAmount,
    InvalidUnlockTime,
    LockNotFound,
    ScheduleNotFound,
    Overflow,

    // External.
    TransferFailed,
    PoolUnavailable,
    LiquificationFailed,
}

impl PresaleError {
    pub fn kind(&self) -> ErrorKind {
        use PresaleError::*;

        match self {
            InvalidHardCap | InvalidSoftCap | SoftCapTooLow | InvalidContributionLimits
            | InvalidLiquidityShare | SlippageTooHigh | InvalidPresaleRate
            | InvalidListingRate | ListingRateTooHigh | InvalidStartTime | InvalidEndTime
            | InvalidLockupDuration | InvalidVestingBps | InvalidVestingDuration
            | HouseFeeTooHigh | ZeroAddress => ErrorKind::Configuration,

            NotPending | NotActive | NotFinalized | NotStarted | AlreadyEnded | NotEnded
            | ClaimPeriodExpired | RefundNotAvailable | RescueNotAvailable | RescueProtected
            | WhitelistLocked | WrongWhitelistMode | PresaleClosed | Reentrant | StillLocked
            | AlreadyWithdrawn => ErrorKind::State,

            Unauthorized | NotWhitelisted | NotLockOwner => ErrorKind::Authorization,

            BelowMinContribution | MaxContributionExceeded | HardCapExceeded
            | SoftCapNotReached | InsufficientDeposit | AttachedValueMismatch
            | NoTokensToClaim | NoFundsToRefund | NoFundsToWithdraw | NoTokensToRelease
            | ZeroAmount | InvalidUnlockTime | LockNotFound | ScheduleNotFound | Overflow => {
                ErrorKind::Capacity
            }

            TransferFailed | PoolUnavailable | LiquificationFailed => ErrorKind::External,
        }
    }
}

/// Result type alias using PresaleError.
pub type ContractResult<T> = Result<T, PresaleError>;
