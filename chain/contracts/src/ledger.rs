//! Voucher ledger: create, claim, redeem, and admin configuration
//!
//! Lifecycle of a voucher:
//! `create → claim → (window lapses → claim again)* → redeem`
//!
//! - Creation escrows the attached amount minus the creation fee.
//! - A claim escrows an exact deposit and grants the claimant exclusive
//!   redemption rights until the window lapses.
//! - Reclaiming after a lapse forfeits the previous deposit: a bonus share
//!   stays with the voucher, the rest goes to the fee recipient.
//! - Redemption reveals the secret and pays value, deposit and bonus to the
//!   claimant, then deletes the voucher.
//!
//! Each operation validates everything first, settles all of its transfers in
//! one batch, and only then writes the record. A rejected call changes nothing.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use voucher_types::amount;
use voucher_types::digest::Hash32;
use voucher_types::fee::{split_forfeited_deposit, CreationFee, FeeParams};
use voucher_types::ids::{Address, ReceiptId, VoucherId};
use voucher_types::time::{self, Timestamp};

use crate::bank::{Bank, Transfer};
use crate::commitment::SecretCommitment;
use crate::config::LedgerConfig;
use crate::errors::{ConfigError, VoucherError};
use crate::events::{
    ClaimForfeited, ContractEvent, RedemptionClaimed, StrayFundsRecovered, VoucherCreated,
    VoucherRedeemed,
};
use crate::security::AccessControl;
use crate::storage::{LedgerSnapshot, SlotEntry, STORAGE_LAYOUT_VERSION};
use crate::voucher::{Claim, RedemptionReceipt, Voucher, VoucherSlot, VoucherStatus};

/// Implementation tag recorded at deployment.
pub const INITIAL_IMPLEMENTATION: &str = concat!("voucher-contracts/", env!("CARGO_PKG_VERSION"));

/// Call context of a user operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    /// Authenticated caller
    pub caller: Address,
    /// Currency attached to the call
    pub value: Decimal,
    /// Ledger time of the call
    pub now: Timestamp,
}

impl TxContext {
    pub fn new(caller: impl Into<Address>, value: Decimal, now: Timestamp) -> Self {
        Self {
            caller: caller.into(),
            value,
            now,
        }
    }

    /// A call with nothing attached.
    pub fn call(caller: impl Into<Address>, now: Timestamp) -> Self {
        Self::new(caller, Decimal::ZERO, now)
    }
}

/// Custodial voucher ledger.
#[derive(Debug, Clone)]
pub struct VoucherLedger {
    slots: HashMap<VoucherId, VoucherSlot>,
    access_control: AccessControl,
    fee_recipient: Address,
    fee_params: FeeParams,
    claim_period_seconds: i64,
    /// Bank account holding all escrow
    contract_address: Address,
    implementation: String,
    events: Vec<ContractEvent>,
}

impl VoucherLedger {
    /// Deploy a ledger from validated configuration.
    pub fn new(config: LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            admin = %config.admin,
            fee_recipient = %config.fee_recipient,
            claim_period_seconds = config.claim_period_seconds,
            "Voucher ledger deployed"
        );
        Ok(Self {
            slots: HashMap::new(),
            fee_params: config.fee_params(),
            access_control: AccessControl::new(config.admin),
            fee_recipient: config.fee_recipient,
            claim_period_seconds: config.claim_period_seconds,
            contract_address: config.contract_address,
            implementation: INITIAL_IMPLEMENTATION.to_string(),
            events: Vec::new(),
        })
    }

    /// Deploy with default settings; `admin` also receives fees.
    pub fn with_defaults(admin: impl Into<Address>) -> Result<Self, ConfigError> {
        Self::new(LedgerConfig::new(admin))
    }

    // ─── User operations ───

    /// Create a voucher under `hash(code)`, committed to `secret_commitment`.
    ///
    /// The creation fee is deducted from `ctx.value` and paid to the fee
    /// recipient; the remainder is escrowed as the voucher's value.
    pub fn create(
        &mut self,
        bank: &mut Bank,
        ctx: &TxContext,
        code: &[u8],
        secret_commitment: SecretCommitment,
        claim_deposit: Decimal,
    ) -> Result<ContractEvent, VoucherError> {
        self.ensure_external(ctx, "create")?;
        let voucher_id = VoucherId::from_code(code);
        amount::validate(ctx.value)?;
        amount::validate(claim_deposit)?;

        if matches!(self.slots.get(&voucher_id), Some(VoucherSlot::Live(_))) {
            warn!(voucher = %voucher_id, creator = %ctx.caller, "Duplicate voucher rejected");
            return Err(VoucherError::DuplicateVoucher {
                voucher_id: voucher_id.to_string(),
            });
        }

        let quote = self.fee_params.creation_fee(ctx.value)?;
        if !quote.is_viable() {
            return Err(VoucherError::InsufficientFunds {
                attached: ctx.value.to_string(),
                fee: quote.fee.to_string(),
            });
        }
        debug!(voucher = %voucher_id, attached = %quote.attached, fee = %quote.fee, value = %quote.value, "Creation fee applied");

        bank.settle(&[
            Transfer::new(ctx.caller.clone(), self.contract_address.clone(), ctx.value),
            Transfer::new(self.contract_address.clone(), self.fee_recipient.clone(), quote.fee),
        ])?;

        // Overwrites a redeemed slot; the identifier is free again
        self.slots.insert(
            voucher_id,
            VoucherSlot::Live(Voucher {
                creator: ctx.caller.clone(),
                secret_commitment,
                value: quote.value,
                claim_deposit,
                claim: None,
                forfeited_deposit_credit: Decimal::ZERO,
                created_at: ctx.now,
                claim_count: 0,
            }),
        );

        info!(voucher = %voucher_id, creator = %ctx.caller, value = %quote.value, claim_deposit = %claim_deposit, "Voucher created");

        let event = ContractEvent::VoucherCreated(VoucherCreated {
            voucher_id,
            creator: ctx.caller.clone(),
            secret_commitment,
            value: quote.value,
            claim_deposit,
            fee: quote.fee,
            created_at: ctx.now,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    /// Claim exclusive redemption rights by escrowing the exact deposit.
    ///
    /// Succeeds on an unclaimed voucher or one whose claim has lapsed. A lapsed
    /// claim's deposit is forfeited: the bonus share is credited to the voucher
    /// and the remainder paid to the fee recipient.
    pub fn claim(
        &mut self,
        bank: &mut Bank,
        ctx: &TxContext,
        voucher_id: &VoucherId,
    ) -> Result<ContractEvent, VoucherError> {
        self.ensure_external(ctx, "claim")?;
        let voucher = self.live(voucher_id)?;
        amount::validate(ctx.value)?;

        if ctx.value != voucher.claim_deposit {
            return Err(VoucherError::WrongDepositAmount {
                expected: voucher.claim_deposit.to_string(),
                attached: ctx.value.to_string(),
            });
        }

        if let Some(active) = voucher.active_claim(ctx.now) {
            warn!(
                voucher = %voucher_id,
                caller = %ctx.caller,
                holder = %active.claimant,
                expires_at = active.expires_at,
                "Claim rejected, window still open"
            );
            return Err(VoucherError::ClaimInProgress {
                expires_at: active.expires_at,
            });
        }

        let forfeited = match &voucher.claim {
            Some(lapsed) => Some((lapsed.claimant.clone(), split_forfeited_deposit(lapsed.deposit)?)),
            None => None,
        };
        let credit = match &forfeited {
            Some((_, split)) => voucher
                .forfeited_deposit_credit
                .checked_add(split.credit)
                .ok_or(VoucherError::Overflow)?,
            None => voucher.forfeited_deposit_credit,
        };
        let claim_count = voucher.claim_count.checked_add(1).ok_or(VoucherError::Overflow)?;
        let expires_at =
            time::window_end(ctx.now, self.claim_period_seconds).ok_or(VoucherError::Overflow)?;

        let mut legs = vec![Transfer::new(
            ctx.caller.clone(),
            self.contract_address.clone(),
            ctx.value,
        )];
        if let Some((_, split)) = &forfeited {
            legs.push(Transfer::new(
                self.contract_address.clone(),
                self.fee_recipient.clone(),
                split.retained,
            ));
        }
        bank.settle(&legs)?;

        let claim = Claim {
            claimant: ctx.caller.clone(),
            deposit: ctx.value,
            claimed_at: ctx.now,
            expires_at,
        };
        if let Some(VoucherSlot::Live(voucher)) = self.slots.get_mut(voucher_id) {
            voucher.claim = Some(claim);
            voucher.forfeited_deposit_credit = credit;
            voucher.claim_count = claim_count;
        }

        if let Some((previous_claimant, split)) = forfeited {
            info!(
                voucher = %voucher_id,
                previous_claimant = %previous_claimant,
                credit = %split.credit,
                retained = %split.retained,
                "Lapsed claim forfeited"
            );
            self.events.push(ContractEvent::ClaimForfeited(ClaimForfeited {
                voucher_id: *voucher_id,
                previous_claimant,
                credit: split.credit,
                retained: split.retained,
            }));
        }

        info!(voucher = %voucher_id, claimant = %ctx.caller, expires_at = %time::format_timestamp(expires_at), "Redemption claimed");

        let event = ContractEvent::RedemptionClaimed(RedemptionClaimed {
            voucher_id: *voucher_id,
            claimant: ctx.caller.clone(),
            deposit: ctx.value,
            expires_at,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    /// Redeem by revealing the secret while holding an unexpired claim.
    ///
    /// Pays value, the claim deposit and any accumulated bonus to the caller
    /// and deletes the voucher.
    pub fn redeem(
        &mut self,
        bank: &mut Bank,
        ctx: &TxContext,
        voucher_id: &VoucherId,
        revealed_secret: &[u8],
    ) -> Result<ContractEvent, VoucherError> {
        self.ensure_external(ctx, "redeem")?;
        if !ctx.value.is_zero() {
            return Err(VoucherError::NonPayable {
                operation: "redeem",
            });
        }
        let voucher = self.live(voucher_id)?;

        let claim = match &voucher.claim {
            Some(claim) if claim.claimant == ctx.caller => claim,
            _ => {
                warn!(voucher = %voucher_id, caller = %ctx.caller, "Redeem by non-claimant rejected");
                return Err(VoucherError::NotClaimed);
            }
        };

        if time::is_lapsed(ctx.now, claim.expires_at) {
            return Err(VoucherError::ClaimExpired {
                expired_at: claim.expires_at,
            });
        }

        if !voucher.secret_commitment.is_opened_by(revealed_secret) {
            warn!(voucher = %voucher_id, caller = %ctx.caller, "Secret mismatch");
            return Err(VoucherError::SecretMismatch);
        }

        let value = voucher.value;
        let deposit_refund = claim.deposit;
        let bonus = voucher.forfeited_deposit_credit;
        let payout = amount::checked_sum([value, deposit_refund, bonus])?;

        bank.transfer(self.contract_address.as_str(), ctx.caller.as_str(), payout)?;

        let receipt_id = ReceiptId::new();
        self.slots.insert(
            *voucher_id,
            VoucherSlot::Redeemed(RedemptionReceipt {
                receipt_id,
                redeemer: ctx.caller.clone(),
                payout,
                redeemed_at: ctx.now,
            }),
        );

        info!(voucher = %voucher_id, redeemer = %ctx.caller, payout = %payout, receipt = %receipt_id, "Voucher redeemed");

        let event = ContractEvent::VoucherRedeemed(VoucherRedeemed {
            voucher_id: *voucher_id,
            receipt_id,
            redeemer: ctx.caller.clone(),
            value,
            deposit_refund,
            bonus,
            redeemed_at: ctx.now,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    // ─── Admin operations ───

    pub fn set_fee_recipient(
        &mut self,
        caller: &str,
        fee_recipient: impl Into<Address>,
    ) -> Result<ContractEvent, VoucherError> {
        self.access_control.ensure_admin(caller, "set_fee_recipient")?;
        let fee_recipient = fee_recipient.into();
        info!(previous = %self.fee_recipient, fee_recipient = %fee_recipient, "Fee recipient updated");
        self.fee_recipient = fee_recipient.clone();

        let event = ContractEvent::FeeRecipientUpdated { fee_recipient };
        self.events.push(event.clone());
        Ok(event)
    }

    /// Replace the creation fee parameters. Existing vouchers are unaffected.
    pub fn set_creation_fee_params(
        &mut self,
        caller: &str,
        min_creation_fee: Decimal,
        creation_fee_rate_bps: u32,
    ) -> Result<ContractEvent, VoucherError> {
        self.access_control.ensure_admin(caller, "set_creation_fee_params")?;
        let params = FeeParams::new(min_creation_fee, creation_fee_rate_bps)?;
        info!(min_creation_fee = %min_creation_fee, creation_fee_rate_bps, "Creation fee parameters updated");
        self.fee_params = params;

        let event = ContractEvent::FeeParamsUpdated {
            min_creation_fee,
            creation_fee_rate_bps,
        };
        self.events.push(event.clone());
        Ok(event)
    }

    /// Change the claim window. Claims already placed keep their expiry.
    pub fn set_claim_period(
        &mut self,
        caller: &str,
        claim_period_seconds: i64,
    ) -> Result<ContractEvent, VoucherError> {
        self.access_control.ensure_admin(caller, "set_claim_period")?;
        if claim_period_seconds <= 0 {
            return Err(VoucherError::InvalidClaimPeriod {
                seconds: claim_period_seconds,
            });
        }
        info!(
            previous = self.claim_period_seconds,
            claim_period_seconds, "Claim period updated"
        );
        self.claim_period_seconds = claim_period_seconds;

        let event = ContractEvent::ClaimPeriodUpdated {
            claim_period_seconds,
        };
        self.events.push(event.clone());
        Ok(event)
    }

    /// Sweep currency held by the ledger account that no voucher accounts for.
    pub fn recover_stray_funds(
        &mut self,
        bank: &mut Bank,
        caller: &str,
        to: impl Into<Address>,
        amount: Decimal,
    ) -> Result<ContractEvent, VoucherError> {
        self.access_control.ensure_admin(caller, "recover_stray_funds")?;
        amount::validate(amount)?;

        let available = self.unencumbered_balance(bank);
        if amount > available {
            warn!(requested = %amount, available = %available, "Recovery exceeds unencumbered balance");
            return Err(VoucherError::InvalidRecovery {
                requested: amount.to_string(),
                available: available.to_string(),
            });
        }

        let to = to.into();
        bank.transfer(self.contract_address.as_str(), to.as_str(), amount)?;
        info!(to = %to, amount = %amount, "Stray funds recovered");

        let event = ContractEvent::StrayFundsRecovered(StrayFundsRecovered { to, amount });
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn transfer_admin(
        &mut self,
        caller: &str,
        new_admin: impl Into<Address>,
    ) -> Result<ContractEvent, VoucherError> {
        self.access_control.ensure_admin(caller, "transfer_admin")?;
        let previous = self.access_control.admin().clone();
        let admin = new_admin.into();
        if !self.access_control.transfer_admin(caller, admin.clone()) {
            return Err(VoucherError::Unauthorized);
        }
        info!(previous = %previous, admin = %admin, "Admin transferred");

        let event = ContractEvent::AdminTransferred { previous, admin };
        self.events.push(event.clone());
        Ok(event)
    }

    /// Point the ledger at new code. Storage is carried over untouched.
    pub fn upgrade_to(
        &mut self,
        caller: &str,
        implementation: impl Into<String>,
    ) -> Result<ContractEvent, VoucherError> {
        self.access_control.ensure_admin(caller, "upgrade_to")?;
        let implementation = implementation.into();
        info!(previous = %self.implementation, implementation = %implementation, "Ledger upgraded");
        self.implementation = implementation.clone();

        let event = ContractEvent::Upgraded { implementation };
        self.events.push(event.clone());
        Ok(event)
    }

    // ─── Queries ───

    /// Live voucher under `voucher_id`.
    pub fn get_voucher(&self, voucher_id: &VoucherId) -> Option<&Voucher> {
        match self.slots.get(voucher_id) {
            Some(VoucherSlot::Live(voucher)) => Some(voucher),
            _ => None,
        }
    }

    pub fn voucher_status(&self, voucher_id: &VoucherId, now: Timestamp) -> VoucherStatus {
        match self.slots.get(voucher_id) {
            None => VoucherStatus::Absent,
            Some(VoucherSlot::Live(voucher)) => voucher.status(now),
            Some(VoucherSlot::Redeemed(receipt)) => VoucherStatus::Redeemed {
                receipt_id: receipt.receipt_id,
            },
        }
    }

    pub fn redemption_receipt(&self, voucher_id: &VoucherId) -> Option<&RedemptionReceipt> {
        match self.slots.get(voucher_id) {
            Some(VoucherSlot::Redeemed(receipt)) => Some(receipt),
            _ => None,
        }
    }

    /// Live vouchers in no particular order.
    pub fn live_vouchers(&self) -> impl Iterator<Item = (&VoucherId, &Voucher)> {
        self.slots.iter().filter_map(|(id, slot)| match slot {
            VoucherSlot::Live(voucher) => Some((id, voucher)),
            VoucherSlot::Redeemed(_) => None,
        })
    }

    pub fn get_claim_period(&self) -> i64 {
        self.claim_period_seconds
    }

    /// `(min_creation_fee, creation_fee_rate_bps)`
    pub fn get_fee_params(&self) -> (Decimal, u32) {
        (
            self.fee_params.min_creation_fee,
            self.fee_params.creation_fee_rate_bps,
        )
    }

    /// Fee breakdown `create` would apply to `attached` right now.
    pub fn quote_creation(&self, attached: Decimal) -> Result<CreationFee, VoucherError> {
        Ok(self.fee_params.creation_fee(attached)?)
    }

    pub fn fee_recipient(&self) -> &Address {
        &self.fee_recipient
    }

    pub fn admin(&self) -> &Address {
        self.access_control.admin()
    }

    pub fn contract_address(&self) -> &Address {
        &self.contract_address
    }

    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    /// Total owed to live vouchers and their claimants.
    pub fn escrow_total(&self) -> Decimal {
        self.live_vouchers().map(|(_, v)| v.escrowed()).sum()
    }

    /// Ledger account balance in excess of escrow.
    pub fn unencumbered_balance(&self, bank: &Bank) -> Decimal {
        let held = bank.balance_of(self.contract_address.as_str());
        (held - self.escrow_total()).max(Decimal::ZERO)
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Take all emitted events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    // ─── Storage ───

    /// Persistent state, slots ordered by identifier.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut slots: Vec<SlotEntry> = self
            .slots
            .iter()
            .map(|(voucher_id, slot)| SlotEntry {
                voucher_id: *voucher_id,
                slot: slot.clone(),
            })
            .collect();
        slots.sort_by(|a, b| a.voucher_id.cmp(&b.voucher_id));

        LedgerSnapshot {
            layout_version: STORAGE_LAYOUT_VERSION,
            admin: self.access_control.admin().clone(),
            fee_recipient: self.fee_recipient.clone(),
            fee_params: self.fee_params.clone(),
            claim_period_seconds: self.claim_period_seconds,
            contract_address: self.contract_address.clone(),
            implementation: self.implementation.clone(),
            slots,
        }
    }

    /// Rebuild a ledger from a snapshot taken by this storage layout.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self, VoucherError> {
        if snapshot.layout_version != STORAGE_LAYOUT_VERSION {
            return Err(VoucherError::IncompatibleLayout {
                expected: STORAGE_LAYOUT_VERSION,
                found: snapshot.layout_version,
            });
        }
        snapshot.fee_params.validate()?;
        if snapshot.claim_period_seconds <= 0 {
            return Err(VoucherError::InvalidClaimPeriod {
                seconds: snapshot.claim_period_seconds,
            });
        }

        let slots: HashMap<VoucherId, VoucherSlot> = snapshot
            .slots
            .into_iter()
            .map(|entry| (entry.voucher_id, entry.slot))
            .collect();
        info!(
            slots = slots.len(),
            implementation = %snapshot.implementation,
            "Voucher ledger restored"
        );

        Ok(Self {
            slots,
            access_control: AccessControl::new(snapshot.admin),
            fee_recipient: snapshot.fee_recipient,
            fee_params: snapshot.fee_params,
            claim_period_seconds: snapshot.claim_period_seconds,
            contract_address: snapshot.contract_address,
            implementation: snapshot.implementation,
            events: Vec::new(),
        })
    }

    /// Digest of the persistent state.
    pub fn state_root(&self) -> Result<Hash32, VoucherError> {
        self.snapshot().state_root()
    }

    /// The escrow account cannot act as a caller: its transfers to itself
    /// would book value that never arrived.
    fn ensure_external(&self, ctx: &TxContext, operation: &'static str) -> Result<(), VoucherError> {
        if ctx.caller == self.contract_address {
            warn!(caller = %ctx.caller, operation, "Call from the escrow account rejected");
            return Err(VoucherError::ReservedCaller {
                caller: ctx.caller.to_string(),
            });
        }
        Ok(())
    }

    fn live(&self, voucher_id: &VoucherId) -> Result<&Voucher, VoucherError> {
        self.get_voucher(voucher_id)
            .ok_or_else(|| VoucherError::VoucherNotFound {
                voucher_id: voucher_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    const ADMIN: &str = "owner";
    const CODE: &[u8] = b"abcd-defg-5112-954J";
    const SECRET: &[u8] = b"CryptoVoucherTesting!";
    const PERIOD: i64 = 3_600;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn setup() -> (VoucherLedger, Bank) {
        let config = LedgerConfig::new(ADMIN)
            .with_fee_recipient("treasury")
            .with_claim_period(PERIOD);
        let ledger = VoucherLedger::new(config).unwrap();
        let mut bank = Bank::new();
        for who in ["alice", "bob", "carol"] {
            bank.mint(who, Decimal::from(1_000)).unwrap();
        }
        (ledger, bank)
    }

    fn create_default(ledger: &mut VoucherLedger, bank: &mut Bank) -> VoucherId {
        // 2.04 attached → value 2, fee 0.04
        let ctx = TxContext::new("alice", dec("2.04"), 1_000);
        ledger
            .create(bank, &ctx, CODE, SecretCommitment::from_secret(SECRET), Decimal::from(60))
            .unwrap();
        VoucherId::from_code(CODE)
    }

    // ─── Create ───

    #[test]
    fn test_create_escrows_value_and_pays_fee() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);

        let voucher = ledger.get_voucher(&id).unwrap();
        assert_eq!(voucher.value, Decimal::from(2));
        assert_eq!(voucher.claim_deposit, Decimal::from(60));
        assert_eq!(voucher.creator.as_str(), "alice");
        assert_eq!(bank.balance_of("treasury"), dec("0.04"));
        assert_eq!(bank.balance_of("voucher-ledger"), Decimal::from(2));
        assert_eq!(bank.balance_of("alice"), dec("997.96"));
        assert_eq!(ledger.voucher_status(&id, 1_000), VoucherStatus::Unclaimed);
    }

    #[test]
    fn test_create_duplicate_rejected() {
        let (mut ledger, mut bank) = setup();
        create_default(&mut ledger, &mut bank);

        let ctx = TxContext::new("bob", Decimal::from(5), 1_001);
        let result = ledger.create(
            &mut bank,
            &ctx,
            CODE,
            SecretCommitment::from_secret(b"other"),
            Decimal::ONE,
        );
        assert!(matches!(result, Err(VoucherError::DuplicateVoucher { .. })));
        assert_eq!(bank.balance_of("bob"), Decimal::from(1_000));
    }

    #[test]
    fn test_create_below_fee_floor_rejected() {
        let (mut ledger, mut bank) = setup();
        let ctx = TxContext::new("alice", dec("0.005"), 1_000);
        let result = ledger.create(
            &mut bank,
            &ctx,
            CODE,
            SecretCommitment::from_secret(SECRET),
            Decimal::ONE,
        );
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InsufficientFunds);
        assert_eq!(ledger.voucher_status(&VoucherId::from_code(CODE), 1_000), VoucherStatus::Absent);
    }

    #[test]
    fn test_create_without_balance_rolls_back() {
        let (mut ledger, mut bank) = setup();
        let ctx = TxContext::new("nobody", Decimal::from(10), 1_000);
        let result = ledger.create(
            &mut bank,
            &ctx,
            CODE,
            SecretCommitment::from_secret(SECRET),
            Decimal::ONE,
        );
        assert!(matches!(result, Err(VoucherError::Transfer(_))));
        assert!(ledger.get_voucher(&VoucherId::from_code(CODE)).is_none());
        assert_eq!(bank.balance_of("treasury"), Decimal::ZERO);
    }

    // ─── Claim ───

    #[test]
    fn test_claim_sets_window() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);

        let ctx = TxContext::new("bob", Decimal::from(60), 2_000);
        ledger.claim(&mut bank, &ctx, &id).unwrap();

        let voucher = ledger.get_voucher(&id).unwrap();
        assert_eq!(voucher.claimed_by().unwrap().as_str(), "bob");
        assert_eq!(voucher.claim_expires_at(), Some(2_000 + PERIOD));
        assert_eq!(voucher.claim_count, 1);
        assert_eq!(bank.balance_of("voucher-ledger"), Decimal::from(62));
    }

    #[test]
    fn test_claim_wrong_deposit() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);

        for attached in [Decimal::from(59), Decimal::from(61), Decimal::ZERO] {
            let ctx = TxContext::new("bob", attached, 2_000);
            let result = ledger.claim(&mut bank, &ctx, &id);
            assert!(matches!(result, Err(VoucherError::WrongDepositAmount { .. })));
        }
        assert_eq!(ledger.voucher_status(&id, 2_000), VoucherStatus::Unclaimed);
    }

    #[test]
    fn test_claim_unknown_voucher() {
        let (mut ledger, mut bank) = setup();
        let ctx = TxContext::new("bob", Decimal::from(60), 2_000);
        let result = ledger.claim(&mut bank, &ctx, &VoucherId::from_code(b"nope"));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::VoucherNotFound);
    }

    #[test]
    fn test_claim_in_progress_until_expiry() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);
        ledger
            .claim(&mut bank, &TxContext::new("bob", Decimal::from(60), 2_000), &id)
            .unwrap();

        let carol = TxContext::new("carol", Decimal::from(60), 2_000 + PERIOD - 1);
        let err = ledger.claim(&mut bank, &carol, &id).unwrap_err();
        assert_eq!(
            err,
            VoucherError::ClaimInProgress {
                expires_at: 2_000 + PERIOD
            }
        );
        assert!(err.is_retryable());

        // Even the holder cannot extend an open window
        let bob = TxContext::new("bob", Decimal::from(60), 2_500);
        assert!(ledger.claim(&mut bank, &bob, &id).is_err());
    }

    #[test]
    fn test_reclaim_forfeits_lapsed_deposit() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);
        ledger
            .claim(&mut bank, &TxContext::new("bob", Decimal::from(60), 2_000), &id)
            .unwrap();

        let carol = TxContext::new("carol", Decimal::from(60), 2_000 + PERIOD);
        ledger.claim(&mut bank, &carol, &id).unwrap();

        let voucher = ledger.get_voucher(&id).unwrap();
        assert_eq!(voucher.claimed_by().unwrap().as_str(), "carol");
        assert_eq!(voucher.forfeited_deposit_credit, Decimal::from(12));
        assert_eq!(voucher.claim_count, 2);
        assert_eq!(bank.balance_of("treasury"), dec("48.04"));
        assert_eq!(bank.balance_of("voucher-ledger"), Decimal::from(74));

        let labels: Vec<_> = ledger.events().iter().map(|e| e.label()).collect();
        assert_eq!(
            labels,
            vec!["voucher_created", "redemption_claimed", "claim_forfeited", "redemption_claimed"]
        );
    }

    // ─── Redeem ───

    #[test]
    fn test_redeem_pays_and_deletes() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);
        ledger
            .claim(&mut bank, &TxContext::new("bob", Decimal::from(60), 2_000), &id)
            .unwrap();

        let event = ledger
            .redeem(&mut bank, &TxContext::call("bob", 2_100), &id, SECRET)
            .unwrap();
        let ContractEvent::VoucherRedeemed(redeemed) = event else {
            panic!("expected VoucherRedeemed");
        };
        assert_eq!(redeemed.payout(), Decimal::from(62));
        assert_eq!(bank.balance_of("bob"), Decimal::from(1_002));
        assert_eq!(bank.balance_of("voucher-ledger"), Decimal::ZERO);
        assert!(ledger.get_voucher(&id).is_none());

        let receipt = ledger.redemption_receipt(&id).unwrap();
        assert_eq!(receipt.receipt_id, redeemed.receipt_id);
        assert_eq!(
            ledger.voucher_status(&id, 2_100),
            VoucherStatus::Redeemed {
                receipt_id: redeemed.receipt_id
            }
        );
    }

    #[test]
    fn test_redeem_check_order() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);

        // Unclaimed: even the right secret is refused
        let err = ledger
            .redeem(&mut bank, &TxContext::call("bob", 2_000), &id, SECRET)
            .unwrap_err();
        assert_eq!(err, VoucherError::NotClaimed);

        ledger
            .claim(&mut bank, &TxContext::new("bob", Decimal::from(60), 2_000), &id)
            .unwrap();

        // Non-claimant with the right secret
        let err = ledger
            .redeem(&mut bank, &TxContext::call("carol", 2_001), &id, SECRET)
            .unwrap_err();
        assert_eq!(err, VoucherError::NotClaimed);

        // Claimant with the wrong secret
        let err = ledger
            .redeem(&mut bank, &TxContext::call("bob", 2_001), &id, b"wrong")
            .unwrap_err();
        assert_eq!(err, VoucherError::SecretMismatch);

        // Expiry is checked before the secret
        let err = ledger
            .redeem(&mut bank, &TxContext::call("bob", 2_000 + PERIOD), &id, b"wrong")
            .unwrap_err();
        assert_eq!(
            err,
            VoucherError::ClaimExpired {
                expired_at: 2_000 + PERIOD
            }
        );
        assert!(ledger.get_voucher(&id).is_some());
    }

    #[test]
    fn test_redeem_rejects_attached_value() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);
        ledger
            .claim(&mut bank, &TxContext::new("bob", Decimal::from(60), 2_000), &id)
            .unwrap();

        let ctx = TxContext::new("bob", Decimal::ONE, 2_001);
        let result = ledger.redeem(&mut bank, &ctx, &id, SECRET);
        assert!(matches!(result, Err(VoucherError::NonPayable { .. })));
        assert_eq!(bank.balance_of("bob"), Decimal::from(940));
    }

    #[test]
    fn test_redeemed_identifier_can_be_recreated() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);
        ledger
            .claim(&mut bank, &TxContext::new("bob", Decimal::from(60), 2_000), &id)
            .unwrap();
        ledger
            .redeem(&mut bank, &TxContext::call("bob", 2_001), &id, SECRET)
            .unwrap();

        let err = ledger
            .redeem(&mut bank, &TxContext::call("bob", 2_002), &id, SECRET)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VoucherNotFound);

        create_default(&mut ledger, &mut bank);
        assert_eq!(ledger.voucher_status(&id, 3_000), VoucherStatus::Unclaimed);
        assert!(ledger.redemption_receipt(&id).is_none());
    }

    // ─── Admin ───

    #[test]
    fn test_admin_operations_gated() {
        let (mut ledger, mut bank) = setup();
        assert_eq!(
            ledger.set_fee_recipient("eve", "eve"),
            Err(VoucherError::Unauthorized)
        );
        assert_eq!(
            ledger.set_creation_fee_params("eve", Decimal::ZERO, 0),
            Err(VoucherError::Unauthorized)
        );
        assert_eq!(ledger.set_claim_period("eve", 1), Err(VoucherError::Unauthorized));
        assert_eq!(
            ledger.recover_stray_funds(&mut bank, "eve", "eve", Decimal::ZERO),
            Err(VoucherError::Unauthorized)
        );
        assert_eq!(ledger.transfer_admin("eve", "eve"), Err(VoucherError::Unauthorized));
        assert_eq!(ledger.upgrade_to("eve", "evil"), Err(VoucherError::Unauthorized));

        assert_eq!(ledger.fee_recipient().as_str(), "treasury");
        assert_eq!(ledger.get_claim_period(), PERIOD);
        assert_eq!(ledger.admin().as_str(), ADMIN);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_set_fee_params_and_period() {
        let (mut ledger, _) = setup();
        ledger
            .set_creation_fee_params(ADMIN, dec("0.01"), 100)
            .unwrap();
        assert_eq!(ledger.get_fee_params(), (dec("0.01"), 100));

        let err = ledger
            .set_creation_fee_params(ADMIN, Decimal::ZERO, 10_001)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(ledger.get_fee_params(), (dec("0.01"), 100));

        ledger.set_claim_period(ADMIN, 60).unwrap();
        assert_eq!(ledger.get_claim_period(), 60);
        assert_eq!(
            ledger.set_claim_period(ADMIN, 0),
            Err(VoucherError::InvalidClaimPeriod { seconds: 0 })
        );
    }

    #[test]
    fn test_period_change_keeps_existing_expiry() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);
        ledger
            .claim(&mut bank, &TxContext::new("bob", Decimal::from(60), 2_000), &id)
            .unwrap();
        ledger.set_claim_period(ADMIN, 10).unwrap();

        let voucher = ledger.get_voucher(&id).unwrap();
        assert_eq!(voucher.claim_expires_at(), Some(2_000 + PERIOD));
    }

    #[test]
    fn test_recover_only_unencumbered() {
        let (mut ledger, mut bank) = setup();
        create_default(&mut ledger, &mut bank);
        // Direct transfer bypassing create
        bank.transfer("carol", "voucher-ledger", Decimal::from(5)).unwrap();
        assert_eq!(ledger.escrow_total(), Decimal::from(2));
        assert_eq!(ledger.unencumbered_balance(&bank), Decimal::from(5));

        let err = ledger
            .recover_stray_funds(&mut bank, ADMIN, "owner", dec("5.000000000000000001"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecovery);

        ledger
            .recover_stray_funds(&mut bank, ADMIN, "owner", Decimal::from(5))
            .unwrap();
        assert_eq!(bank.balance_of("owner"), Decimal::from(5));
        assert_eq!(bank.balance_of("voucher-ledger"), Decimal::from(2));
    }

    #[test]
    fn test_transfer_admin_and_upgrade() {
        let (mut ledger, _) = setup();
        ledger.transfer_admin(ADMIN, "new-owner").unwrap();
        assert_eq!(ledger.admin().as_str(), "new-owner");
        assert_eq!(ledger.set_claim_period(ADMIN, 5), Err(VoucherError::Unauthorized));

        ledger.upgrade_to("new-owner", "voucher-contracts/0.2.0").unwrap();
        assert_eq!(ledger.implementation(), "voucher-contracts/0.2.0");
    }

    // ─── Storage ───

    #[test]
    fn test_snapshot_restore_preserves_state() {
        let (mut ledger, mut bank) = setup();
        let id = create_default(&mut ledger, &mut bank);
        ledger
            .claim(&mut bank, &TxContext::new("bob", Decimal::from(60), 2_000), &id)
            .unwrap();

        let root = ledger.state_root().unwrap();
        let json = ledger.snapshot().to_json().unwrap();
        let mut restored = VoucherLedger::restore(LedgerSnapshot::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored.state_root().unwrap(), root);

        restored
            .redeem(&mut bank, &TxContext::call("bob", 2_001), &id, SECRET)
            .unwrap();
        assert_ne!(restored.state_root().unwrap(), root);
    }

    #[test]
    fn test_restore_rejects_other_layout() {
        let (ledger, _) = setup();
        let mut snapshot = ledger.snapshot();
        snapshot.layout_version = STORAGE_LAYOUT_VERSION + 1;
        let err = VoucherLedger::restore(snapshot).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_drain_events() {
        let (mut ledger, mut bank) = setup();
        create_default(&mut ledger, &mut bank);
        assert_eq!(ledger.drain_events().len(), 1);
        assert!(ledger.events().is_empty());
    }
}
