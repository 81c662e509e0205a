//! Simulation world: bank, ledger and clock under invariant checking
//!
//! Actors never touch the ledger directly. They propose `Action`s and the
//! world applies them one at a time, then re-checks the global invariants:
//! - currency is neither created nor destroyed by ledger operations
//! - the ledger account holds exactly the escrow plus known stray funds
//! - escrow equals inflows minus fees, forfeited shares and payouts
//! - an unexpired claim is never replaced or redeemed by someone else

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error};
use voucher_contracts::bank::Bank;
use voucher_contracts::commitment::SecretCommitment;
use voucher_contracts::config::LedgerConfig;
use voucher_contracts::errors::{BankError, ConfigError, ErrorKind, VoucherError};
use voucher_contracts::events::ContractEvent;
use voucher_contracts::ledger::{TxContext, VoucherLedger};
use voucher_contracts::voucher::Claim;
use voucher_types::fee::FeeParams;
use voucher_types::ids::{Address, VoucherId};
use voucher_types::time::Timestamp;

/// Clock value of a fresh world.
pub const GENESIS_TIME: Timestamp = 1_700_000_000;

/// One operation proposed by an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create {
        creator: Address,
        code: Vec<u8>,
        secret_commitment: SecretCommitment,
        attached: Decimal,
        claim_deposit: Decimal,
    },
    Claim {
        caller: Address,
        voucher_id: VoucherId,
        deposit: Decimal,
    },
    Redeem {
        caller: Address,
        voucher_id: VoucherId,
        secret: Vec<u8>,
    },
    Advance {
        seconds: i64,
    },
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Claim { .. } => "claim",
            Self::Redeem { .. } => "redeem",
            Self::Advance { .. } => "advance",
        }
    }
}

/// Running totals of currency moved by the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flows {
    /// Attached to creates and claims
    pub inflow: Decimal,
    pub fees: Decimal,
    /// Forfeited deposit shares paid to the fee recipient
    pub retained: Decimal,
    pub payouts: Decimal,
}

impl Flows {
    pub fn record(&mut self, event: &ContractEvent) {
        match event {
            ContractEvent::VoucherCreated(e) => {
                self.inflow += e.value + e.fee;
                self.fees += e.fee;
            }
            ContractEvent::RedemptionClaimed(e) => self.inflow += e.deposit,
            ContractEvent::ClaimForfeited(e) => self.retained += e.retained,
            ContractEvent::VoucherRedeemed(e) => self.payouts += e.payout(),
            _ => {}
        }
    }

    /// Escrow implied by the flows.
    pub fn expected_escrow(&self) -> Decimal {
        self.inflow - self.fees - self.retained - self.payouts
    }
}

/// A broken global invariant. Any of these is a ledger bug.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("Supply drift: balances sum to {balances}, supply is {supply}")]
    SupplyDrift { balances: String, supply: String },

    #[error("Escrow mismatch: ledger account holds {held}, escrow {escrow} plus stray {stray}")]
    EscrowMismatch {
        held: String,
        escrow: String,
        stray: String,
    },

    #[error("Flow mismatch: flows imply escrow {expected}, ledger reports {escrow}")]
    FlowMismatch { expected: String, escrow: String },

    #[error("Active claim on {voucher_id} was displaced before expiry")]
    ClaimDisplaced { voucher_id: String },
}

/// Simulation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Funding failed: {0}")]
    Funding(#[from] BankError),

    #[error("Admin operation failed: {0}")]
    Admin(#[from] VoucherError),

    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Result of applying one action.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub action: &'static str,
    /// Events emitted on success, the ledger's rejection otherwise
    pub result: Result<Vec<ContractEvent>, VoucherError>,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.result.as_ref().err().map(VoucherError::kind)
    }
}

/// Bank, ledger and clock.
pub struct World {
    pub ledger: VoucherLedger,
    pub bank: Bank,
    pub now: Timestamp,
    pub flows: Flows,
    /// Sent to the ledger account outside of any ledger operation
    stray: Decimal,
    events: Vec<ContractEvent>,
    steps: u64,
}

impl World {
    pub fn new(config: LedgerConfig) -> Result<Self, SimError> {
        Ok(Self {
            ledger: VoucherLedger::new(config)?,
            bank: Bank::new(),
            now: GENESIS_TIME,
            flows: Flows::default(),
            stray: Decimal::ZERO,
            events: Vec::new(),
            steps: 0,
        })
    }

    /// Mint starting balance for an actor.
    pub fn fund(&mut self, who: &Address, amount: Decimal) -> Result<(), SimError> {
        self.bank.mint(who.clone(), amount)?;
        Ok(())
    }

    /// Transfer straight into the ledger account, bypassing `create`.
    pub fn send_stray(&mut self, from: &Address, amount: Decimal) -> Result<(), SimError> {
        let contract = self.ledger.contract_address().clone();
        self.bank.transfer(from.as_str(), contract.as_str(), amount)?;
        self.stray += amount;
        Ok(())
    }

    /// Sweep all stray funds to `to` as the ledger admin.
    pub fn recover_stray(&mut self, to: &Address) -> Result<Decimal, SimError> {
        let admin = self.ledger.admin().clone();
        let amount = self.ledger.unencumbered_balance(&self.bank);
        self.ledger
            .recover_stray_funds(&mut self.bank, admin.as_str(), to.clone(), amount)?;
        self.events.extend(self.ledger.drain_events());
        self.stray -= amount;
        self.check_invariants(&HashMap::new())?;
        Ok(amount)
    }

    /// Apply one action and verify every invariant afterwards.
    ///
    /// Ledger rejections are ordinary outcomes; only an invariant violation
    /// is an error.
    pub fn step(&mut self, action: &Action) -> Result<StepOutcome, SimError> {
        let claims_before = self.active_claims();

        let result = match action {
            Action::Create {
                creator,
                code,
                secret_commitment,
                attached,
                claim_deposit,
            } => {
                let ctx = TxContext::new(creator.clone(), *attached, self.now);
                self.ledger
                    .create(&mut self.bank, &ctx, code, *secret_commitment, *claim_deposit)
                    .map(drop)
            }
            Action::Claim {
                caller,
                voucher_id,
                deposit,
            } => {
                let ctx = TxContext::new(caller.clone(), *deposit, self.now);
                self.ledger.claim(&mut self.bank, &ctx, voucher_id).map(drop)
            }
            Action::Redeem {
                caller,
                voucher_id,
                secret,
            } => {
                let ctx = TxContext::call(caller.clone(), self.now);
                self.ledger
                    .redeem(&mut self.bank, &ctx, voucher_id, secret)
                    .map(drop)
            }
            Action::Advance { seconds } => {
                self.now += *seconds;
                Ok(())
            }
        };

        let events = self.ledger.drain_events();
        for event in &events {
            self.flows.record(event);
        }
        self.events.extend(events.iter().cloned());
        self.steps += 1;

        if let Err(e) = &result {
            debug!(step = self.steps, action = action.label(), kind = ?e.kind(), "Action rejected");
        }

        self.check_invariants(&claims_before)?;

        Ok(StepOutcome {
            action: action.label(),
            result: result.map(|()| events),
        })
    }

    /// Check all global invariants against the current state.
    ///
    /// `claims_before` holds the claims that were active before the last step.
    pub fn check_invariants(
        &self,
        claims_before: &HashMap<VoucherId, Claim>,
    ) -> Result<(), InvariantViolation> {
        let balances = self.bank.sum_of_balances();
        if balances != self.bank.total_supply() {
            return Err(self.report(InvariantViolation::SupplyDrift {
                balances: balances.to_string(),
                supply: self.bank.total_supply().to_string(),
            }));
        }

        let held = self.bank.balance_of(self.ledger.contract_address().as_str());
        let escrow = self.ledger.escrow_total();
        if held != escrow + self.stray {
            return Err(self.report(InvariantViolation::EscrowMismatch {
                held: held.to_string(),
                escrow: escrow.to_string(),
                stray: self.stray.to_string(),
            }));
        }

        if self.flows.expected_escrow() != escrow {
            return Err(self.report(InvariantViolation::FlowMismatch {
                expected: self.flows.expected_escrow().to_string(),
                escrow: escrow.to_string(),
            }));
        }

        for (voucher_id, before) in claims_before {
            if self.claim_displaced(voucher_id, before) {
                return Err(self.report(InvariantViolation::ClaimDisplaced {
                    voucher_id: voucher_id.to_string(),
                }));
            }
        }
        Ok(())
    }

    fn claim_displaced(&self, voucher_id: &VoucherId, before: &Claim) -> bool {
        if let Some(voucher) = self.ledger.get_voucher(voucher_id) {
            // Lapsing by the clock is fine; replacement while active is not
            return voucher.claim.as_ref() != Some(before) && self.now < before.expires_at;
        }
        match self.ledger.redemption_receipt(voucher_id) {
            Some(receipt) => receipt.redeemer != before.claimant,
            None => true,
        }
    }

    fn report(&self, violation: InvariantViolation) -> InvariantViolation {
        error!(step = self.steps, now = self.now, %violation, "Invariant violated");
        violation
    }

    /// Claims active at the current time.
    pub fn active_claims(&self) -> HashMap<VoucherId, Claim> {
        self.ledger
            .live_vouchers()
            .filter_map(|(id, v)| v.active_claim(self.now).map(|c| (*id, c.clone())))
            .collect()
    }

    /// Creation fee parameters currently in force.
    pub fn fee_params(&self) -> FeeParams {
        let (min_creation_fee, creation_fee_rate_bps) = self.ledger.get_fee_params();
        FeeParams {
            min_creation_fee,
            creation_fee_rate_bps,
        }
    }

    /// Live voucher identifiers in a stable order.
    pub fn live_voucher_ids(&self) -> Vec<VoucherId> {
        let mut ids: Vec<VoucherId> = self.ledger.live_vouchers().map(|(id, _)| *id).collect();
        ids.sort();
        ids
    }

    /// Every event emitted so far.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn stray(&self) -> Decimal {
        self.stray
    }
}
