//! Voucher Lifecycle Tests
//!
//! End-to-end flows through the public ledger API:
//! - Create / claim / redeem happy path
//! - Expiry, reclaim and the forfeited deposit bonus
//! - Claim contention
//! - Fee formula and minimum fee floor
//! - Admin reconfiguration between operations

use rust_decimal::Decimal;
use voucher_contracts::bank::Bank;
use voucher_contracts::commitment::SecretCommitment;
use voucher_contracts::config::LedgerConfig;
use voucher_contracts::errors::{ErrorKind, VoucherError};
use voucher_contracts::events::ContractEvent;
use voucher_contracts::ledger::{TxContext, VoucherLedger};
use voucher_contracts::voucher::VoucherStatus;
use voucher_types::fee::FeeParams;
use voucher_types::ids::VoucherId;

const ADMIN: &str = "owner";
const TREASURY: &str = "treasury";
const LEDGER: &str = "voucher-ledger";
const PERIOD: i64 = 100_000;
const T0: i64 = 1_700_000_000;

const CODE: &[u8] = b"abcd-defg-5112-954J";

// ═══════════════════════════════════════════════════════════════════
// Happy path
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_claim_and_redeem_before_expiry() {
    let (mut ledger, mut bank) = setup();
    let id = create_voucher(&mut ledger, &mut bank);
    assert_eq!(ledger.get_voucher(&id).unwrap().value, Decimal::from(2));

    ledger
        .claim(&mut bank, &TxContext::new("redeemer", Decimal::from(60), T0 + 10), &id)
        .unwrap();
    let before = bank.balance_of("redeemer");

    let event = ledger
        .redeem(&mut bank, &TxContext::call("redeemer", T0 + 20), &id, b"S")
        .unwrap();

    let payout = bank.balance_of("redeemer") - before;
    assert_eq!(payout, Decimal::from(2 + 60));
    match event {
        ContractEvent::VoucherRedeemed(e) => {
            assert_eq!(e.value, Decimal::from(2));
            assert_eq!(e.deposit_refund, Decimal::from(60));
            assert_eq!(e.bonus, Decimal::ZERO);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(ledger.get_voucher(&id).is_none());
    assert_eq!(bank.balance_of(LEDGER), Decimal::ZERO);
}

// ═══════════════════════════════════════════════════════════════════
// Expiry and reclaim
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_expired_claim_reclaim_pays_bonus() {
    let (mut ledger, mut bank) = setup();
    let id = create_voucher(&mut ledger, &mut bank);

    ledger
        .claim(&mut bank, &TxContext::new("redeemer", Decimal::from(60), T0), &id)
        .unwrap();

    let lapsed = T0 + PERIOD;
    let err = ledger
        .redeem(&mut bank, &TxContext::call("redeemer", lapsed), &id, b"S")
        .unwrap_err();
    assert_eq!(err, VoucherError::ClaimExpired { expired_at: lapsed });
    assert!(matches!(
        ledger.voucher_status(&id, lapsed),
        VoucherStatus::Expired { .. }
    ));

    ledger
        .claim(&mut bank, &TxContext::new("redeemer", Decimal::from(60), lapsed), &id)
        .unwrap();
    let before = bank.balance_of("redeemer");
    ledger
        .redeem(&mut bank, &TxContext::call("redeemer", lapsed + 1), &id, b"S")
        .unwrap();

    assert_eq!(bank.balance_of("redeemer") - before, Decimal::from(2 + 60 + 12));
    // 80% of the forfeited deposit went to the fee recipient
    assert_eq!(bank.balance_of(TREASURY), dec("0.04") + Decimal::from(48));
}

#[test]
fn test_bonus_accumulates_over_several_lapses() {
    let (mut ledger, mut bank) = setup();
    let id = create_voucher(&mut ledger, &mut bank);

    let mut now = T0;
    for _ in 0..3 {
        ledger
            .claim(&mut bank, &TxContext::new("rival", Decimal::from(60), now), &id)
            .unwrap();
        now += PERIOD;
    }
    assert_eq!(
        ledger.get_voucher(&id).unwrap().forfeited_deposit_credit,
        Decimal::from(24)
    );

    ledger
        .claim(&mut bank, &TxContext::new("redeemer", Decimal::from(60), now), &id)
        .unwrap();
    let event = ledger
        .redeem(&mut bank, &TxContext::call("redeemer", now + 1), &id, b"S")
        .unwrap();
    let ContractEvent::VoucherRedeemed(e) = event else {
        panic!("expected VoucherRedeemed");
    };
    assert_eq!(e.bonus, Decimal::from(36));
    assert_eq!(e.payout(), Decimal::from(2 + 60 + 36));
}

#[test]
fn test_expiry_boundary() {
    let (mut ledger, mut bank) = setup();
    let id = create_voucher(&mut ledger, &mut bank);
    ledger
        .claim(&mut bank, &TxContext::new("redeemer", Decimal::from(60), T0), &id)
        .unwrap();
    let expires_at = T0 + PERIOD;

    // Just before expiry the window is still exclusive
    let err = ledger
        .claim(&mut bank, &TxContext::new("rival", Decimal::from(60), expires_at - 10), &id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClaimInProgress);

    // At expiry it is open to anyone
    ledger
        .claim(&mut bank, &TxContext::new("rival", Decimal::from(60), expires_at), &id)
        .unwrap();
    assert_eq!(
        ledger.get_voucher(&id).unwrap().claimed_by().unwrap().as_str(),
        "rival"
    );
}

// ═══════════════════════════════════════════════════════════════════
// Contention
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_second_claimant_gets_claim_in_progress() {
    let (mut ledger, mut bank) = setup();
    let id = create_voucher(&mut ledger, &mut bank);

    ledger
        .claim(&mut bank, &TxContext::new("redeemer", Decimal::from(60), T0), &id)
        .unwrap();
    let err = ledger
        .claim(&mut bank, &TxContext::new("rival", Decimal::from(60), T0 + 1), &id)
        .unwrap_err();

    assert_eq!(
        err,
        VoucherError::ClaimInProgress {
            expires_at: T0 + PERIOD
        }
    );
    assert!(err.is_retryable());
    assert_eq!(bank.balance_of("rival"), Decimal::from(10_000));
}

#[test]
fn test_rival_with_secret_cannot_redeem() {
    let (mut ledger, mut bank) = setup();
    let id = create_voucher(&mut ledger, &mut bank);
    ledger
        .claim(&mut bank, &TxContext::new("redeemer", Decimal::from(60), T0), &id)
        .unwrap();

    let err = ledger
        .redeem(&mut bank, &TxContext::call("rival", T0 + 1), &id, b"S")
        .unwrap_err();
    assert_eq!(err, VoucherError::NotClaimed);
    assert!(!err.is_retryable());
}

// ═══════════════════════════════════════════════════════════════════
// Fees
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_grossed_up_amount_stores_exact_value() {
    let (mut ledger, mut bank) = setup();
    let params = FeeParams::default();
    let value = dec("123.456");
    let attached = params.gross_up(value).unwrap();

    ledger
        .create(
            &mut bank,
            &TxContext::new("creator", attached, T0),
            b"gross-up",
            SecretCommitment::from_secret(b"S"),
            Decimal::ONE,
        )
        .unwrap();

    let voucher = ledger.get_voucher(&VoucherId::from_code(b"gross-up")).unwrap();
    assert_eq!(voucher.value, value);
    assert_eq!(bank.balance_of(TREASURY), value * params.rate());
}

#[test]
fn test_minimum_fee_floor() {
    let (mut ledger, mut bank) = setup();
    let attached = dec("0.1");

    ledger
        .create(
            &mut bank,
            &TxContext::new("creator", attached, T0),
            b"small",
            SecretCommitment::from_secret(b"S"),
            Decimal::ONE,
        )
        .unwrap();
    let voucher = ledger.get_voucher(&VoucherId::from_code(b"small")).unwrap();
    assert_eq!(voucher.value, attached - dec("0.005"));

    let err = ledger
        .create(
            &mut bank,
            &TxContext::new("creator", dec("0.004"), T0),
            b"too-small",
            SecretCommitment::from_secret(b"S"),
            Decimal::ONE,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
}

#[test]
fn test_fee_change_applies_to_later_vouchers_only() {
    let (mut ledger, mut bank) = setup();
    let id = create_voucher(&mut ledger, &mut bank);

    ledger.set_creation_fee_params(ADMIN, dec("1"), 0).unwrap();
    assert_eq!(ledger.get_voucher(&id).unwrap().value, Decimal::from(2));

    ledger
        .create(
            &mut bank,
            &TxContext::new("creator", Decimal::from(3), T0),
            b"later",
            SecretCommitment::from_secret(b"S"),
            Decimal::ONE,
        )
        .unwrap();
    let later = ledger.get_voucher(&VoucherId::from_code(b"later")).unwrap();
    assert_eq!(later.value, Decimal::from(2));
}

#[test]
fn test_fee_recipient_change_redirects_fees() {
    let (mut ledger, mut bank) = setup();
    ledger.set_fee_recipient(ADMIN, "new-treasury").unwrap();
    create_voucher(&mut ledger, &mut bank);

    assert_eq!(bank.balance_of(TREASURY), Decimal::ZERO);
    assert_eq!(bank.balance_of("new-treasury"), dec("0.04"));
}

#[test]
fn test_events_follow_lifecycle() {
    let (mut ledger, mut bank) = setup();
    let id = create_voucher(&mut ledger, &mut bank);
    ledger
        .claim(&mut bank, &TxContext::new("redeemer", Decimal::from(60), T0), &id)
        .unwrap();
    ledger
        .redeem(&mut bank, &TxContext::call("redeemer", T0 + 1), &id, b"S")
        .unwrap();

    let events = ledger.drain_events();
    let labels: Vec<_> = events.iter().map(|e| e.label()).collect();
    assert_eq!(
        labels,
        vec!["voucher_created", "redemption_claimed", "voucher_redeemed"]
    );
    assert!(events.iter().all(|e| e.voucher_id() == Some(id)));
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn setup() -> (VoucherLedger, Bank) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let config = LedgerConfig::new(ADMIN)
        .with_fee_recipient(TREASURY)
        .with_claim_period(PERIOD);
    let ledger = VoucherLedger::new(config).unwrap();
    let mut bank = Bank::new();
    for who in ["creator", "redeemer", "rival"] {
        bank.mint(who, Decimal::from(10_000)).unwrap();
    }
    (ledger, bank)
}

/// Creates a voucher worth exactly 2 with a claim deposit of 60.
fn create_voucher(
    ledger: &mut VoucherLedger,
    bank: &mut Bank,
) -> VoucherId {
    let params = FeeParams::default();
    let attached = params.gross_up(Decimal::from(2)).unwrap();
    ledger
        .create(
            bank,
            &TxContext::new("creator", attached, T0),
            CODE,
            SecretCommitment::from_secret(b"S"),
            Decimal::from(60),
        )
        .unwrap();
    VoucherId::from_code(CODE)
}
