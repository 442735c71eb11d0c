//! Provisioning Tests: fresh keypair, airdrop, confirmation
//!
//! These tests verify:
//! 1. A provisioned keypair is funded before it is published
//! 2. Failed funding or confirmation publishes nothing and is not retried
//! 3. Re-provisioning replaces the keypair only on success

mod common;

use common::{bridge, Faults, MemoryLedger, Script};
use solbridge::{AccountProvisioner, ClusterRpc, ProvisioningError, RpcError, FUNDING_LAMPORTS};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// Scenario: provision succeeds and the balance is visible before any transfer
#[tokio::test]
async fn provisioned_account_is_funded() {
    let ledger = MemoryLedger::new();
    let bridge = bridge(&Script::approving(Pubkey::new_unique()), &ledger);
    assert_eq!(bridge.local_public_key(), None);

    let pubkey = bridge.provision().await.unwrap();

    assert_eq!(bridge.local_public_key(), Some(pubkey));
    assert!(ledger.get_balance(&pubkey).await.unwrap() >= 2_000_000_000);
    assert_eq!(FUNDING_LAMPORTS, 2_000_000_000);
    assert_eq!(ledger.airdrops(), 1);
}

#[tokio::test]
async fn provisioning_does_not_need_a_wallet() {
    let ledger = MemoryLedger::new();
    let bridge = bridge(&Script::absent(), &ledger);
    assert!(bridge.provision().await.is_ok());
}

#[tokio::test]
async fn failed_airdrop_publishes_nothing() {
    let ledger = MemoryLedger::new();
    ledger.set_faults(Faults { airdrop: true, ..Faults::default() });
    let bridge = bridge(&Script::absent(), &ledger);

    let err = bridge.provision().await.unwrap_err();
    assert!(matches!(err, ProvisioningError::FundingRequest(RpcError::Node { .. })));
    assert_eq!(bridge.local_public_key(), None);
    // One attempt, no retry.
    assert_eq!(ledger.calls(), 1);
}

#[tokio::test]
async fn unconfirmed_airdrop_publishes_nothing() {
    let ledger = MemoryLedger::new();
    ledger.set_faults(Faults { confirmation: true, ..Faults::default() });
    let bridge = bridge(&Script::absent(), &ledger);

    let err = bridge.provision().await.unwrap_err();
    assert!(matches!(err, ProvisioningError::Confirmation(RpcError::Timeout { .. })));
    assert_eq!(bridge.local_public_key(), None);
    assert_eq!(ledger.calls(), 2);
}

#[tokio::test]
async fn reprovision_replaces_account() {
    let ledger = MemoryLedger::new();
    let bridge = bridge(&Script::absent(), &ledger);

    let first = bridge.provision().await.unwrap();
    let second = bridge.provision().await.unwrap();
    assert_ne!(first, second);
    assert_eq!(bridge.local_public_key(), Some(second));
}

#[tokio::test]
async fn failed_reprovision_keeps_previous_account() {
    let ledger = MemoryLedger::new();
    let bridge = bridge(&Script::absent(), &ledger);
    let first = bridge.provision().await.unwrap();

    ledger.set_faults(Faults { airdrop: true, ..Faults::default() });
    assert!(bridge.provision().await.is_err());
    assert_eq!(bridge.local_public_key(), Some(first));
}

#[tokio::test]
async fn balance_lookup_failure_does_not_fail_provisioning() {
    let ledger = MemoryLedger::new();
    ledger.set_faults(Faults { balance: true, ..Faults::default() });
    let provisioner = AccountProvisioner::new(Arc::clone(&ledger));

    let account = provisioner.provision().await.unwrap();
    assert_eq!(ledger.balance(&account.pubkey()), FUNDING_LAMPORTS);
}

#[tokio::test]
async fn debug_output_hides_the_secret() {
    let ledger = MemoryLedger::new();
    let account = AccountProvisioner::new(ledger).provision().await.unwrap();
    let shown = format!("{account:?}");
    assert!(shown.contains(&account.pubkey().to_string()));
    assert!(!shown.contains("secret"));
}
