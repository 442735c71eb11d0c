//! Transfer pipeline - local keypair → connected wallet, one instruction.
//!
//! Steps run strictly in order, each awaiting the previous:
//!
//! 1. read both parties (missing → `MissingParty`, nothing sent)
//! 2. fetch a recent blockhash
//! 3. build the transfer, fee payer = sender, sign locally
//! 4. re-read both parties (a disconnect may have landed during step 2)
//! 5. submit and confirm
//! 6. report balances, best effort
//!
//! Once step 5 has started the transfer is not abortable; a disconnect or
//! account switch after that only makes step 6 report the recipient as unknown.

use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::account::LocalAccount;
use crate::core::{format_sol, LAMPORTS_PER_SOL};
use crate::error::{Party, ReportingError, TransferError};
use crate::rpc::ClusterRpc;

/// Amount sent by each transfer (1 SOL).
pub const TRANSFER_LAMPORTS: u64 = LAMPORTS_PER_SOL;

/// Live view of who is sending and who is receiving. Read at call time and
/// again right before submission, never cached.
pub trait TransferParties {
    fn sender(&self) -> Option<LocalAccount>;
    fn recipient(&self) -> Option<Pubkey>;
}

/// Recipient side of a balance report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientBalance {
    Known { pubkey: Pubkey, lamports: Option<u64> },
    /// The wallet disconnected or switched accounts before reporting.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    pub sender: Option<u64>,
    pub recipient: RecipientBalance,
}

#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub signature: Signature,
    pub lamports: u64,
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub report: BalanceReport,
}

/// Build and sign a single system transfer paid for by `sender`.
pub fn build_transfer(
    sender: &LocalAccount,
    recipient: &Pubkey,
    lamports: u64,
    blockhash: Hash,
) -> Result<Transaction, TransferError> {
    let payer = sender.pubkey();
    let instruction = system_instruction::transfer(&payer, recipient, lamports);
    let mut transaction = Transaction::new_with_payer(&[instruction], Some(&payer));
    transaction
        .try_sign(&[sender.keypair()], blockhash)
        .map_err(|e| TransferError::Signing(e.to_string()))?;
    Ok(transaction)
}

pub struct TransferPipeline<R> {
    rpc: Arc<R>,
}

impl<R: ClusterRpc> TransferPipeline<R> {
    pub fn new(rpc: Arc<R>) -> Self {
        Self { rpc }
    }

    pub async fn transfer<T>(&self, lamports: u64, parties: &T) -> Result<TransferReceipt, TransferError>
    where
        T: TransferParties + ?Sized,
    {
        let (sender, recipient) = require_parties(parties)?;

        let blockhash = self.rpc.latest_blockhash().await.map_err(|e| {
            error!(error = %e, "Could not fetch a recent blockhash");
            TransferError::Submission(e)
        })?;
        let transaction = build_transfer(&sender, &recipient, lamports, blockhash)?;

        let (sender_now, recipient_now) = require_parties(parties)?;
        if sender_now.pubkey() != sender.pubkey() {
            error!("Local keypair replaced before submission");
            return Err(TransferError::MissingParty(Party::Sender));
        }
        if recipient_now != recipient {
            error!(expected = %recipient, current = %recipient_now, "Wallet account changed before submission");
            return Err(TransferError::MissingParty(Party::Recipient));
        }

        let signature = self.rpc.send_and_confirm(&transaction).await.map_err(|e| {
            error!(error = %e, "Error transferring SOL");
            TransferError::from(e)
        })?;
        info!(
            signature = %signature,
            from = %sender.pubkey(),
            to = %recipient,
            amount = %format_sol(lamports),
            "Transfer confirmed"
        );

        // Only report on the wallet that was paid, and only while it is still connected.
        let still_connected = parties.recipient().filter(|current| *current == recipient);
        let report = self.report(&sender, still_connected).await;
        Ok(TransferReceipt { signature, lamports, sender: sender.pubkey(), recipient, report })
    }

    /// Post-transfer balances. Failures are logged and left out of the report.
    pub async fn report(&self, sender: &LocalAccount, recipient: Option<Pubkey>) -> BalanceReport {
        let sender_balance = match self.rpc.get_balance(&sender.pubkey()).await {
            Ok(lamports) => {
                info!(pubkey = %sender.pubkey(), balance = %format_sol(lamports), "Sender balance");
                Some(lamports)
            }
            Err(source) => {
                let err = ReportingError { party: Party::Sender, source };
                warn!(error = %err, "Balance report incomplete");
                None
            }
        };

        let recipient = match recipient {
            None => {
                info!("Receiver balance: unknown recipient");
                RecipientBalance::Unknown
            }
            Some(pubkey) => {
                let lamports = match self.rpc.get_balance(&pubkey).await {
                    Ok(lamports) => {
                        info!(pubkey = %pubkey, balance = %format_sol(lamports), "Receiver balance");
                        Some(lamports)
                    }
                    Err(source) => {
                        let err = ReportingError { party: Party::Recipient, source };
                        warn!(error = %err, "Balance report incomplete");
                        None
                    }
                };
                RecipientBalance::Known { pubkey, lamports }
            }
        };

        BalanceReport { sender: sender_balance, recipient }
    }
}

fn require_parties<T: TransferParties + ?Sized>(parties: &T) -> Result<(LocalAccount, Pubkey), TransferError> {
    let Some(sender) = parties.sender() else {
        error!("Sender keypair missing");
        return Err(TransferError::MissingParty(Party::Sender));
    };
    let Some(recipient) = parties.recipient() else {
        error!("Receiver public key missing");
        return Err(TransferError::MissingParty(Party::Recipient));
    };
    Ok((sender, recipient))
}
