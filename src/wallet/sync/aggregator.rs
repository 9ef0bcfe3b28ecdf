//! Transaction grouping and memo reassembly.
//!
//! The engine reports one flat record per note/output, so a single logical
//! transaction (a multi-recipient send, or a long memo split across notes)
//! arrives as several entries sharing a txid. This module normalizes each
//! record, drops self-send artifacts, merges records by (txid, direction),
//! and reassembles split memos tagged `(<index>/<total>)<text>`.

use crate::engine::{RawAddress, RawNotes, RawTransaction};
use crate::utils::{format_zats, parse_zats, zats_to_zec};
use crate::wallet::types::{SyncError, Transaction, TransactionKind, TxDetail};

/// Normalize, filter, group, and sort the raw transaction list.
///
/// `addresses` and `notes` must come from the same pass as `list`; they drive
/// the sapling re-attribution of received records.
pub fn aggregate_transactions(
    list: &[RawTransaction],
    addresses: &[RawAddress],
    notes: &RawNotes,
    latest_height: u64,
) -> Result<Vec<Transaction>, SyncError> {
    let mut flat = Vec::new();
    for tx in list {
        let record = normalize_record(tx, addresses, notes, latest_height);
        // Self-sends surface as an outgoing record with no recipients; the
        // engine does not represent them well, so they are suppressed.
        if record.kind == TransactionKind::Sent
            && record.amount < 0.0
            && record.details.is_empty()
        {
            continue;
        }
        flat.push(record);
    }

    // Group by (txid, direction), preserving first-seen order.
    let mut groups: Vec<((String, TransactionKind), Vec<Transaction>)> = Vec::new();
    for record in flat {
        let key = (record.txid.clone(), record.kind);
        match groups.iter_mut().find(|(group_key, _)| *group_key == key) {
            Some((_, members)) => members.push(record),
            None => groups.push((key, vec![record])),
        }
    }

    // Merge each group into one transaction: header fields from the first
    // member, details combined across all members.
    let mut combined: Vec<Transaction> = groups
        .into_iter()
        .map(|(_, members)| {
            let mut merged = members[0].clone();
            merged.details =
                combine_tx_details(members.into_iter().flat_map(|tx| tx.details).collect());
            merged
        })
        .collect();

    combined.sort_by_key(|tx| tx.confirmations);
    Ok(combined)
}

fn normalize_record(
    tx: &RawTransaction,
    addresses: &[RawAddress],
    notes: &RawNotes,
    latest_height: u64,
) -> Transaction {
    let confirmations = if tx.unconfirmed {
        0
    } else {
        latest_height.saturating_sub(tx.block_height) + 1
    };

    // The engine keys received sapling outputs by the producing unified
    // address; re-key to the sapling receiver when this txid created an
    // unspent sapling note. Foreign or unknown addresses stay as reported.
    let counterparty = sapling_rekeyed(tx, addresses, notes).or_else(|| tx.address.clone());

    let (kind, address, details) = match &tx.outgoing_metadata {
        Some(metadata) => {
            let details: Vec<TxDetail> = metadata
                .iter()
                .map(|entry| TxDetail {
                    address: entry.address.clone(),
                    amount: format_zats(entry.value as i64),
                    memo: entry.memo.clone(),
                })
                .collect();
            let address = metadata
                .first()
                .map(|entry| entry.address.clone())
                .unwrap_or_default();
            (TransactionKind::Sent, address, combine_tx_details(details))
        }
        None => {
            let address = counterparty.unwrap_or_default();
            let details = vec![TxDetail {
                address: address.clone(),
                amount: format_zats(tx.amount),
                memo: tx.memo.clone(),
            }];
            (TransactionKind::Received, address, details)
        }
    };

    Transaction {
        txid: tx.txid.clone(),
        kind,
        address,
        amount: zats_to_zec(tx.amount),
        confirmations,
        time: tx.datetime,
        price: tx.zec_price,
        position: tx.position,
        details,
    }
}

fn sapling_rekeyed(
    tx: &RawTransaction,
    addresses: &[RawAddress],
    notes: &RawNotes,
) -> Option<String> {
    let created_here = notes
        .unspent_sapling_notes
        .iter()
        .any(|note| note.created_in_txid.as_deref() == Some(tx.txid.as_str()));
    if !created_here {
        return None;
    }
    addresses
        .iter()
        .find(|entry| Some(entry.address.as_str()) == tx.address.as_deref())
        .and_then(|entry| entry.receivers.sapling.clone())
}

/// Combine details addressed to the same counterparty: sum the amounts with
/// fixed-point arithmetic and reassemble split memos.
///
/// A memo tagged `(<index>/<total>)` sorts by its index; untagged memos take
/// index 0; ties keep input order. The surviving texts concatenate into one
/// memo, absent when nothing remains.
pub fn combine_tx_details(details: Vec<TxDetail>) -> Vec<TxDetail> {
    // Group by counterparty address, preserving first-seen order.
    let mut groups: Vec<(String, Vec<TxDetail>)> = Vec::new();
    for detail in details {
        match groups.iter_mut().find(|(address, _)| *address == detail.address) {
            Some((_, members)) => members.push(detail),
            None => groups.push((detail.address.clone(), vec![detail])),
        }
    }

    groups
        .into_iter()
        .map(|(address, members)| {
            let total: i64 = members
                .iter()
                .map(|detail| parse_zats(&detail.amount).unwrap_or(0))
                .sum();

            let mut segments: Vec<(u64, String)> = members
                .into_iter()
                .filter_map(|detail| detail.memo)
                .map(|memo| split_memo_tag(&memo))
                .collect();
            segments.sort_by_key(|(index, _)| *index);
            let memo: String = segments.into_iter().map(|(_, text)| text).collect();

            TxDetail {
                address,
                amount: format_zats(total),
                memo: if memo.is_empty() { None } else { Some(memo) },
            }
        })
        .collect()
}

/// Split a `(<index>/<total>)<text>` memo into its index and text. Memos
/// without a well-formed leading tag keep their whole text at index 0.
fn split_memo_tag(memo: &str) -> (u64, String) {
    if let Some(rest) = memo.strip_prefix('(') {
        if let Some((tag, text)) = rest.split_once(')') {
            if let Some((index, total)) = tag.split_once('/') {
                let all_digits =
                    |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
                if all_digits(index) && all_digits(total) {
                    if let Ok(index) = index.parse::<u64>() {
                        return (index, text.to_string());
                    }
                }
            }
        }
    }
    (0, memo.to_string())
}
