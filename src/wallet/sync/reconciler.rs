//! Balance and address reconciliation.
//!
//! The engine reports addresses as unified entries with per-pool receivers,
//! and keys sapling notes and transparent UTXOs by the unified address that
//! produced them. The UI schema wants one record per (address, pool) with the
//! balance attributed to the receiver string itself. This module re-keys the
//! note inventory accordingly and derives per-address balances from it.

use crate::engine::{RawAddress, RawBalance, RawNotes};
use crate::utils::zats_to_zec;
use crate::wallet::types::{AddressRecord, Balance, NoteOrUtxo, PoolType, SyncError};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// Output of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub balance: Balance,
    pub with_balance: Vec<AddressRecord>,
    pub all_addresses: Vec<AddressRecord>,
}

/// Build the uniform pool-tagged note/UTXO view.
///
/// Orchard notes stay keyed by their unified address. Sapling notes and
/// transparent UTXOs are re-keyed to the matching receiver string from the
/// address inventory; a note that cannot be re-keyed is a data-integrity
/// failure, never silently dropped.
pub fn note_inventory(
    addresses: &[RawAddress],
    notes: &RawNotes,
) -> Result<Vec<NoteOrUtxo>, SyncError> {
    let collections = [
        (&notes.unspent_orchard_notes, PoolType::Unified, false),
        (&notes.pending_orchard_notes, PoolType::Unified, true),
        (&notes.unspent_sapling_notes, PoolType::Sapling, false),
        (&notes.pending_sapling_notes, PoolType::Sapling, true),
        (&notes.utxos, PoolType::Transparent, false),
        (&notes.pending_utxos, PoolType::Transparent, true),
    ];

    let mut inventory = Vec::new();
    for (collection, pool, pending) in collections {
        for note in collection {
            let address = match pool {
                PoolType::Unified => note.address.clone(),
                _ => resolve_receiver(addresses, &note.address, pool)?,
            };
            inventory.push(NoteOrUtxo {
                address,
                pool,
                value: note.value,
                spendable: note.spendable,
                pending,
                created_in_txid: note.created_in_txid.clone(),
            });
        }
    }
    Ok(inventory)
}

/// Look up the single-pool receiver string for a note keyed by its unified
/// address.
pub fn resolve_receiver(
    addresses: &[RawAddress],
    note_address: &str,
    pool: PoolType,
) -> Result<String, SyncError> {
    let entry = addresses
        .iter()
        .find(|a| a.address == note_address)
        .ok_or_else(|| {
            SyncError::Reconciliation(format!(
                "note attributed to unknown address {}",
                note_address
            ))
        })?;

    let receiver = match pool {
        PoolType::Unified => Some(note_address),
        PoolType::Sapling => entry.receivers.sapling.as_deref(),
        PoolType::Transparent => entry.receivers.transparent.as_deref(),
    };

    receiver.map(str::to_string).ok_or_else(|| {
        SyncError::Reconciliation(format!(
            "address {} has no {:?} receiver for its note",
            note_address, pool
        ))
    })
}

/// Reconcile raw balance, address, and note responses into the normalized
/// balance snapshot plus the two address lists.
///
/// The inputs must come from the same pass; the scheduler fetches all three
/// before calling in, so the views are mutually consistent.
pub fn reconcile(
    balance: &RawBalance,
    addresses: &[RawAddress],
    notes: &RawNotes,
) -> Result<Reconciled, SyncError> {
    let inventory = note_inventory(addresses, notes)?;

    let attributed: HashMap<(PoolType, &str), u64> = inventory
        .iter()
        .map(|n| ((n.pool, n.address.as_str()), n.value))
        .into_grouping_map()
        .sum();

    let pending: HashSet<(PoolType, &str)> = inventory
        .iter()
        .filter(|n| n.pending)
        .map(|n| (n.pool, n.address.as_str()))
        .collect();

    // Pool-major ordering: every unified record, then sapling, then transparent.
    let mut all_addresses = Vec::new();
    for entry in addresses {
        if entry.receivers.orchard_exists {
            all_addresses.push(build_record(
                entry.address.clone(),
                PoolType::Unified,
                serde_json::to_string(&entry.receivers).ok(),
                &attributed,
                &pending,
            ));
        }
    }
    for entry in addresses {
        if let Some(sapling) = &entry.receivers.sapling {
            all_addresses.push(build_record(
                sapling.clone(),
                PoolType::Sapling,
                None,
                &attributed,
                &pending,
            ));
        }
    }
    for entry in addresses {
        if let Some(transparent) = &entry.receivers.transparent {
            all_addresses.push(build_record(
                transparent.clone(),
                PoolType::Transparent,
                None,
                &attributed,
                &pending,
            ));
        }
    }

    let with_balance = all_addresses
        .iter()
        .filter(|record| record.balance > 0.0)
        .cloned()
        .collect();

    Ok(Reconciled {
        balance: Balance::from_raw(balance),
        with_balance,
        all_addresses,
    })
}

fn build_record(
    address: String,
    pool: PoolType,
    receivers: Option<String>,
    attributed: &HashMap<(PoolType, &str), u64>,
    pending: &HashSet<(PoolType, &str)>,
) -> AddressRecord {
    let zats = attributed
        .get(&(pool, address.as_str()))
        .copied()
        .unwrap_or(0);
    let contains_pending = pending.contains(&(pool, address.as_str()));
    AddressRecord {
        address,
        pool,
        receivers,
        balance: zats_to_zec(zats as i64),
        contains_pending,
    }
}
