use std::collections::HashMap;

use super::chain::Ledger;

/// A broken cross reference in a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    NonContiguousId { position: usize, id: u64 },
    BrokenParentLink { id: u64 },
    ParentLinksToBlock { id: u64 },
    UnknownTransaction { block_id: u64, hash: String },
    DuplicateAssignment { hash: String },
    BlockIdMismatch { hash: String, expected: u64, found: Option<u64> },
    MissingFromBlock { hash: String, block_id: u64 },
    TimestampAfterBlock { hash: String, block_id: u64 },
}

impl std::fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IntegrityViolation::NonContiguousId { position, id } => {
                write!(f, "Block at position {} has id {}", position, id)
            }
            IntegrityViolation::BrokenParentLink { id } => {
                write!(f, "Block {} does not link to block {}", id, id.wrapping_sub(1))
            }
            IntegrityViolation::ParentLinksToBlock { id } => {
                write!(f, "Block {} has a parent hash that belongs to another block", id)
            }
            IntegrityViolation::UnknownTransaction { block_id, hash } => {
                write!(f, "Block {} lists unknown transaction {}", block_id, hash)
            }
            IntegrityViolation::DuplicateAssignment { hash } => {
                write!(f, "Transaction {} is listed by more than one block", hash)
            }
            IntegrityViolation::BlockIdMismatch {
                hash,
                expected,
                found,
            } => write!(
                f,
                "Transaction {} is listed by block {} but records {:?}",
                hash, expected, found
            ),
            IntegrityViolation::MissingFromBlock { hash, block_id } => {
                write!(f, "Transaction {} claims block {} which does not list it", hash, block_id)
            }
            IntegrityViolation::TimestampAfterBlock { hash, block_id } => {
                write!(f, "Transaction {} is newer than its block {}", hash, block_id)
            }
        }
    }
}

/// Block ids run `0..n` in storage order and every block after the first
/// links to its predecessor. Block 0's parent must not be any block's hash.
pub fn validate_block_links(ledger: &Ledger) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();

    for (position, block) in ledger.blocks.iter().enumerate() {
        if block.id != position as u64 {
            violations.push(IntegrityViolation::NonContiguousId {
                position,
                id: block.id,
            });
        }

        if position == 0 {
            if ledger.blocks.iter().any(|other| other.hash == block.parent_hash) {
                violations.push(IntegrityViolation::ParentLinksToBlock { id: block.id });
            }
        } else if ledger.blocks[position - 1].hash != block.parent_hash {
            violations.push(IntegrityViolation::BrokenParentLink { id: block.id });
        }
    }

    violations
}

/// Every listed transaction exists, records the listing block and is listed
/// only once; every assigned transaction is listed by its block and is not
/// newer than it.
pub fn validate_transaction_assignment(ledger: &Ledger) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();
    let by_hash: HashMap<&str, _> = ledger
        .transactions
        .iter()
        .map(|tx| (tx.hash.as_str(), tx))
        .collect();
    let mut listed: HashMap<&str, u64> = HashMap::new();

    for block in &ledger.blocks {
        for hash in &block.transaction_hashes {
            if listed.insert(hash.as_str(), block.id).is_some() {
                violations.push(IntegrityViolation::DuplicateAssignment { hash: hash.clone() });
            }

            match by_hash.get(hash.as_str()) {
                None => violations.push(IntegrityViolation::UnknownTransaction {
                    block_id: block.id,
                    hash: hash.clone(),
                }),
                Some(tx) if tx.block_id != Some(block.id) => {
                    violations.push(IntegrityViolation::BlockIdMismatch {
                        hash: hash.clone(),
                        expected: block.id,
                        found: tx.block_id,
                    })
                }
                Some(_) => {}
            }
        }
    }

    for tx in &ledger.transactions {
        let Some(block_id) = tx.block_id else {
            continue;
        };

        match ledger.block(block_id) {
            Some(block) if block.contains_transaction(&tx.hash) => {
                if tx.timestamp > block.timestamp {
                    violations.push(IntegrityViolation::TimestampAfterBlock {
                        hash: tx.hash.clone(),
                        block_id,
                    });
                }
            }
            _ => violations.push(IntegrityViolation::MissingFromBlock {
                hash: tx.hash.clone(),
                block_id,
            }),
        }
    }

    violations
}

pub fn validate_ledger(ledger: &Ledger) -> Vec<IntegrityViolation> {
    let mut violations = validate_block_links(ledger);
    violations.extend(validate_transaction_assignment(ledger));
    violations
}
