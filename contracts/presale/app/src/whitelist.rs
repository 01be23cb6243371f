//! Contribution gating: open, Merkle root, or an explicit allow-list.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use presale_shared::{ContractResult, PresaleError};
use scale_info::TypeInfo;
use sails_rs::prelude::*;
use sha2::{Digest, Sha256};

use crate::math;

pub type Hash = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo, Default)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum Whitelist {
    /// Anyone may contribute.
    #[default]
    Open,
    /// Contributor must present a proof for `sha256(actor_id)` under the root.
    Merkle(Hash),
    /// Contributor must be in the set.
    Listed(BTreeSet<ActorId>),
}

impl Whitelist {
    pub fn permits(&self, who: &ActorId, proof: &[Hash]) -> bool {
        match self {
            Whitelist::Open => true,
            Whitelist::Merkle(root) => verify(proof, root, &leaf_hash(who)),
            Whitelist::Listed(members) => members.contains(who),
        }
    }

    /// Returns how many addresses were newly added.
    pub fn add(&mut self, addresses: Vec<ActorId>) -> ContractResult<u32> {
        let Whitelist::Listed(members) = self else {
            return Err(PresaleError::WrongWhitelistMode);
        };
        Ok(math::count_u32(
            addresses.into_iter().filter(|a| members.insert(*a)).count(),
        ))
    }

    /// Returns how many addresses were actually removed.
    pub fn remove(&mut self, addresses: Vec<ActorId>) -> ContractResult<u32> {
        let Whitelist::Listed(members) = self else {
            return Err(PresaleError::WrongWhitelistMode);
        };
        Ok(math::count_u32(
            addresses.iter().filter(|a| members.remove(a)).count(),
        ))
    }

    pub fn set_root(&mut self, new_root: Hash) -> ContractResult<()> {
        let Whitelist::Merkle(root) = self else {
            return Err(PresaleError::WrongWhitelistMode);
        };
        *root = new_root;
        Ok(())
    }
}

pub fn leaf_hash(who: &ActorId) -> Hash {
    Sha256::digest(who.encode()).into()
}

fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

/// Sorted-pair Merkle proof check.
pub fn verify(proof: &[Hash], root: &Hash, leaf: &Hash) -> bool {
    let computed = proof.iter().fold(*leaf, |node, sibling| hash_pair(&node, sibling));
    &computed == root
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| match pair.get(1) {
            Some(right) => hash_pair(&pair[0], right),
            None => pair[0],
        })
        .collect()
}

/// Root over `leaves`, pairing in order and promoting an odd last node.
pub fn merkle_root(leaves: &[Hash]) -> Option<Hash> {
    if leaves.is_empty() {
        return None;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level.first().copied()
}

/// Proof for `leaves[index]` matching [`merkle_root`].
pub fn merkle_proof(leaves: &[Hash], mut index: usize) -> Vec<Hash> {
    let mut proof = Vec::new();
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let sibling = index ^ 1;
        if sibling < level.len() {
            proof.push(level[sibling]);
        }
        level = next_level(&level);
        index /= 2;
    }
    proof
}
