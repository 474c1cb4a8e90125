// === blockchain.rs ===

use p256::ecdsa::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::cryptography::{self, hash_json, verify_pow};
use crate::transaction::Transaction;
use crate::utils;

pub const MINING_DIFFICULTY: usize = 3;
pub const MINING_SENDER: &str = "THE BLOCKCHAIN";
pub const MINING_REWARD: f32 = 1.0;
pub const MINING_TIMER_SEC: u64 = 20;
pub const NEIGHBOR_SYNC_TIME_SEC: u64 = 20;
pub const BLOCKCHAIN_PORT_RANGE_START: u16 = 5000;
pub const BLOCKCHAIN_PORT_RANGE_END: u16 = 5003;
pub const NEIGHBOR_IP_RANGE_START: u8 = 0;
pub const NEIGHBOR_IP_RANGE_END: u8 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub timestamp: i64,
    pub nonce: u64,
    #[serde(with = "cryptography::hex_digest")]
    pub previous_hash: [u8; 32],
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(nonce: u64, previous_hash: [u8; 32], transactions: Vec<Transaction>) -> Self {
        Block {
            timestamp: utils::now_nanos(),
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// SHA-256 of the block's canonical JSON form.
    pub fn hash(&self) -> [u8; 32] {
        hash_json(self)
    }
}

/// Wire form of the chain, as served by `GET /chain` and consumed during
/// conflict resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
}

pub struct Blockchain {
    transaction_pool: Vec<Transaction>,
    chain: Vec<Block>,
    blockchain_address: String,
    port: u16,
    enforce_balance: bool,
}

impl Blockchain {
    pub fn new(blockchain_address: &str, port: u16, enforce_balance: bool) -> Self {
        let mut bc = Blockchain {
            transaction_pool: Vec::new(),
            chain: Vec::new(),
            blockchain_address: blockchain_address.to_string(),
            port,
            enforce_balance,
        };
        // The genesis block links to the hash of an all-default block.
        bc.create_block(0, Block::default().hash());
        bc
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn transaction_pool(&self) -> &[Transaction] {
        &self.transaction_pool
    }

    pub fn blockchain_address(&self) -> &str {
        &self.blockchain_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn last_block(&self) -> &Block {
        self.chain.last().expect("chain holds at least the genesis block")
    }

    pub fn create_block(&mut self, nonce: u64, previous_hash: [u8; 32]) {
        let transactions = std::mem::take(&mut self.transaction_pool);
        self.chain.push(Block::new(nonce, previous_hash, transactions));
    }

    pub fn clear_transaction_pool(&mut self) {
        self.transaction_pool.clear();
    }

    /// Admits a transaction into the pool. Mining-reward transactions skip
    /// verification; everything else must carry a valid signature and, when
    /// balance enforcement is on, sufficient funds.
    pub fn add_transaction(
        &mut self,
        sender: &str,
        recipient: &str,
        value: f32,
        public_key: Option<&VerifyingKey>,
        signature: Option<&Signature>,
    ) -> bool {
        let transaction = Transaction::new(sender, recipient, value);

        if sender == MINING_SENDER {
            self.transaction_pool.push(transaction);
            return true;
        }

        let verified = match (public_key, signature) {
            (Some(pk), Some(sig)) => cryptography::verify_transaction(pk, sig, &transaction),
            _ => false,
        };
        if !verified {
            eprintln!("⚠️ rejected transaction: signature does not verify");
            return false;
        }

        if self.enforce_balance && self.calculate_total_amount(sender) < value {
            eprintln!("⚠️ rejected transaction: not enough balance in wallet");
            return false;
        }

        self.transaction_pool.push(transaction);
        true
    }

    /// Value-copies of the pending pool, handed to the proof-of-work search.
    pub fn copy_transaction_pool(&self) -> Vec<Transaction> {
        self.transaction_pool.clone()
    }

    pub fn proof_of_work(&self) -> u64 {
        let transactions = self.copy_transaction_pool();
        let previous_hash = self.last_block().hash();
        let mut nonce = 0;
        while !valid_proof(nonce, previous_hash, &transactions, MINING_DIFFICULTY) {
            nonce += 1;
        }
        nonce
    }

    /// One mining tick: reward the miner, search a nonce, commit the block.
    /// Returns false when the pool is empty and the tick is skipped.
    pub fn mining(&mut self) -> bool {
        if self.transaction_pool.is_empty() {
            return false;
        }

        let miner_address = self.blockchain_address.clone();
        self.add_transaction(MINING_SENDER, &miner_address, MINING_REWARD, None, None);
        let nonce = self.proof_of_work();
        let previous_hash = self.last_block().hash();
        self.create_block(nonce, previous_hash);
        println!("⛏️ action=mining status=success nonce={}", nonce);
        true
    }

    pub fn calculate_total_amount(&self, blockchain_address: &str) -> f32 {
        let mut total_amount = 0.0f32;
        for block in &self.chain {
            for t in &block.transactions {
                if t.sender_blockchain_address == blockchain_address {
                    total_amount -= t.value;
                }
                if t.recipient_blockchain_address == blockchain_address {
                    total_amount += t.value;
                }
            }
        }
        total_amount
    }

    /// Longest-valid-chain rule over candidate chains fetched from peers.
    /// Candidates are considered in arrival order; the first strictly-longest
    /// valid one wins. On replacement the pending pool is dropped.
    pub fn adopt_longest(&mut self, candidates: Vec<Vec<Block>>) -> bool {
        let mut longest: Option<Vec<Block>> = None;
        let mut max_length = self.chain.len();

        for candidate in candidates {
            if candidate.len() > max_length && valid_chain(&candidate) {
                max_length = candidate.len();
                longest = Some(candidate);
            }
        }

        match longest {
            Some(chain) => {
                self.chain = chain;
                self.transaction_pool.clear();
                println!("🔄 resolve conflicts: chain replaced ({} blocks)", max_length);
                true
            }
            None => {
                println!("🔄 resolve conflicts: chain kept");
                false
            }
        }
    }
}

/// Proof-of-work predicate: hashes a probe block with its timestamp zeroed,
/// so the proof survives re-checking on peers that did not choose the
/// timestamp.
pub fn valid_proof(nonce: u64, previous_hash: [u8; 32], transactions: &[Transaction], difficulty: usize) -> bool {
    let probe = Block {
        timestamp: 0,
        nonce,
        previous_hash,
        transactions: transactions.to_vec(),
    };
    verify_pow(&probe.hash(), difficulty)
}

/// Validates linkage and proof-of-work of every non-genesis block.
pub fn valid_chain(chain: &[Block]) -> bool {
    let mut pre_block = match chain.first() {
        Some(b) => b,
        None => return false,
    };
    for block in &chain[1..] {
        if block.previous_hash != pre_block.hash() {
            return false;
        }
        if !valid_proof(block.nonce, block.previous_hash, &block.transactions, MINING_DIFFICULTY) {
            return false;
        }
        pre_block = block;
    }
    true
}
