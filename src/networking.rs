// === networking.rs ===

use std::net::Ipv4Addr;
use std::time::Duration;

use lazy_static::lazy_static;
use reqwest::Client;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::blockchain::{Block, ChainResponse};
use crate::transaction::{AmountResponse, TransactionRequest};

lazy_static! {
    static ref HTTP_CLIENT: Client = Client::new();
}

/// Probes `host:port` with a 1-second TCP connect.
pub async fn is_found_host(host: &str, port: u16) -> bool {
    let target = format!("{}:{}", host, port);
    matches!(timeout(Duration::from_secs(1), TcpStream::connect(&target)).await, Ok(Ok(_)))
}

/// Sweeps the cartesian product of last-octet offsets and ports around the
/// node's own dotted-quad address, collecting every endpoint that accepts a
/// TCP connection. The node's own endpoint is excluded.
pub async fn find_neighbors(
    my_host: &str,
    my_port: u16,
    start_ip: u8,
    end_ip: u8,
    start_port: u16,
    end_port: u16,
) -> Vec<String> {
    let my_address = format!("{}:{}", my_host, my_port);
    let base: Ipv4Addr = match my_host.parse() {
        Ok(ip) => ip,
        Err(_) => return Vec::new(),
    };
    let octets = base.octets();

    let mut neighbors = Vec::new();
    for port in start_port..=end_port {
        for ip in start_ip..=end_ip {
            let last = octets[3] as u16 + ip as u16;
            if last > 255 {
                continue;
            }
            let guess_host = format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], last);
            let guess_target = format!("{}:{}", guess_host, port);
            if guess_target != my_address && is_found_host(&guess_host, port).await {
                neighbors.push(guess_target);
            }
        }
    }
    neighbors
}

/// Gossips a signed transaction to every neighbor via `PUT /transactions`.
/// Fire-and-forget: failures are logged and not retried.
pub async fn broadcast_transaction(neighbors: &[String], request: &TransactionRequest) {
    for neighbor in neighbors {
        let endpoint = format!("http://{}/transactions", neighbor);
        match HTTP_CLIENT.put(&endpoint).json(request).send().await {
            Ok(resp) => println!("📡 transaction gossiped to {}: {}", neighbor, resp.status()),
            Err(e) => eprintln!("⚠️ transaction gossip to {} failed: {}", neighbor, e),
        }
    }
}

/// Tells every neighbor to drop its pending pool (`DELETE /transactions`),
/// fired after a block is mined locally.
pub async fn broadcast_clear_pool(neighbors: &[String]) {
    for neighbor in neighbors {
        let endpoint = format!("http://{}/transactions", neighbor);
        match HTTP_CLIENT.delete(&endpoint).send().await {
            Ok(resp) => println!("📡 pool clear sent to {}: {}", neighbor, resp.status()),
            Err(e) => eprintln!("⚠️ pool clear to {} failed: {}", neighbor, e),
        }
    }
}

/// Asks every neighbor to run conflict resolution (`PUT /consensus`).
pub async fn broadcast_consensus(neighbors: &[String]) {
    for neighbor in neighbors {
        let endpoint = format!("http://{}/consensus", neighbor);
        match HTTP_CLIENT.put(&endpoint).send().await {
            Ok(resp) => println!("📡 consensus trigger sent to {}: {}", neighbor, resp.status()),
            Err(e) => eprintln!("⚠️ consensus trigger to {} failed: {}", neighbor, e),
        }
    }
}

/// Downloads each neighbor's chain. Unreachable peers and undecodable
/// responses are skipped; conflict resolution treats them as "not longer".
pub async fn fetch_chains(neighbors: &[String]) -> Vec<Vec<Block>> {
    let mut chains = Vec::new();
    for neighbor in neighbors {
        let endpoint = format!("http://{}/chain", neighbor);
        let resp = match HTTP_CLIENT.get(&endpoint).send().await {
            Ok(r) => r,
            Err(e) => {
                eprintln!("⚠️ chain fetch from {} failed: {}", neighbor, e);
                continue;
            }
        };
        if !resp.status().is_success() {
            continue;
        }
        match resp.json::<ChainResponse>().await {
            Ok(body) => chains.push(body.chain),
            Err(e) => eprintln!("⚠️ chain from {} did not decode: {}", neighbor, e),
        }
    }
    chains
}

/// Forwards a wallet-signed transaction to the gateway node. Returns true
/// when the gateway accepted it with 201.
pub async fn forward_transaction(gateway: &str, request: &TransactionRequest) -> bool {
    let endpoint = format!("{}/transactions", gateway);
    match HTTP_CLIENT.post(&endpoint).json(request).send().await {
        Ok(resp) => resp.status() == reqwest::StatusCode::CREATED,
        Err(e) => {
            eprintln!("⚠️ forward to gateway {} failed: {}", gateway, e);
            false
        }
    }
}

/// Queries the gateway for an address balance on behalf of the wallet UI.
pub async fn fetch_amount(gateway: &str, blockchain_address: &str) -> Option<f32> {
    let endpoint = format!("{}/amount", gateway);
    let resp = HTTP_CLIENT
        .get(&endpoint)
        .query(&[("blockchain_address", blockchain_address)])
        .send()
        .await
        .ok()?;
    if !resp.status().is_success() {
        return None;
    }
    resp.json::<AmountResponse>().await.ok().map(|r| r.amount)
}
