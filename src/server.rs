
use crate::blockchain::{
    Blockchain, BLOCKCHAIN_PORT_RANGE_END, BLOCKCHAIN_PORT_RANGE_START, MINING_TIMER_SEC,
    NEIGHBOR_IP_RANGE_END, NEIGHBOR_IP_RANGE_START, NEIGHBOR_SYNC_TIME_SEC,
};
use crate::networking;
use crate::routes::{build_routes, SharedBlockchain, SharedNeighbors};
use crate::wallet::Wallet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task;
use warp::Filter;

pub struct NodeConfig {
    pub port: u16,
    pub host: String,
    pub enforce_balance: bool,
}

pub async fn run(config: NodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let miner_wallet = Wallet::new();
    println!("💳 miner address: {}", miner_wallet.blockchain_address());

    let chain: SharedBlockchain = Arc::new(Mutex::new(Blockchain::new(
        miner_wallet.blockchain_address(),
        config.port,
        config.enforce_balance,
    )));
    let neighbors: SharedNeighbors = Arc::new(Mutex::new(Vec::new()));
    let port = chain.lock().unwrap().port();

    // First sweep and conflict-resolution pass happen before serving, the
    // periodic tasks take over from there.
    sync_neighbors(&config.host, port, &neighbors).await;
    resolve_conflicts(&chain, &neighbors).await;

    spawn_neighbor_sync(config.host.clone(), port, neighbors.clone());
    spawn_mining(chain.clone(), neighbors.clone());

    let routes = build_routes(chain, neighbors).with(warp::log::custom(|info| {
        println!("📥 {} {} {}", info.method(), info.path(), info.status());
    }));

    println!("🚀 node listening on 0.0.0.0:{}", port);
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
    Ok(())
}

/// Replaces the neighbor list with a fresh LAN sweep result.
async fn sync_neighbors(host: &str, port: u16, neighbors: &SharedNeighbors) {
    let found = networking::find_neighbors(
        host,
        port,
        NEIGHBOR_IP_RANGE_START,
        NEIGHBOR_IP_RANGE_END,
        BLOCKCHAIN_PORT_RANGE_START,
        BLOCKCHAIN_PORT_RANGE_END,
    )
    .await;
    let mut guard = neighbors.lock().unwrap();
    *guard = found;
    println!("🔗 neighbors: {:?}", *guard);
}

async fn resolve_conflicts(chain: &SharedBlockchain, neighbors: &SharedNeighbors) {
    let peers = neighbors.lock().unwrap().clone();
    let candidates = networking::fetch_chains(&peers).await;
    chain.lock().unwrap().adopt_longest(candidates);
}

fn spawn_neighbor_sync(host: String, port: u16, neighbors: SharedNeighbors) {
    task::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(NEIGHBOR_SYNC_TIME_SEC)).await;
            sync_neighbors(&host, port, &neighbors).await;
        }
    });
}

/// Mining tick: mine under the chain lock, then tell peers to drop their
/// pools and re-run consensus. Outbound calls happen after the local commit.
fn spawn_mining(chain: SharedBlockchain, neighbors: SharedNeighbors) {
    task::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(MINING_TIMER_SEC)).await;
            let mined = chain.lock().unwrap().mining();
            if mined {
                let peers = neighbors.lock().unwrap().clone();
                networking::broadcast_clear_pool(&peers).await;
                networking::broadcast_consensus(&peers).await;
            }
        }
    });
}
