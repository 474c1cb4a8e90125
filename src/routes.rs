// === routes.rs ===

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use p256::ecdsa::{Signature, VerifyingKey};
use serde_json::json;
use warp::http::StatusCode;
use warp::Filter;

use crate::blockchain::{Blockchain, ChainResponse};
use crate::cryptography;
use crate::networking;
use crate::transaction::{AmountResponse, TransactionRequest};
use crate::utils::{handle_rejection, json_status};

pub type SharedBlockchain = Arc<Mutex<Blockchain>>;
pub type SharedNeighbors = Arc<Mutex<Vec<String>>>;

pub fn build_routes(
    chain: SharedBlockchain,
    neighbors: SharedNeighbors,
) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
    let chain_filter = warp::any().map(move || chain.clone());
    let neighbor_filter = warp::any().map(move || neighbors.clone());

    let get_chain = warp::path("chain")
        .and(warp::get())
        .and(chain_filter.clone())
        .map(|chain: SharedBlockchain| {
            let bc = chain.lock().unwrap();
            warp::reply::json(&ChainResponse {
                chain: bc.chain().to_vec(),
            })
        });

    let get_transactions = warp::path("transactions")
        .and(warp::get())
        .and(chain_filter.clone())
        .map(|chain: SharedBlockchain| {
            let bc = chain.lock().unwrap();
            warp::reply::json(&json!({
                "transactions": bc.transaction_pool(),
                "length": bc.transaction_pool().len(),
            }))
        });

    let post_transactions = warp::path("transactions")
        .and(warp::post())
        .and(warp::body::json())
        .and(chain_filter.clone())
        .and(neighbor_filter.clone())
        .and_then(
            |request: TransactionRequest, chain: SharedBlockchain, neighbors: SharedNeighbors| async move {
                Ok::<_, warp::Rejection>(create_transaction(request, chain, neighbors).await)
            },
        );

    let put_transactions = warp::path("transactions")
        .and(warp::put())
        .and(warp::body::json())
        .and(chain_filter.clone())
        .map(|request: TransactionRequest, chain: SharedBlockchain| {
            if admit_transaction(&request, &chain) {
                json_status(StatusCode::OK, "success")
            } else {
                json_status(StatusCode::BAD_REQUEST, "fail")
            }
        });

    let delete_transactions = warp::path("transactions")
        .and(warp::delete())
        .and(chain_filter.clone())
        .map(|chain: SharedBlockchain| {
            chain.lock().unwrap().clear_transaction_pool();
            warp::reply::json(&json!({ "message": "success" }))
        });

    let put_consensus = warp::path("consensus")
        .and(warp::put())
        .and(chain_filter.clone())
        .and(neighbor_filter)
        .and_then(|chain: SharedBlockchain, neighbors: SharedNeighbors| async move {
            let peers = neighbors.lock().unwrap().clone();
            let candidates = networking::fetch_chains(&peers).await;
            let replaced = chain.lock().unwrap().adopt_longest(candidates);
            let message = if replaced { "chain replaced" } else { "chain kept" };
            Ok::<_, warp::Rejection>(warp::reply::json(&json!({ "message": message })))
        });

    let get_amount = warp::path("amount")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(chain_filter)
        .map(|params: HashMap<String, String>, chain: SharedBlockchain| {
            match params.get("blockchain_address") {
                Some(address) => {
                    let bc = chain.lock().unwrap();
                    let amount = bc.calculate_total_amount(address);
                    warp::reply::with_status(
                        warp::reply::json(&AmountResponse { amount }),
                        StatusCode::OK,
                    )
                }
                None => json_status(StatusCode::BAD_REQUEST, "fail"),
            }
        });

    get_chain
        .or(get_transactions)
        .or(post_transactions)
        .or(put_transactions)
        .or(delete_transactions)
        .or(put_consensus)
        .or(get_amount)
        .recover(handle_rejection)
}

/// Decodes the hex-encoded key material of a request. None means the request
/// is structurally invalid and maps to 400.
fn parse_transaction_request(request: &TransactionRequest) -> Option<(String, String, f32, VerifyingKey, Signature)> {
    if !request.validate() {
        return None;
    }
    let sender = request.sender_blockchain_address.clone()?;
    let recipient = request.recipient_blockchain_address.clone()?;
    let value = request.value?;
    let public_key = cryptography::public_key_from_hex(request.sender_public_key.as_deref()?).ok()?;
    let signature = cryptography::signature_from_hex(request.signature.as_deref()?).ok()?;
    Some((sender, recipient, value, public_key, signature))
}

fn admit_transaction(request: &TransactionRequest, chain: &SharedBlockchain) -> bool {
    match parse_transaction_request(request) {
        Some((sender, recipient, value, public_key, signature)) => {
            let mut bc = chain.lock().unwrap();
            bc.add_transaction(&sender, &recipient, value, Some(&public_key), Some(&signature))
        }
        None => false,
    }
}

/// Client-origin path: admit the transaction, then gossip it to every
/// neighbor. Gossip runs after the local state change and is never rolled
/// back on peer failure.
async fn create_transaction(
    request: TransactionRequest,
    chain: SharedBlockchain,
    neighbors: SharedNeighbors,
) -> warp::reply::WithStatus<warp::reply::Json> {
    if !admit_transaction(&request, &chain) {
        return json_status(StatusCode::BAD_REQUEST, "fail");
    }

    let peers = neighbors.lock().unwrap().clone();
    tokio::spawn(async move {
        networking::broadcast_transaction(&peers, &request).await;
    });
    json_status(StatusCode::CREATED, "success")
}
