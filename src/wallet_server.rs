// === wallet_server.rs ===

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use serde::{Deserialize, Serialize};
use serde_json::json;
use warp::http::StatusCode;
use warp::Filter;

use crate::cryptography::{canonical_json, public_key_from_hex};
use crate::networking;
use crate::transaction::{Transaction, TransactionRequest};
use crate::utils::{handle_rejection, json_status};
use crate::wallet::{signature_hex, Wallet};

pub struct WalletConfig {
    pub port: u16,
    pub gateway: String,
}

/// Plaintext transaction request from the wallet UI. The value arrives as a
/// string and is parsed as a 32-bit float.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_blockchain_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_blockchain_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl WalletTransactionRequest {
    pub fn validate(&self) -> bool {
        self.sender_private_key.is_some()
            && self.sender_blockchain_address.is_some()
            && self.recipient_blockchain_address.is_some()
            && self.sender_public_key.is_some()
            && self.value.is_some()
    }
}

pub async fn run(config: WalletConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let routes = build_routes(config.gateway).with(warp::log::custom(|info| {
        println!("📥 {} {} {}", info.method(), info.path(), info.status());
    }));

    println!("🚀 wallet server listening on 0.0.0.0:{}", port);
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
    Ok(())
}

pub fn build_routes(
    gateway: String,
) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
    let gateway_filter = warp::any().map(move || gateway.clone());

    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    let create_wallet = warp::path("wallet")
        .and(warp::path::end())
        .and(warp::post())
        .map(|| {
            let wallet = Wallet::new();
            warp::reply::json(&json!({
                "private_key": wallet.private_key_str(),
                "public_key": wallet.public_key_str(),
                "blockchain_address": wallet.blockchain_address(),
            }))
        });

    let create_transaction = warp::path("transaction")
        .and(warp::post())
        .and(warp::body::json())
        .and(gateway_filter.clone())
        .and_then(|request: WalletTransactionRequest, gateway: String| async move {
            let reply = match sign_request(&request) {
                Some(signed) => {
                    if networking::forward_transaction(&gateway, &signed).await {
                        json_status(StatusCode::OK, "success")
                    } else {
                        json_status(StatusCode::BAD_REQUEST, "fail")
                    }
                }
                None => json_status(StatusCode::BAD_REQUEST, "fail"),
            };
            Ok::<_, warp::Rejection>(reply)
        });

    let wallet_amount = warp::path!("wallet" / "amount")
        .and(warp::get())
        .and(warp::query::<std::collections::HashMap<String, String>>())
        .and(gateway_filter)
        .and_then(
            |params: std::collections::HashMap<String, String>, gateway: String| async move {
                let reply = match params.get("blockchain_address") {
                    Some(address) => match networking::fetch_amount(&gateway, address).await {
                        Some(amount) => warp::reply::with_status(
                            warp::reply::json(&json!({ "message": "success", "amount": amount })),
                            StatusCode::OK,
                        ),
                        None => json_status(StatusCode::BAD_REQUEST, "fail"),
                    },
                    None => json_status(StatusCode::BAD_REQUEST, "fail"),
                };
                Ok::<_, warp::Rejection>(reply)
            },
        );

    index
        .or(create_wallet)
        .or(wallet_amount)
        .or(create_transaction)
        .recover(handle_rejection)
}

/// Rebuilds the key pair from the request, signs the canonical transaction
/// JSON, and produces the node-facing signed request. None maps to 400.
fn sign_request(request: &WalletTransactionRequest) -> Option<TransactionRequest> {
    if !request.validate() {
        return None;
    }
    let sender = request.sender_blockchain_address.clone()?;
    let recipient = request.recipient_blockchain_address.clone()?;
    let public_key_hex = request.sender_public_key.clone()?;
    public_key_from_hex(&public_key_hex).ok()?;

    let key_bytes = hex::decode(request.sender_private_key.as_deref()?).ok()?;
    let signing_key = SigningKey::from_slice(&key_bytes).ok()?;
    let value: f32 = request.value.as_deref()?.parse().ok()?;

    let transaction = Transaction::new(&sender, &recipient, value);
    let signature: Signature = signing_key.sign(&canonical_json(&transaction));

    Some(TransactionRequest {
        sender_blockchain_address: Some(sender),
        recipient_blockchain_address: Some(recipient),
        sender_public_key: Some(public_key_hex),
        value: Some(value),
        signature: Some(signature_hex(&signature)),
    })
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Wallet</title>
  <style>
    body { font-family: sans-serif; max-width: 40em; margin: 2em auto; }
    textarea, input { width: 100%; margin-bottom: 0.5em; }
    pre { background: #f4f4f4; padding: 0.5em; overflow-x: auto; }
  </style>
</head>
<body>
  <h1>Wallet</h1>
  <p>Balance: <span id="amount">0</span></p>
  <pre id="keys"></pre>
  <h2>Send</h2>
  <input id="recipient" placeholder="recipient blockchain address">
  <input id="value" placeholder="amount">
  <button id="send">Send</button>
  <p id="result"></p>
  <script>
    let wallet = null;
    async function reloadAmount() {
      if (!wallet) return;
      const resp = await fetch('/wallet/amount?blockchain_address=' + wallet.blockchain_address);
      if (resp.ok) {
        const body = await resp.json();
        document.getElementById('amount').textContent = body.amount;
      }
    }
    async function init() {
      const resp = await fetch('/wallet', { method: 'POST' });
      wallet = await resp.json();
      document.getElementById('keys').textContent = JSON.stringify(wallet, null, 2);
      await reloadAmount();
      setInterval(reloadAmount, 3000);
    }
    document.getElementById('send').addEventListener('click', async () => {
      const resp = await fetch('/transaction', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({
          sender_private_key: wallet.private_key,
          sender_blockchain_address: wallet.blockchain_address,
          sender_public_key: wallet.public_key,
          recipient_blockchain_address: document.getElementById('recipient').value,
          value: document.getElementById('value').value,
        }),
      });
      const body = await resp.json();
      document.getElementById('result').textContent = body.message;
    });
    init();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cryptography::{signature_from_hex, verify_transaction};

    fn ui_request(wallet: &Wallet, recipient: &str, value: &str) -> WalletTransactionRequest {
        WalletTransactionRequest {
            sender_private_key: Some(wallet.private_key_str()),
            sender_blockchain_address: Some(wallet.blockchain_address().to_string()),
            recipient_blockchain_address: Some(recipient.to_string()),
            sender_public_key: Some(wallet.public_key_str()),
            value: Some(value.to_string()),
        }
    }

    #[test]
    fn sign_request_produces_verifiable_signature() {
        let wallet = Wallet::new();
        let signed = sign_request(&ui_request(&wallet, "recipient", "2.5")).unwrap();

        assert_eq!(signed.value, Some(2.5));
        let tx = Transaction::new(wallet.blockchain_address(), "recipient", 2.5);
        let sig = signature_from_hex(signed.signature.as_deref().unwrap()).unwrap();
        assert!(verify_transaction(wallet.verifying_key(), &sig, &tx));
    }

    #[test]
    fn sign_request_rejects_missing_field_and_bad_value() {
        let wallet = Wallet::new();
        let mut request = ui_request(&wallet, "recipient", "2.5");
        request.sender_private_key = None;
        assert!(sign_request(&request).is_none());

        let request = ui_request(&wallet, "recipient", "not-a-number");
        assert!(sign_request(&request).is_none());
    }

    #[tokio::test]
    async fn new_wallet_endpoint_returns_key_material() {
        let routes = build_routes("http://127.0.0.1:5001".to_string());
        let resp = warp::test::request()
            .method("POST")
            .path("/wallet")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["private_key"].as_str().unwrap().len(), 64);
        assert_eq!(body["public_key"].as_str().unwrap().len(), 128);
        assert!(!body["blockchain_address"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transaction_endpoint_rejects_incomplete_request() {
        let routes = build_routes("http://127.0.0.1:5001".to_string());
        let resp = warp::test::request()
            .method("POST")
            .path("/transaction")
            .json(&json!({ "sender_blockchain_address": "only-one-field" }))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["message"], "fail");
    }

    #[tokio::test]
    async fn index_serves_embedded_page() {
        let routes = build_routes("http://127.0.0.1:5001".to_string());
        let resp = warp::test::request().method("GET").path("/").reply(&routes).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(String::from_utf8_lossy(resp.body()).contains("Wallet"));
    }
}
