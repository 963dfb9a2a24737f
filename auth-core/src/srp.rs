//! SRP engine (component F): server half of SRP-6a (RFC 5054 semantics).
//! The server never sees the password, only the verifier `v = g^x mod N`
//! computed client-side from the user's salt and password.
//!
//! Group parameters are the RFC 5054 3072-bit group, exposed to clients via
//! `/v1/srp/vars` so a client-side SRP library can compute the same `x`/`v`.

use crate::error::{CoreError, CoreResult};
use crate::models::{SrpInFlight, User};
use crate::store::UserStore;
use num_bigint_dig::{BigUint, RandBigInt};
use num_traits::Zero;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// RFC 5054, Appendix A, the 3072-bit group (equivalently RFC 3526 Group 15).
pub const GROUP_PRIME_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF6955817183995497CEA956AE515D2261898FA0510",
    "15728E5A8AAAC42DAD33170D04507A33A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7",
    "ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6BF12FFA06D98A0864D87602733EC86A64521F2B18177B200C",
    "BBE117577A615D6C770988C0BAD946E208E24FA074E5AB3143DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF"
);

/// Generator for the RFC 5054 3072-bit group.
pub const GROUP_GENERATOR: u32 = 5;

fn prime() -> BigUint {
    BigUint::parse_bytes(GROUP_PRIME_HEX.as_bytes(), 16).expect("static RFC 5054 prime is valid hex")
}

fn generator() -> BigUint {
    BigUint::from(GROUP_GENERATOR)
}

fn sha256(chunks: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().to_vec()
}

fn hash_biguint(n: &BigUint) -> BigUint {
    BigUint::from_bytes_be(&sha256(&[&n.to_bytes_be()]))
}

/// `k = H(N, g)`, padding `g` to the byte length of `N` per RFC 5054 §2.5.1.
fn compute_k(n: &BigUint, g: &BigUint) -> BigUint {
    let n_bytes = n.to_bytes_be();
    let mut g_bytes = g.to_bytes_be();
    while g_bytes.len() < n_bytes.len() {
        g_bytes.insert(0, 0);
    }
    BigUint::from_bytes_be(&sha256(&[&n_bytes, &g_bytes]))
}

/// Server state in flight between `begin` and `verify`, base64-encoded for
/// storage as the `encoded_server` blob.
#[derive(serde::Serialize, serde::Deserialize)]
struct ServerState {
    #[serde(with = "biguint_hex")]
    a_pub: BigUint,
    #[serde(with = "biguint_hex")]
    b_pub: BigUint,
    #[serde(with = "biguint_hex")]
    b_priv: BigUint,
    #[serde(with = "biguint_hex")]
    verifier: BigUint,
}

mod biguint_hex {
    use num_bigint_dig::BigUint;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        value.to_str_radix(16).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::parse_bytes(s.as_bytes(), 16).ok_or_else(|| serde::de::Error::custom("invalid hex BigUint"))
    }
}

/// `SHA-256(username)`, hex-encoded. Clients compute this themselves and
/// send it as `identity` on every login step; exposed here so other
/// adapters (the CLI's user-creation command) can store a matching
/// `hashed_username` without duplicating the hash function.
pub fn hash_identity(username: &str) -> String {
    hex::encode(sha256(&[username.as_bytes()]))
}

pub struct SrpEngine {
    store: Arc<dyn UserStore>,
    in_flight_ttl: chrono::Duration,
}

impl SrpEngine {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            in_flight_ttl: chrono::Duration::seconds(5),
        }
    }

    pub fn group_vars(&self) -> (String, u32) {
        (GROUP_PRIME_HEX.to_string(), GROUP_GENERATOR)
    }

    /// Registers a new user from a salt/verifier pair computed client-side
    /// (the server never sees the password). `hashed_username` is derived
    /// here via [`hash_identity`] so it always matches what a client will
    /// later present as `identity` during login.
    pub async fn register(&self, username: &str, salt_hex: &str, verifier_hex: &str) -> CoreResult<User> {
        let hashed_username = hash_identity(username);
        let encoded_verifier = format!("{salt_hex}:{verifier_hex}");
        self.store.create_user(username, &hashed_username, &encoded_verifier).await
    }

    pub async fn list_users(&self) -> CoreResult<Vec<User>> {
        self.store.list_users().await
    }

    /// Step 1. `client_public_hex` is the client's ephemeral public value
    /// `A` as hex; `identity_hash` is `SHA-256(username)` hex. Returns the
    /// server credentials `salt || B`, hex-joined by `:`, for the client.
    pub async fn begin(&self, identity_hash: &str, client_public_hex: &str) -> CoreResult<String> {
        let user = self
            .store
            .get_user_by_hashed_username(identity_hash)
            .await?
            .ok_or(CoreError::UserNotFound)?;

        if let Some(existing) = self.store.get_srp_in_flight(user.id).await? {
            if existing.expires_at > chrono::Utc::now() {
                return Err(CoreError::AlreadyLoggingIn);
            }
        }

        let (salt_hex, verifier_hex) = split_encoded_verifier(&user.encoded_verifier)?;
        let verifier = BigUint::parse_bytes(verifier_hex.as_bytes(), 16)
            .ok_or_else(|| CoreError::Internal(anyhow::anyhow!("corrupt stored verifier")))?;
        let a_pub = BigUint::parse_bytes(client_public_hex.as_bytes(), 16)
            .ok_or_else(|| CoreError::InvalidArgument("malformed client public value".into()))?;

        let n = prime();
        if a_pub.is_zero() || &a_pub % &n == BigUint::zero() {
            return Err(CoreError::InvalidArgument("client public value is degenerate".into()));
        }

        let g = generator();
        let k = compute_k(&n, &g);
        let b_priv = rand::thread_rng().gen_biguint_below(&n);
        let b_pub = (&k * &verifier + g.modpow(&b_priv, &n)) % &n;

        let state = ServerState {
            a_pub,
            b_pub: b_pub.clone(),
            b_priv,
            verifier,
        };
        let encoded_server =
            serde_json::to_string(&state).map_err(|e| CoreError::Internal(e.into()))?;

        self.store
            .put_srp_in_flight(&SrpInFlight {
                uid: user.id,
                encoded_server,
                expires_at: chrono::Utc::now() + self.in_flight_ttl,
            })
            .await?;

        Ok(format!("{}:{}", salt_hex, b_pub.to_str_radix(16)))
    }

    /// Step 2. Resolves `uid` from `identity_hash`, consumes the in-flight
    /// row, and checks the client's proof `m1`. Returns `(uid, m2)` on
    /// success — `m2` is the server's proof the client must validate.
    pub async fn verify(&self, identity_hash: &str, client_public_hex: &str, m1_hex: &str) -> CoreResult<(Uuid, String)> {
        let user = self
            .store
            .get_user_by_hashed_username(identity_hash)
            .await?
            .ok_or(CoreError::Unauthorized)?;

        let in_flight = self
            .store
            .take_srp_in_flight(user.id)
            .await?
            .ok_or(CoreError::Unauthorized)?;
        if in_flight.expires_at <= chrono::Utc::now() {
            return Err(CoreError::Unauthorized);
        }

        let state: ServerState =
            serde_json::from_str(&in_flight.encoded_server).map_err(|e| CoreError::Internal(e.into()))?;

        let a_pub = BigUint::parse_bytes(client_public_hex.as_bytes(), 16)
            .ok_or_else(|| CoreError::InvalidArgument("malformed client public value".into()))?;
        if a_pub != state.a_pub {
            return Err(CoreError::Unauthorized);
        }

        let n = prime();
        let g = generator();
        let u = hash_biguint_pair(&a_pub, &state.b_pub);
        if u.is_zero() {
            return Err(CoreError::Unauthorized);
        }

        // S = (A * v^u) ^ b mod N
        let s = (&a_pub * state.verifier.modpow(&u, &n)).modpow(&state.b_priv, &n) % &n;
        let session_key = hash_biguint(&s);

        let identity = identity_for_username(&user);
        let expected_m1 = compute_m1(&n, &g, &identity, &s_placeholder_salt(&user)?, &a_pub, &state.b_pub, &session_key);
        let presented_m1 = hex::decode(m1_hex).map_err(|_| CoreError::Unauthorized)?;

        if !crypto::constant_time::ct_eq(&expected_m1, &presented_m1) {
            return Err(CoreError::Unauthorized);
        }

        let m2 = compute_m2(&a_pub, &expected_m1, &session_key);
        Ok((user.id, hex::encode(m2)))
    }
}

fn split_encoded_verifier(encoded: &str) -> CoreResult<(String, String)> {
    let mut parts = encoded.splitn(2, ':');
    let salt = parts.next().ok_or_else(|| CoreError::Internal(anyhow::anyhow!("empty verifier")))?;
    let verifier = parts
        .next()
        .ok_or_else(|| CoreError::Internal(anyhow::anyhow!("verifier missing salt separator")))?;
    Ok((salt.to_string(), verifier.to_string()))
}

fn identity_for_username(user: &User) -> Vec<u8> {
    user.username.as_bytes().to_vec()
}

fn s_placeholder_salt(user: &User) -> CoreResult<Vec<u8>> {
    let (salt_hex, _) = split_encoded_verifier(&user.encoded_verifier)?;
    hex::decode(salt_hex).map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))
}

fn hash_biguint_pair(a: &BigUint, b: &BigUint) -> BigUint {
    BigUint::from_bytes_be(&sha256(&[&a.to_bytes_be(), &b.to_bytes_be()]))
}

/// `M1 = H( H(N) xor H(g), H(I), s, A, B, K )`, the standard SRP-6a client
/// proof used by widely deployed client libraries (e.g. `secure-remote-password`).
fn compute_m1(n: &BigUint, g: &BigUint, identity: &[u8], salt: &[u8], a_pub: &BigUint, b_pub: &BigUint, k: &BigUint) -> Vec<u8> {
    let h_n = sha256(&[&n.to_bytes_be()]);
    let h_g = sha256(&[&g.to_bytes_be()]);
    let xored: Vec<u8> = h_n.iter().zip(h_g.iter()).map(|(a, b)| a ^ b).collect();
    let h_i = sha256(&[identity]);
    sha256(&[&xored, &h_i, salt, &a_pub.to_bytes_be(), &b_pub.to_bytes_be(), &k.to_bytes_be()])
}

/// `M2 = H( A, M1, K )`.
fn compute_m2(a_pub: &BigUint, m1: &[u8], k: &BigUint) -> Vec<u8> {
    sha256(&[&a_pub.to_bytes_be(), m1, &k.to_bytes_be()])
}
