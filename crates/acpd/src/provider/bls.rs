//! BLS12-381 threshold signatures backed by `threshold_crypto`.

use std::collections::BTreeSet;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use threshold_crypto::serde_impl::SerdeSecret;
use threshold_crypto::{PublicKeySet, SecretKeySet, SecretKeyShare};

use acp_protocol::{GroupKey, KeyShare, Material, SignatureShare};

use super::{CryptoProvider, DealtKeys, ProviderError};

/// Key sizes accepted by `deal`. The curve is fixed; the size is recorded in
/// the group key so clients can keep negotiating it.
pub const SUPPORTED_KEY_SIZES: [u32; 5] = [512, 1024, 2048, 3072, 4096];

/// Upper bound on `l` for a single deal.
const MAX_SHARES: usize = 1024;

/// Compressed size of a G2 point, which is what a signature share holds.
const SIGNATURE_BYTES: usize = 96;

/// Signature material serializes as a JSON array of bytes: at most three
/// digits and a separator per byte, plus the brackets.
const SIGNATURE_LEN_BOUND: usize = SIGNATURE_BYTES * 4 + 1;

/// Threshold signature provider over BLS12-381.
///
/// Descriptors are the serde encodings of the `threshold_crypto` types: the
/// group key holds a `PublicKeySet`, key shares hold a `SecretKeyShare` and
/// signature shares hold a `SignatureShare`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlsProvider;

impl BlsProvider {
    /// Builds the provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for BlsProvider {
    fn deal(&self, key_size: u32, l: usize, k: usize) -> Result<DealtKeys, ProviderError> {
        if !SUPPORTED_KEY_SIZES.contains(&key_size) {
            return Err(ProviderError::UnsupportedKeySize { key_size });
        }
        if k == 0 || k > l || l > MAX_SHARES {
            return Err(ProviderError::InvalidThreshold { k, l });
        }

        // A polynomial of degree k - 1 needs k shares to interpolate.
        let secret_set = SecretKeySet::random(k - 1, &mut rand::thread_rng());
        let group_key = GroupKey {
            k,
            l,
            key_size,
            key: encode("group key", &secret_set.public_keys())?,
        };

        let mut shares = Vec::with_capacity(l);
        for index in 0..l {
            let id = u64::try_from(index).map_err(|_| ProviderError::InvalidThreshold { k, l })?;
            let secret = SerdeSecret(secret_set.secret_key_share(id));
            shares.push(KeyShare {
                id,
                share: encode("key share", &secret)?,
            });
        }

        Ok(DealtKeys { group_key, shares })
    }

    fn sign(&self, share: &KeyShare, msg: &[u8]) -> Result<SignatureShare, ProviderError> {
        let secret: SerdeSecret<SecretKeyShare> = decode("key share", share.share.as_value())?;
        let signature = secret.0.sign(msg);
        Ok(SignatureShare {
            id: share.id,
            signature: encode("signature share", &signature)?,
        })
    }

    fn verify(
        &self,
        group_key: &GroupKey,
        shares: &[SignatureShare],
        msg: &[u8],
    ) -> Result<bool, ProviderError> {
        let public_set: PublicKeySet = decode("group key", group_key.key.as_value())?;
        let required = public_set.threshold().saturating_add(1);
        if required != group_key.k {
            return Err(ProviderError::ThresholdMismatch {
                declared: group_key.k,
                actual: required,
            });
        }

        let mut seen = BTreeSet::new();
        let mut decoded = Vec::with_capacity(shares.len());
        for share in shares {
            let in_range = usize::try_from(share.id).is_ok_and(|id| id < group_key.l);
            if !in_range {
                return Err(ProviderError::ShareOutOfRange {
                    id: share.id,
                    l: group_key.l,
                });
            }
            if !seen.insert(share.id) {
                return Err(ProviderError::DuplicateShare { id: share.id });
            }
            let signature: threshold_crypto::SignatureShare =
                decode("signature share", share.signature.as_value())?;
            decoded.push((share.id, signature));
        }

        // Interpolation only reads the first `k` shares, so every share is
        // checked on its own before combining.
        let all_shares_valid = decoded
            .iter()
            .all(|(id, signature)| public_set.public_key_share(*id).verify(signature, msg));
        if !all_shares_valid {
            return Ok(false);
        }

        let signature = public_set
            .combine_signatures(decoded.iter().map(|(id, signature)| (*id, signature)))
            .map_err(|error| ProviderError::Combine {
                message: error.to_string(),
            })?;
        Ok(public_set.public_key().verify(&signature, msg))
    }

    fn signature_len_bound(&self) -> usize {
        SIGNATURE_LEN_BOUND
    }
}

fn encode<T: Serialize>(what: &'static str, material: &T) -> Result<Material, ProviderError> {
    serde_json::to_value(material)
        .map(Material::new)
        .map_err(|source| ProviderError::encode(what, source))
}

fn decode<T: DeserializeOwned>(what: &'static str, value: &Value) -> Result<T, ProviderError> {
    T::deserialize(value).map_err(|source| ProviderError::malformed(what, source))
}
