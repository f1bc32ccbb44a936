//! Token-bias encoding.
//!
//! The wire format keys `logit_bias` by tokenizer id, not by literal text.
//! This module performs that mapping up front so a bad entry fails the
//! invocation before any network activity.

use std::collections::{BTreeMap, HashMap};

use tiktoken_rs::get_bpe_from_model;

use crate::error::ClientError;

/// Convert a literal-token bias map into the id-keyed wire form.
///
/// Every source string must encode to exactly one token id under `model`'s
/// tokenizer; otherwise the whole call fails with
/// [`ClientError::InvalidTokenBias`] and no partial map is produced.
pub fn encode_token_bias(
    model: &str,
    bias: &BTreeMap<String, f32>,
) -> Result<HashMap<String, f32>, ClientError> {
    let bpe = get_bpe_from_model(model).map_err(|e| {
        ClientError::InvalidParameter(format!("no tokenizer known for model {model:?}: {e}"))
    })?;

    let mut encoded = HashMap::with_capacity(bias.len());
    for (token, &value) in bias {
        let ids = bpe.encode_ordinary(token);
        if ids.len() != 1 {
            return Err(ClientError::InvalidTokenBias {
                token: token.clone(),
                bias: value,
            });
        }
        encoded.insert(ids[0].to_string(), value);
    }
    Ok(encoded)
}
