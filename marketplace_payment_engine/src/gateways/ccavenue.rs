//! CCAvenue wire format
//!
//! CCAvenue posts callbacks as a form body with a single `encResp` field: a hex-encoded AES-128-CBC ciphertext.
//! The cipher key is the MD5 digest of the merchant's working key and the IV is the fixed byte sequence
//! `00 01 02 .. 0f`, matching CCAvenue's published merchant kits. The plaintext is an `&`-joined, `=`-separated
//! key/value string with URL-encoded values.
//!
//! There is no separate signature field. Possession of the working key is the authentication factor: a payload that
//! decrypts into a well-formed field map containing `order_id` and `order_status` is considered authentic.

use std::collections::BTreeMap;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use log::*;
use md5::{Digest, Md5};

use crate::{
    db_types::Gateway,
    gateways::{DecodeError, GatewayResponse, VerificationError},
};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// The fixed IV from CCAvenue's merchant kit.
const IV: [u8; 16] = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f];

fn cipher_key(working_key: &str) -> [u8; 16] {
    Md5::digest(working_key.as_bytes()).into()
}

/// Encrypt an outgoing request body for CCAvenue. Returns the hex-encoded ciphertext.
pub fn encrypt(plaintext: &str, working_key: &str) -> String {
    let key = cipher_key(working_key);
    let cipher = Aes128CbcEnc::new(&key.into(), &IV.into());
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    hex::encode(ciphertext)
}

/// Decrypt a hex-encoded CCAvenue payload with the merchant working key.
pub fn decrypt(ciphertext_hex: &str, working_key: &str) -> Result<String, DecodeError> {
    let ciphertext = hex::decode(ciphertext_hex.trim()).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    let key = cipher_key(working_key);
    let cipher = Aes128CbcDec::new(&key.into(), &IV.into());
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|e| DecodeError::DecryptionFailed(e.to_string()))?;
    String::from_utf8(plaintext).map_err(|_| DecodeError::NotUtf8)
}

/// Split a decrypted CCAvenue plaintext (`a=1&b=hello+world`) into a field map.
///
/// Values are URL-decoded, with literal `+` converted to a space first, per the gateway's encoding. Pairs without
/// an `=` are skipped.
pub fn parse_plaintext(plaintext: &str) -> BTreeMap<String, String> {
    plaintext
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| {
            let v = v.replace('+', " ");
            let v = urlencoding::decode(&v).map(|c| c.into_owned()).unwrap_or(v);
            (k.to_string(), v)
        })
        .collect()
}

/// Join a parameter list into the `&`-separated plaintext CCAvenue expects, URL-encoding each value.
pub fn encode_params<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    params
        .into_iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a raw `encResp` value into a field map. Decode failures are fatal for the callback.
pub fn decode_callback(enc_resp: &str, working_key: &str) -> Result<BTreeMap<String, String>, DecodeError> {
    if enc_resp.trim().is_empty() {
        return Err(DecodeError::MissingField("encResp"));
    }
    let plaintext = decrypt(enc_resp, working_key)?;
    trace!("🏦️ CCAvenue payload decrypted to {} bytes of plaintext", plaintext.len());
    Ok(parse_plaintext(&plaintext))
}

/// Check that the decoded map carries the business fields a genuine CCAvenue response always has, and normalize it.
///
/// Decryption succeeding is necessary but not sufficient: a payload encrypted with the right key but missing
/// `order_id` or `order_status` is still treated as unverified.
pub fn into_verified_response(fields: BTreeMap<String, String>) -> Result<GatewayResponse, VerificationError> {
    let reference = fields.get("order_id").filter(|v| !v.is_empty()).ok_or(VerificationError::MissingField("order_id"))?.clone();
    let status = fields.get("order_status").filter(|v| !v.is_empty()).ok_or(VerificationError::MissingField("order_status"))?.clone();
    let tracking_id = fields.get("tracking_id").filter(|v| !v.is_empty()).cloned();
    let payment_mode = fields.get("payment_mode").filter(|v| !v.is_empty()).cloned();
    let amount = fields.get("amount").and_then(|v| {
        v.parse()
            .map_err(|e| warn!("🏦️ CCAvenue response for {reference} carried an unparsable amount '{v}'. {e}"))
            .ok()
    });
    Ok(GatewayResponse { gateway: Gateway::CcAvenue, reference, status, tracking_id, amount, payment_mode, fields })
}
