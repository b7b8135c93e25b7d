use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1};
use tiny_keccak::{Hasher, Keccak};

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);
    hash
}

/// EIP-191 personal-message hash:
/// keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)
pub(crate) fn eip191_hash(message: &str) -> [u8; 32] {
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    keccak256(prefixed.as_bytes())
}

/// Ethereum address of a secp256k1 public key: last 20 bytes of the
/// keccak256 of the uncompressed key body.
pub(crate) fn pubkey_to_address(public_key: &PublicKey) -> String {
    let bytes = public_key.serialize_uncompressed();
    let hash = keccak256(&bytes[1..]); // skip the 0x04 tag byte
    format!("0x{}", hex::encode(&hash[12..]))
}

fn recover_signer(message: &str, signature: &[u8]) -> Option<String> {
    if signature.len() != 65 {
        return None;
    }

    // v is 27/28 in wallet output, 0/1 raw
    let v = signature[64];
    let recovery = if v >= 27 { v - 27 } else { v };
    let recovery_id = RecoveryId::from_i32(recovery as i32).ok()?;
    let recoverable = RecoverableSignature::from_compact(&signature[..64], recovery_id).ok()?;

    let digest = Message::from_slice(&eip191_hash(message)).ok()?;
    let secp = Secp256k1::new();
    let public_key = secp.recover_ecdsa(&digest, &recoverable).ok()?;
    Some(pubkey_to_address(&public_key))
}

/// Recovers the signer of an EIP-191 personal-sign signature and compares
/// it to the expected address, case-insensitively. Malformed input or a
/// mismatched signer yields `false`, never an error.
pub fn verify_evm_signature(expected_address: &str, message: &str, signature: &[u8]) -> bool {
    match recover_signer(message, signature) {
        Some(recovered) => recovered.eq_ignore_ascii_case(expected_address),
        None => false,
    }
}

/// Shape check only: a 64-byte signature counts as proof. The signature is
/// NOT cryptographically verified against the address's ed25519 key, so a
/// faulty or malicious signer that returns any well-formed blob passes.
/// Known gap; upgrading it to real verification is an explicit scope
/// change, not a refactor.
pub fn verify_solana_signature(_expected_address: &str, _message: &str, signature: &[u8]) -> bool {
    signature.len() == 64
}
