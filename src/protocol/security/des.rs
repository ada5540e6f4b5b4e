//! DES as used by VNC authentication
//!
//! VNC feeds the password to DES with the bits of every key byte mirrored,
//! a leftover of the first VNC releases that every server expects.

use des::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use des::Des;

pub const CHALLENGE_LEN: usize = 16;

/// Truncate or zero-pad the password to 8 bytes and mirror each byte
pub fn key_from_password(password: &[u8]) -> [u8; 8] {
    let mut key = [0u8; 8];
    for (key_i, c) in key.iter_mut().zip(password) {
        *key_i = c.reverse_bits();
    }
    key
}

/// Encrypt the 16 byte challenge as two independent ECB blocks
pub fn encrypt(challenge: &[u8; CHALLENGE_LEN], key: &[u8; 8]) -> [u8; CHALLENGE_LEN] {
    let cipher = Des::new(GenericArray::from_slice(key));
    let mut response = *challenge;
    for block in response.chunks_exact_mut(8) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    response
}
