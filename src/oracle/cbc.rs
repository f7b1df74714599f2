use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, RngCore};

use super::{DecryptOracle, EncryptOracle, PaddingOracle};
use crate::cbc::Cbc;
use crate::cipher::Aes;
use crate::{decode_base64, pkcs7, Error, Result};

pub const COMMENT_PREFIX: &[u8] = b"comment1=cooking%20MCs;userdata=";
pub const COMMENT_SUFFIX: &[u8] = b";comment2=%20like%20a%20pound%20of%20bacon";

/// Encrypts `IV || CBC(key, IV, message)` with a fresh IV per call.
fn encrypt_with_iv<R: RngCore>(cbc: &Cbc<Aes>, rng: &mut R, message: &[u8]) -> Result<Vec<u8>> {
  let mut iv = vec![0; cbc.block_size()];
  rng.fill_bytes(&mut iv);
  let ciphertext = cbc.encrypt(&iv, message)?;
  iv.extend(ciphertext);
  Ok(iv)
}

/// Decrypts `IV || ciphertext`, leaving the padding in place.
fn decrypt_with_iv(cbc: &Cbc<Aes>, data: &[u8]) -> Result<Vec<u8>> {
  let bsize = cbc.block_size();
  if data.len() < bsize * 2 {
    return Err(Error::Length {
      len: data.len(),
      block_len: bsize,
    });
  }
  let (iv, ciphertext) = data.split_at(bsize);
  cbc.decrypt(iv, ciphertext)
}

//
// For the bit-flipping attack: encrypts userdata inside a query string.
// https://cryptopals.com/sets/2/challenges/16
//
pub struct CommentOracle<R> {
  cbc: Cbc<Aes>,
  rng: R,
}

impl<R: RngCore + CryptoRng> CommentOracle<R> {
  pub fn new(mut rng: R) -> Result<CommentOracle<R>> {
    let cbc = Cbc::new(Aes::new(&rng.gen::<[u8; 16]>())?);
    Ok(CommentOracle { cbc, rng })
  }

  /// Takes an encrypted query and checks for an ‘admin=true’ field.
  pub fn is_admin(&self, ciphertext: &[u8]) -> Result<bool> {
    let query = self.decrypt(ciphertext)?;
    Ok(query.split(|&b| b == b';').any(|field| field == b"admin=true"))
  }
}

/// Quotes out the characters that would let userdata add fields of its own.
fn quote(userdata: &[u8]) -> Vec<u8> {
  let mut ret = Vec::with_capacity(userdata.len());
  for &b in userdata {
    match b {
      b';' => ret.extend_from_slice(b"%3B"),
      b'=' => ret.extend_from_slice(b"%3D"),
      _ => ret.push(b),
    }
  }
  ret
}

impl<R: RngCore + CryptoRng> EncryptOracle for CommentOracle<R> {
  fn encrypt(&mut self, userdata: &[u8]) -> Result<Vec<u8>> {
    let query = [COMMENT_PREFIX, &quote(userdata)[..], COMMENT_SUFFIX].concat();
    encrypt_with_iv(&self.cbc, &mut self.rng, &query)
  }
}

impl<R> DecryptOracle for CommentOracle<R> {
  fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let padded = decrypt_with_iv(&self.cbc, ciphertext)?;
    Ok(pkcs7::strip(&padded, self.cbc.block_size())?.to_vec())
  }
}

//
// For the padding oracle attack.
// https://cryptopals.com/sets/3/challenges/17
//
pub const SAMPLES: [&str; 10] = [
  "MDAwMDAwTm93IHRoYXQgdGhlIHBhcnR5IGlzIGp1bXBpbmc=",
  "MDAwMDAxV2l0aCB0aGUgYmFzcyBraWNrZWQgaW4gYW5kIHRoZSBWZWdhJ3MgYXJlIHB1bXBpbic=",
  "MDAwMDAyUXVpY2sgdG8gdGhlIHBvaW50LCB0byB0aGUgcG9pbnQsIG5vIGZha2luZw==",
  "MDAwMDAzQ29va2luZyBNQydzIGxpa2UgYSBwb3VuZCBvZiBiYWNvbg==",
  "MDAwMDA0QnVybmluZyAnZW0sIGlmIHlvdSBhaW4ndCBxdWljayBhbmQgbmltYmxl",
  "MDAwMDA1SSBnbyBjcmF6eSB3aGVuIEkgaGVhciBhIGN5bWJhbA==",
  "MDAwMDA2QW5kIGEgaGlnaCBoYXQgd2l0aCBhIHNvdXBlZCB1cCB0ZW1wbw==",
  "MDAwMDA3SSdtIG9uIGEgcm9sbCwgaXQncyB0aW1lIHRvIGdvIHNvbG8=",
  "MDAwMDA4b2xsaW4nIGluIG15IGZpdmUgcG9pbnQgb2g=",
  "MDAwMDA5aXRoIG15IHJhZy10b3AgZG93biBzbyBteSBoYWlyIGNhbiBibG93",
];

lazy_static! {
  static ref SAMPLE_BYTES: Vec<Vec<u8>> = SAMPLES
    .iter()
    .map(|s| decode_base64(s.as_bytes()).expect("samples are valid base64"))
    .collect();
}

/// The decoded padding-oracle samples.
pub fn samples() -> &'static [Vec<u8>] {
  &SAMPLE_BYTES
}

pub struct CbcPaddingOracle<R> {
  cbc: Cbc<Aes>,
  rng: R,
}

impl<R: RngCore + CryptoRng> CbcPaddingOracle<R> {
  pub fn new(mut rng: R) -> Result<CbcPaddingOracle<R>> {
    let cbc = Cbc::new(Aes::new(&rng.gen::<[u8; 16]>())?);
    Ok(CbcPaddingOracle { cbc, rng })
  }

  pub fn encrypt_sample(&mut self, index: usize) -> Result<Vec<u8>> {
    let sample = &samples()[index % SAMPLES.len()];
    self.encrypt(sample)
  }

  /// Picks one of the samples at random and returns its `IV || ciphertext`.
  pub fn encrypt_random_sample(&mut self) -> Result<Vec<u8>> {
    let sample: &'static [u8] = samples().choose(&mut self.rng).map_or(&[], |s| &s[..]);
    self.encrypt(sample)
  }
}

impl<R: RngCore + CryptoRng> EncryptOracle for CbcPaddingOracle<R> {
  fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_iv(&self.cbc, &mut self.rng, plaintext)
  }
}

impl<R> PaddingOracle for CbcPaddingOracle<R> {
  fn has_valid_padding(&self, ciphertext: &[u8]) -> bool {
    match decrypt_with_iv(&self.cbc, ciphertext) {
      Ok(plaintext) => pkcs7::strip(&plaintext, self.cbc.block_size()).is_ok(),
      Err(_) => false,
    }
  }
}
