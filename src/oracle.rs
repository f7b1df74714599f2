//! What an attacker gets to talk to.
//!
//! Concrete oracles live in the submodules; they keep their keys in private
//! fields and only answer through these traits.
use std::cell::Cell;

use crate::Result;

pub mod cbc;
pub mod ecb;

/// Encrypts attacker-controlled bytes, possibly wrapped in hidden data.
///
/// Calls take `&mut self`: an oracle is free to draw a fresh IV each time, so
/// the same input need not produce the same output twice.
pub trait EncryptOracle {
  fn encrypt(&mut self, input: &[u8]) -> Result<Vec<u8>>;
}

/// Says whether `IV || ciphertext` decrypts to valid PKCS#7, and nothing else.
pub trait PaddingOracle {
  fn has_valid_padding(&self, ciphertext: &[u8]) -> bool;
}

/// Decrypts `IV || ciphertext` and strips the padding.
pub trait DecryptOracle {
  fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

impl<F> EncryptOracle for F
where
  F: FnMut(&[u8]) -> Result<Vec<u8>>,
{
  fn encrypt(&mut self, input: &[u8]) -> Result<Vec<u8>> {
    self(input)
  }
}

impl<F> PaddingOracle for F
where
  F: Fn(&[u8]) -> bool,
{
  fn has_valid_padding(&self, ciphertext: &[u8]) -> bool {
    self(ciphertext)
  }
}

/// The two modes an oracle can be caught using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Ecb,
  Cbc,
}

/// Wraps an oracle and counts how often it is queried.
pub struct Counted<O> {
  inner: O,
  queries: Cell<usize>,
}

impl<O> Counted<O> {
  pub fn new(inner: O) -> Counted<O> {
    Counted {
      inner,
      queries: Cell::new(0),
    }
  }

  pub fn queries(&self) -> usize {
    self.queries.get()
  }

  pub fn into_inner(self) -> O {
    self.inner
  }

  fn tick(&self) {
    self.queries.set(self.queries.get() + 1);
  }
}

impl<O: EncryptOracle> EncryptOracle for Counted<O> {
  fn encrypt(&mut self, input: &[u8]) -> Result<Vec<u8>> {
    self.tick();
    self.inner.encrypt(input)
  }
}

impl<O: PaddingOracle> PaddingOracle for Counted<O> {
  fn has_valid_padding(&self, ciphertext: &[u8]) -> bool {
    self.tick();
    self.inner.has_valid_padding(ciphertext)
  }
}

impl<O: DecryptOracle> DecryptOracle for Counted<O> {
  fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
    self.tick();
    self.inner.decrypt(ciphertext)
  }
}
