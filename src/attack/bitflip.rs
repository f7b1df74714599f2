//
// CBC bitflipping attacks.
// https://cryptopals.com/sets/2/challenges/16
//
use tracing::debug;

use super::ecb::FILLER;
use crate::bytes::xor_zip;
use crate::oracle::EncryptOracle;
use crate::{Error, Result};

/// Forges `IV || ciphertext` so that one block decrypts to chosen bytes.
///
/// Needs an oracle that encrypts `prefix || input || suffix` under CBC and
/// prepends the IV, with a prefix of known length. Flipping a bit in
/// ciphertext block i flips the same bit of plaintext block i+1 and turns
/// block i into garbage, so the input gets a sacrificial block of filler
/// right before the one we overwrite.
#[derive(Debug, Clone)]
pub struct BitFlip {
  pub block_size: usize,
  pub prefix_len: usize,
  pub filler: u8,
}

impl BitFlip {
  pub fn new(block_size: usize, prefix_len: usize) -> BitFlip {
    BitFlip {
      block_size,
      prefix_len,
      filler: FILLER,
    }
  }

  fn align(&self) -> usize {
    match self.block_size {
      0 => 0,
      n => (n - self.prefix_len % n) % n,
    }
  }

  /// Plaintext block that ends up holding the injected bytes.
  pub fn target_block(&self) -> usize {
    (self.prefix_len + self.align())
      .checked_div(self.block_size)
      .map_or(0, |sacrificial| sacrificial + 1)
  }

  pub fn forge<O: EncryptOracle + ?Sized>(&self, oracle: &mut O, wanted: &[u8]) -> Result<Vec<u8>> {
    let bsize = self.block_size;
    if bsize == 0 {
      return Err(Error::BlockSize(bsize));
    }
    if wanted.len() > bsize {
      return Err(Error::InjectionTooLong {
        len: wanted.len(),
        block_len: bsize,
      });
    }

    // Alignment filler, then the sacrificial block, then the bytes that will
    // turn into ‘wanted’.
    let input = vec![self.filler; self.align() + bsize + wanted.len()];
    let mut ciphertext = oracle.encrypt(&input)?;

    // The IV sits in front, so plaintext block i is preceded by the
    // ciphertext (or IV) block at offset i * bsize.
    let target = self.target_block();
    let beg = target * bsize;
    let end = beg + wanted.len();

    if ciphertext.len() < beg + bsize * 2 {
      return Err(Error::Length {
        len: ciphertext.len(),
        block_len: bsize,
      });
    }

    // To obtain the desired plaintext, XOR the preceding ciphertext with
    // WANTED ^ FILL.
    let mut delta = wanted.to_vec();
    xor_zip(&mut delta, &input[input.len() - wanted.len()..]);
    xor_zip(&mut ciphertext[beg..end], &delta);

    debug!(target, len = wanted.len(), "flipped ciphertext bits");
    Ok(ciphertext)
  }
}
