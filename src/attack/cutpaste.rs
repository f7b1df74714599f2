//
// ECB cut-and-paste.
// https://cryptopals.com/sets/2/challenges/13
//
use tracing::debug;

use super::ecb::FILLER;
use crate::bytes::nth_block;
use crate::oracle::EncryptOracle;
use crate::{pkcs7, Error, Result};

/// Rewrites the last value of an encrypted `k=v&…` record.
///
/// Needs an ECB oracle that puts the attacker's input right after a header of
/// known length, and ends every record with the same value (say, `user` in
/// `…&role=user`). Under ECB, ciphertext blocks can be moved around freely: we
/// get one record where that value starts a block of its own, and another
/// where our replacement, already padded, fills a whole block.
#[derive(Debug, Clone)]
pub struct CutAndPaste {
  pub block_size: usize,
  /// Bytes the oracle writes before the input, e.g. `email=`.
  pub head_len: usize,
  /// The value every record ends with, which gets cut off.
  pub old_value: Vec<u8>,
  pub filler: u8,
}

impl CutAndPaste {
  pub fn new(block_size: usize, head_len: usize, old_value: &[u8]) -> CutAndPaste {
    CutAndPaste {
      block_size,
      head_len,
      old_value: old_value.to_vec(),
      filler: FILLER,
    }
  }

  /// Returns a record that ends in ‘wanted’ instead of the old value.
  pub fn forge<O: EncryptOracle + ?Sized>(&self, oracle: &mut O, wanted: &[u8]) -> Result<Vec<u8>> {
    let bsize = self.block_size;
    if bsize == 0 || bsize > 255 {
      return Err(Error::BlockSize(bsize));
    }
    if wanted.len() >= bsize {
      return Err(Error::InjectionTooLong {
        len: wanted.len(),
        block_len: bsize,
      });
    }

    // (1) Everything up to and including `role=`, block-aligned.
    let input = self.aligned_input(oracle)?;
    let mut forged = oracle.encrypt(&input)?;
    let tail = (self.old_value.len() / bsize + 1) * bsize;
    let keep = forged.len().checked_sub(tail).ok_or(Error::Length {
      len: forged.len(),
      block_len: bsize,
    })?;
    forged.truncate(keep);

    // (2) A block holding exactly pad(wanted). Its PKCS#7 bytes go through
    // the oracle as part of the input.
    let mut input = vec![self.filler; (bsize - self.head_len % bsize) % bsize];
    let index = (self.head_len + input.len()) / bsize;
    input.extend(pkcs7::pad(wanted, bsize)?);
    let ciphertext = oracle.encrypt(&input)?;
    let block = nth_block(&ciphertext, bsize, index).ok_or(Error::Length {
      len: ciphertext.len(),
      block_len: bsize,
    })?;

    forged.extend_from_slice(block);
    debug!(blocks = forged.len() / bsize, "pasted ciphertext block");
    Ok(forged)
  }

  /// Input after which the old value starts on a block boundary.
  ///
  /// The output grows the moment the whole record fills complete blocks
  /// (PKCS#7 then adds a full block). From there, another ‘old_value.len()’
  /// bytes push exactly the old value past the boundary.
  fn aligned_input<O: EncryptOracle + ?Sized>(&self, oracle: &mut O) -> Result<Vec<u8>> {
    let mut input = Vec::new();
    let base = oracle.encrypt(&input)?.len();

    for _ in 0..self.block_size {
      input.push(self.filler);
      if oracle.encrypt(&input)?.len() > base {
        input.resize(input.len() + self.old_value.len(), self.filler);
        return Ok(input);
      }
    }

    Err(Error::BlockSizeNotFound {
      probed: self.block_size,
    })
  }
}
