//
// The CBC padding oracle.
// https://cryptopals.com/sets/3/challenges/17
//
use tracing::{debug, trace};

use crate::cipher::Aes;
use crate::oracle::PaddingOracle;
use crate::{pkcs7, Error, Result};

/// Decrypts `IV || C1 || … || Cn` with nothing but a padding oracle.
///
/// Each block is attacked on its own, paired with the block before it (the
/// IV for C1). Bytes are solved from the end of the block: once the last
/// ‘g - 1’ intermediate bytes are known, the preceding block is tweaked so
/// they decrypt to ‘g’, and the oracle is asked which value of the next byte
/// makes the padding valid too.
#[derive(Debug, Clone)]
pub struct PaddingAttack {
  pub block_size: usize,
}

impl Default for PaddingAttack {
  fn default() -> PaddingAttack {
    PaddingAttack {
      block_size: Aes::BLOCK_SIZE,
    }
  }
}

impl PaddingAttack {
  pub fn new(block_size: usize) -> PaddingAttack {
    PaddingAttack { block_size }
  }

  /// Recovers the plaintext and removes its padding.
  pub fn recover<O: PaddingOracle + ?Sized>(&self, oracle: &O, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let padded = self.recover_padded(oracle, ciphertext)?;
    Ok(pkcs7::strip(&padded, self.block_size)?.to_vec())
  }

  /// Recovers the plaintext, padding included.
  pub fn recover_padded<O: PaddingOracle + ?Sized>(
    &self,
    oracle: &O,
    ciphertext: &[u8],
  ) -> Result<Vec<u8>> {
    let bsize = self.block_size;
    if bsize == 0 || bsize > 255 {
      return Err(Error::BlockSize(bsize));
    }
    if ciphertext.len() % bsize != 0 || ciphertext.len() < bsize * 2 {
      return Err(Error::Length {
        len: ciphertext.len(),
        block_len: bsize,
      });
    }

    let blocks: Vec<&[u8]> = ciphertext.chunks_exact(bsize).collect();
    let mut plaintext = vec![0; ciphertext.len() - bsize];

    // Last block first; blocks[0] is the IV.
    for b in (1..blocks.len()).rev() {
      let recovered = self.recover_block(oracle, blocks[b - 1], blocks[b], b)?;
      plaintext[(b - 1) * bsize..b * bsize].copy_from_slice(&recovered);
      debug!(block = b, "recovered block");
    }

    Ok(plaintext)
  }

  fn recover_block<O: PaddingOracle + ?Sized>(
    &self,
    oracle: &O,
    prev: &[u8],
    block: &[u8],
    index: usize,
  ) -> Result<Vec<u8>> {
    let bsize = self.block_size;
    let mut intermediate = vec![0u8; bsize];

    // The first half is our forged “previous block”; the second never changes.
    let mut query = prev.to_vec();
    query.extend_from_slice(block);

    for pad in 1..=bsize {
      let pos = bsize - pad;
      let pad_byte = pad as u8;

      // Make the bytes solved so far decrypt to the new padding value.
      for j in pos + 1..bsize {
        query[j] = intermediate[j] ^ pad_byte;
      }

      let mut hit = None;
      for t in candidates(prev[pos], pad) {
        query[pos] = t;
        if oracle.has_valid_padding(&query) && (pad > 1 || confirm(oracle, &mut query, pos)) {
          hit = Some(t);
          break;
        }
      }

      let t = hit.ok_or(Error::OracleExhausted {
        block: index,
        position: pos,
      })?;
      intermediate[pos] = t ^ pad_byte;
      trace!(
        block = index,
        position = pos,
        byte = intermediate[pos] ^ prev[pos],
        "recovered byte"
      );
    }

    Ok(intermediate.iter().zip(prev).map(|(i, p)| i ^ p).collect())
  }
}

/// Every byte value. For the last byte of a block the unmodified value goes
/// last: it reproduces the real plaintext, which for the final block is
/// already validly padded.
fn candidates(original: u8, pad: usize) -> impl Iterator<Item = u8> {
  let defer = pad == 1;
  (0..=255)
    .filter(move |&t| !defer || t != original)
    .chain(if defer { Some(original) } else { None })
}

/// A pad-1 hit might be a longer padding that happened to line up (… 02 02).
/// A real 01 stays valid whatever the byte before it is.
fn confirm<O: PaddingOracle + ?Sized>(oracle: &O, query: &mut [u8], pos: usize) -> bool {
  if pos == 0 {
    return true;
  }
  query[pos - 1] ^= 0xff;
  let valid = oracle.has_valid_padding(query);
  query[pos - 1] ^= 0xff;
  valid
}
