//
// Detect AES in ECB mode.
// https://cryptopals.com/sets/1/challenges/8
// https://cryptopals.com/sets/2/challenges/11
//
use tracing::debug;

use super::ecb::FILLER;
use crate::bytes::max_repeat_count;
use crate::oracle::{EncryptOracle, Mode};
use crate::{Error, Result};

/// Picks out the ciphertext that was most likely encrypted under ECB.
///
/// That is the one with the most repeated blocks; if no ciphertext repeats a
/// single block, there is nothing to go on and the answer is None.
pub fn detect_ecb<T: AsRef<[u8]>>(ciphertexts: &[T], block_size: usize) -> Option<usize> {
  ciphertexts
    .iter()
    .map(|data| max_repeat_count(data.as_ref(), block_size))
    .enumerate()
    .filter(|&(_, count)| count >= 2)
    .max_by_key(|&(_, count)| count)
    .map(|(index, _)| index)
}

/// Guesses whether an oracle encrypts in ECB or CBC mode.
///
/// Sends four blocks of the same byte. Whatever the oracle adds in front,
/// at least three of them end up block-aligned; under ECB those encrypt to
/// the same ciphertext block, under CBC they (almost surely) don't.
pub fn guess_mode<O: EncryptOracle + ?Sized>(oracle: &mut O, block_size: usize) -> Result<Mode> {
  if block_size == 0 {
    return Err(Error::BlockSize(block_size));
  }
  let ciphertext = oracle.encrypt(&vec![FILLER; block_size * 4])?;
  let count = max_repeat_count(&ciphertext, block_size);
  debug!(count, "largest repeated block count");

  if count >= 2 {
    Ok(Mode::Ecb)
  } else {
    Ok(Mode::Cbc)
  }
}
