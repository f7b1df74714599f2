//
// Byte-at-a-time ECB decryption.
// https://cryptopals.com/sets/2/challenges/12
// https://cryptopals.com/sets/2/challenges/14
//
use tracing::{debug, trace};

use crate::bytes::{max_repeat_count, nth_block};
use crate::oracle::EncryptOracle;
use crate::{Error, Result};

// The byte value to use when breaking ECB. I used to use 0u8, but then
// oracles that URL-quote their input end up mangling it. So we choose a
// safer one.
pub const FILLER: u8 = b'A';

/// What the length of the oracle's output gives away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthProbe {
  pub block_size: usize,
  /// How many bytes the oracle adds around the attacker's input.
  pub hidden_len: usize,
}

/// Recovers what an ECB oracle appends to attacker input.
#[derive(Debug, Clone)]
pub struct EcbAttack {
  pub filler: u8,
  /// Give up on finding the block size after this many bytes of input.
  pub max_block_size: usize,
}

impl Default for EcbAttack {
  fn default() -> EcbAttack {
    EcbAttack {
      filler: FILLER,
      max_block_size: 256,
    }
  }
}

impl EcbAttack {
  /// Grows the input one byte at a time until the output grows.
  ///
  /// The size of the jump is the block size. Since PKCS#7 always adds at
  /// least one byte, the jump happens exactly when input plus hidden data
  /// fill whole blocks, which gives away the hidden length too.
  pub fn probe<O: EncryptOracle + ?Sized>(&self, oracle: &mut O) -> Result<LengthProbe> {
    let base = oracle.encrypt(&[])?.len();
    let mut input = Vec::new();

    for k in 1..=self.max_block_size {
      input.push(self.filler);
      let len = oracle.encrypt(&input)?.len();

      if len > base {
        let block_size = len - base;
        let hidden_len = base
          .checked_sub(k)
          .ok_or(Error::BlockSizeNotFound { probed: k })?;
        debug!(block_size, hidden_len, "probed oracle lengths");
        return Ok(LengthProbe {
          block_size,
          hidden_len,
        });
      }
    }

    Err(Error::BlockSizeNotFound {
      probed: self.max_block_size,
    })
  }

  /// Whether three blocks of filler come back with a repeated block.
  ///
  /// Three blocks always contain two whole aligned ones, wherever the input
  /// starts.
  pub fn is_ecb<O: EncryptOracle + ?Sized>(&self, oracle: &mut O, block_size: usize) -> Result<bool> {
    if block_size == 0 {
      return Err(Error::BlockSize(block_size));
    }
    let ciphertext = oracle.encrypt(&vec![self.filler; block_size * 3])?;
    Ok(max_repeat_count(&ciphertext, block_size) >= 2)
  }

  /// Recovers the secret behind an `input || secret` oracle.
  pub fn recover<O: EncryptOracle + ?Sized>(&self, oracle: &mut O) -> Result<Vec<u8>> {
    // (1) Discover the block size of the cipher, and how much secret there is.
    let probe = self.probe(oracle)?;

    // (2) Detect that the function is using ECB.
    if !self.is_ecb(oracle, probe.block_size)? {
      return Err(Error::NotEcb);
    }

    self.recover_with(oracle, probe)
  }

  /// Byte-by-byte recovery, once block size and secret length are known.
  pub fn recover_with<O: EncryptOracle + ?Sized>(
    &self,
    oracle: &mut O,
    probe: LengthProbe,
  ) -> Result<Vec<u8>> {
    if probe.block_size == 0 {
      return Err(Error::BlockSize(0));
    }
    let mut known = Vec::with_capacity(probe.hidden_len);

    while known.len() < probe.hidden_len {
      let byte = self.recover_byte(oracle, probe.block_size, &known)?;
      trace!(position = known.len(), byte, "recovered secret byte");
      known.push(byte);
    }

    debug!(len = known.len(), "recovered ECB secret");
    Ok(known)
  }

  fn recover_byte<O: EncryptOracle + ?Sized>(
    &self,
    oracle: &mut O,
    bsize: usize,
    known: &[u8],
  ) -> Result<u8> {
    let position = known.len();
    let index = position / bsize;

    // (3) Knowing the block size and how many bytes we've uncovered, craft
    // an input that leaves the next unknown byte last in block ‘index’.
    let mut input = vec![self.filler; bsize - 1 - position % bsize];
    let want = oracle.encrypt(&input)?;
    let want = nth_block(&want, bsize, index)
      .ok_or(Error::AmbiguousOracle {
        position,
        matches: 0,
      })?
      .to_vec();

    // (4) Feed every possible last byte and compare the same block. The
    // known bytes make the rest of that block identical.
    input.extend_from_slice(known);
    input.push(0);
    let last = input.len() - 1;

    let mut found = None;
    let mut matches = 0;

    for c in 0..=255 {
      input[last] = c;
      let have = oracle.encrypt(&input)?;
      if nth_block(&have, bsize, index) == Some(&want[..]) {
        matches += 1;
        found.get_or_insert(c);
      }
    }

    // (5) A permutation maps exactly one candidate onto the target block.
    match found {
      Some(byte) if matches == 1 => Ok(byte),
      _ => Err(Error::AmbiguousOracle { position, matches }),
    }
  }

  /// Finds out the length of a fixed prefix the oracle puts before the input.
  pub fn prefix_len<O: EncryptOracle + ?Sized>(&self, oracle: &mut O, block_size: usize) -> Result<usize> {
    if block_size == 0 {
      return Err(Error::BlockSize(block_size));
    }
    // Once we find two equal ECB blocks, we need to re-verify using a
    // different fill byte. Otherwise, our result would be incorrect if the
    // prefix or the secret matched our fill.
    let other = self.filler.wrapping_add(1);

    for pad in 0..block_size {
      let len = pad + block_size * 2;
      let a = oracle.encrypt(&vec![self.filler; len])?;
      let b = oracle.encrypt(&vec![other; len])?;

      if let Some(index) = twin_blocks(&a, &b, block_size) {
        let prefix_len = (index * block_size)
          .checked_sub(pad)
          .ok_or(Error::NotEcb)?;
        debug!(prefix_len, "found oracle prefix");
        return Ok(prefix_len);
      }
    }

    Err(Error::NotEcb)
  }

  /// Recovers the secret behind an `prefix || input || secret` oracle whose
  /// prefix never changes length.
  pub fn recover_prefixed<O: EncryptOracle + ?Sized>(&self, oracle: &mut O) -> Result<Vec<u8>> {
    let probe = self.probe(oracle)?;
    if !self.is_ecb(oracle, probe.block_size)? {
      return Err(Error::NotEcb);
    }

    let prefix_len = self.prefix_len(oracle, probe.block_size)?;
    let secret_len = probe
      .hidden_len
      .checked_sub(prefix_len)
      .ok_or(Error::NotEcb)?;

    let mut aligned = PrefixAligned::new(oracle, prefix_len, probe.block_size, self.filler)?;
    self.recover_with(
      &mut aligned,
      LengthProbe {
        block_size: probe.block_size,
        hidden_len: secret_len,
      },
    )
  }
}

/// First index where both ciphertexts repeat a block, and the repeated block
/// differs between them (i.e. it is made of our filler).
fn twin_blocks(a: &[u8], b: &[u8], bsize: usize) -> Option<usize> {
  let blocks = a.len().min(b.len()) / bsize;
  (0..blocks.saturating_sub(1)).find(|&i| {
    let a0 = nth_block(a, bsize, i);
    let b0 = nth_block(b, bsize, i);
    a0 == nth_block(a, bsize, i + 1) && b0 == nth_block(b, bsize, i + 1) && a0 != b0
  })
}

/// Makes a prefixed oracle look like a plain `input || secret` one.
///
/// Pads the prefix up to a block boundary with filler, and strips that many
/// bytes from every answer.
pub struct PrefixAligned<'a, O: ?Sized> {
  oracle: &'a mut O,
  fill: Vec<u8>,
  skip: usize,
  block_size: usize,
}

impl<'a, O: EncryptOracle + ?Sized> PrefixAligned<'a, O> {
  pub fn new(
    oracle: &'a mut O,
    prefix_len: usize,
    block_size: usize,
    filler: u8,
  ) -> Result<PrefixAligned<'a, O>> {
    if block_size == 0 {
      return Err(Error::BlockSize(block_size));
    }
    let pad = (block_size - prefix_len % block_size) % block_size;
    Ok(PrefixAligned {
      oracle,
      fill: vec![filler; pad],
      skip: prefix_len + pad,
      block_size,
    })
  }
}

impl<O: EncryptOracle + ?Sized> EncryptOracle for PrefixAligned<'_, O> {
  fn encrypt(&mut self, input: &[u8]) -> Result<Vec<u8>> {
    let data = [&self.fill[..], input].concat();
    let mut ciphertext = self.oracle.encrypt(&data)?;

    if ciphertext.len() < self.skip {
      return Err(Error::Length {
        len: ciphertext.len(),
        block_len: self.block_size,
      });
    }
    ciphertext.drain(..self.skip);
    Ok(ciphertext)
  }
}

#[cfg(test)]
mod test {
  use super::{EcbAttack, LengthProbe};
  use crate::cbc::Cbc;
  use crate::cipher::Aes;
  use crate::oracle::ecb::{EcbSuffixOracle, PrefixedEcbOracle};
  use crate::{Error, Result};
  use indoc::indoc;
  use rand::rngs::StdRng;
  use rand::{Rng, SeedableRng};

  fn rollin() -> Vec<u8> {
    crate::decode_base64(indoc!(
      b"
        Um9sbGluJyBpbiBteSA1LjAKV2l0aCBteSByYWctdG9wIGRvd24gc28gbXkg
        aGFpciBjYW4gYmxvdwpUaGUgZ2lybGllcyBvbiBzdGFuZGJ5IHdhdmluZyBq
        dXN0IHRvIHNheSBoaQpEaWQgeW91IHN0b3A/IE5vLCBJIGp1c3QgZHJvdmUg
        YnkK"
    ))
    .unwrap()
  }

  #[test]
  fn probe_lengths() {
    let attack = EcbAttack::default();
    let secret: Vec<u8> = (0..40).collect();
    for len in 0..secret.len() {
      let mut oracle = EcbSuffixOracle::with_key(b"YELLOW SUBMARINE", &secret[..len]).unwrap();
      assert_eq!(
        attack.probe(&mut oracle).unwrap(),
        LengthProbe {
          block_size: 16,
          hidden_len: len
        }
      );
    }
  }

  #[test]
  fn probe_gives_up() {
    let attack = EcbAttack {
      max_block_size: 8,
      ..EcbAttack::default()
    };
    let mut constant = |_: &[u8]| -> Result<Vec<u8>> { Ok(vec![0; 32]) };
    assert!(matches!(
      attack.probe(&mut constant),
      Err(Error::BlockSizeNotFound { probed: 8 })
    ));
  }

  #[test]
  fn admin_suffix() {
    crate::init_logging();
    let mut oracle = EcbSuffixOracle::new(&mut rand::thread_rng(), b"admin=true").unwrap();
    let secret = EcbAttack::default().recover(&mut oracle).unwrap();
    assert_eq!(secret, b"admin=true");
  }

  #[test]
  fn rollin_suffix() {
    let plaintext = rollin();
    let mut oracle = EcbSuffixOracle::new(&mut rand::thread_rng(), &plaintext).unwrap();
    assert_eq!(EcbAttack::default().recover(&mut oracle).unwrap(), plaintext);
  }

  #[test]
  fn block_aligned_and_empty_secrets() {
    let mut rng = StdRng::seed_from_u64(12);
    let secrets: [&[u8]; 3] = [b"", b"YELLOW SUBMARINE", b"\x00\x01\x02\xff\xfe"];
    for secret in &secrets {
      let mut oracle = EcbSuffixOracle::new(&mut rng, secret).unwrap();
      assert_eq!(EcbAttack::default().recover(&mut oracle).unwrap(), *secret);
    }
  }

  #[test]
  fn secret_full_of_filler() {
    let secret = vec![b'A'; 40];
    let mut oracle = EcbSuffixOracle::with_key(b"YELLOW SUBMARINE", &secret).unwrap();
    assert_eq!(EcbAttack::default().recover(&mut oracle).unwrap(), secret);
  }

  #[test]
  fn rejects_cbc() {
    let cbc = Cbc::new(Aes::new(b"YELLOW SUBMARINE").unwrap());
    let mut rng = StdRng::seed_from_u64(5);
    let mut oracle = |input: &[u8]| -> Result<Vec<u8>> {
      let iv: [u8; 16] = rng.gen();
      cbc.encrypt(&iv, &[input, &b"secret"[..]].concat())
    };
    assert!(matches!(
      EcbAttack::default().recover(&mut oracle),
      Err(Error::NotEcb)
    ));
  }

  #[test]
  fn ambiguous_oracle() {
    // Looks like ECB (all blocks equal) but every guess matches.
    let mut oracle = |input: &[u8]| -> Result<Vec<u8>> { Ok(vec![0; 16 * ((input.len() + 5) / 16 + 1)]) };
    assert!(matches!(
      EcbAttack::default().recover(&mut oracle),
      Err(Error::AmbiguousOracle {
        position: 0,
        matches: 256
      })
    ));
  }

  #[test]
  fn no_match() {
    // A new key on every call: the target block never shows up again.
    let mut rng = StdRng::seed_from_u64(6);
    let mut oracle = |input: &[u8]| -> Result<Vec<u8>> {
      let ecb = crate::ecb::Ecb::new(Aes::new(&rng.gen::<[u8; 16]>())?);
      ecb.encrypt(&[input, &b"abc"[..]].concat())
    };
    let probe = LengthProbe {
      block_size: 16,
      hidden_len: 3,
    };
    assert!(matches!(
      EcbAttack::default().recover_with(&mut oracle, probe),
      Err(Error::AmbiguousOracle {
        position: 0,
        matches: 0
      })
    ));
  }

  #[test]
  fn prefix_lengths() {
    let mut rng = StdRng::seed_from_u64(13);
    let attack = EcbAttack::default();
    for len in 0..=40 {
      let mut oracle = PrefixedEcbOracle::with_prefix_len(&mut rng, b"some secret", len).unwrap();
      assert_eq!(attack.prefix_len(&mut oracle, 16).unwrap(), oracle.prefix_len());
    }
  }

  #[test]
  fn prefix_made_of_filler() {
    let ecb = crate::ecb::Ecb::new(Aes::new(b"YELLOW SUBMARINE").unwrap());
    let mut oracle = |input: &[u8]| -> Result<Vec<u8>> {
      ecb.encrypt(&[&[b'A'; 21][..], input, &[b'A'; 34][..]].concat())
    };
    assert_eq!(EcbAttack::default().prefix_len(&mut oracle, 16).unwrap(), 21);
  }

  #[test]
  fn prefixed_secret() {
    crate::init_logging();
    let secret = b"admin=true;the quick brown fox jumps over";
    let mut oracle = PrefixedEcbOracle::new(&mut rand::thread_rng(), secret).unwrap();
    assert_eq!(
      EcbAttack::default().recover_prefixed(&mut oracle).unwrap(),
      secret
    );
  }
}
