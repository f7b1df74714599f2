use openssl::symm::{Cipher, Crypter, Mode};

use crate::{Error, Result};

/// A keyed permutation over fixed-size blocks.
///
/// Implementations transform exactly one block per call; chaining and padding
/// belong to the modes built on top.
pub trait BlockCipher {
  fn block_size(&self) -> usize;

  /// Encrypts ‘src’ into ‘dst’. Both must be exactly one block long.
  fn encrypt_block(&self, dst: &mut [u8], src: &[u8]) -> Result<()>;

  /// Decrypts ‘src’ into ‘dst’. Both must be exactly one block long.
  fn decrypt_block(&self, dst: &mut [u8], src: &[u8]) -> Result<()>;
}

/// AES, one block at a time.
///
/// OpenSSL only ever sees single blocks in ECB mode with its own padding
/// turned off, so all chaining and padding happen in this crate.
pub struct Aes {
  cipher: Cipher,
  key: Vec<u8>,
}

impl Aes {
  pub const BLOCK_SIZE: usize = 16;

  pub fn new(key: &[u8]) -> Result<Aes> {
    let cipher = match key.len() {
      16 => Cipher::aes_128_ecb(),
      24 => Cipher::aes_192_ecb(),
      32 => Cipher::aes_256_ecb(),
      n => return Err(Error::KeyLength(n)),
    };
    Ok(Aes {
      cipher,
      key: key.to_vec(),
    })
  }

  fn crypt(&self, mode: Mode, dst: &mut [u8], src: &[u8]) -> Result<()> {
    let bsize = self.cipher.block_size();
    for len in &[src.len(), dst.len()] {
      if *len != bsize {
        return Err(Error::Length {
          len: *len,
          block_len: bsize,
        });
      }
    }

    let mut crypt = Crypter::new(self.cipher, mode, &self.key, None)?;
    crypt.pad(false);

    // Crypter::update() wants room for one extra block.
    let mut buf = vec![0; bsize * 2];
    let mut n = crypt.update(src, &mut buf)?;
    n += crypt.finalize(&mut buf[n..])?;

    if n != bsize {
      return Err(Error::Length {
        len: n,
        block_len: bsize,
      });
    }
    dst.copy_from_slice(&buf[..n]);
    Ok(())
  }
}

impl BlockCipher for Aes {
  fn block_size(&self) -> usize {
    self.cipher.block_size()
  }

  fn encrypt_block(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
    self.crypt(Mode::Encrypt, dst, src)
  }

  fn decrypt_block(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
    self.crypt(Mode::Decrypt, dst, src)
  }
}
