use crate::cipher::BlockCipher;
use crate::{pkcs7, Error, Result};

/// Electronic codebook: every block goes through the cipher on its own.
///
/// Equal plaintext blocks give equal ciphertext blocks under one key, which is
/// all the byte-at-a-time attack needs.
pub struct Ecb<C> {
  cipher: C,
}

impl<C: BlockCipher> Ecb<C> {
  pub fn new(cipher: C) -> Ecb<C> {
    Ecb { cipher }
  }

  pub fn block_size(&self) -> usize {
    self.cipher.block_size()
  }

  /// Pads and encrypts.
  pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
    let bsize = self.block_size();
    let padded = pkcs7::pad(plaintext, bsize)?;
    let mut ret = vec![0; padded.len()];

    for (dst, src) in ret.chunks_exact_mut(bsize).zip(padded.chunks_exact(bsize)) {
      self.cipher.encrypt_block(dst, src)?;
    }
    Ok(ret)
  }

  /// Decrypts without removing padding; see pkcs7::strip().
  pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let bsize = self.block_size();
    if bsize == 0 {
      return Err(Error::BlockSize(bsize));
    }
    if ciphertext.len() % bsize != 0 {
      return Err(Error::Length {
        len: ciphertext.len(),
        block_len: bsize,
      });
    }

    let mut ret = vec![0; ciphertext.len()];
    for (dst, src) in ret.chunks_exact_mut(bsize).zip(ciphertext.chunks_exact(bsize)) {
      self.cipher.decrypt_block(dst, src)?;
    }
    Ok(ret)
  }
}
