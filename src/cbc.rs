//
// CBC mode, using only the raw block cipher as primitive.
// https://cryptopals.com/sets/2/challenges/10
//
use crate::bytes::xor_zip;
use crate::cipher::BlockCipher;
use crate::{pkcs7, Error, Result};

/// One encryption or decryption pass.
///
/// Owns the chaining buffer, which starts out as the IV and afterwards always
/// holds the last *ciphertext* block seen, in both directions. The whole-message
/// methods consume the session so it cannot leak into another pass.
pub struct CbcSession<'a, C: ?Sized> {
  cipher: &'a C,
  prev: Vec<u8>,
}

impl<'a, C: BlockCipher + ?Sized> CbcSession<'a, C> {
  pub fn new(cipher: &'a C, iv: &[u8]) -> Result<CbcSession<'a, C>> {
    let block_len = cipher.block_size();
    if block_len == 0 {
      return Err(Error::BlockSize(block_len));
    }
    if iv.len() != block_len {
      return Err(Error::IvLength {
        len: iv.len(),
        block_len,
      });
    }
    Ok(CbcSession {
      cipher,
      prev: iv.to_vec(),
    })
  }

  /// The chaining block the next call will use.
  pub fn prev(&self) -> &[u8] {
    &self.prev
  }

  pub fn encrypt_block(&mut self, block: &[u8]) -> Result<Vec<u8>> {
    self.check_len(block)?;
    let mut input = block.to_vec();
    xor_zip(&mut input, &self.prev);

    let mut out = vec![0; block.len()];
    self.cipher.encrypt_block(&mut out, &input)?;
    self.prev.copy_from_slice(&out);
    Ok(out)
  }

  pub fn decrypt_block(&mut self, block: &[u8]) -> Result<Vec<u8>> {
    self.check_len(block)?;
    let mut out = vec![0; block.len()];
    self.cipher.decrypt_block(&mut out, block)?;
    xor_zip(&mut out, &self.prev);
    self.prev.copy_from_slice(block);
    Ok(out)
  }

  /// Pads and encrypts a whole message.
  pub fn encrypt(mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
    let padded = pkcs7::pad(plaintext, self.prev.len())?;
    let mut ret = Vec::with_capacity(padded.len());
    for block in padded.chunks_exact(self.prev.len()) {
      ret.extend(self.encrypt_block(block)?);
    }
    Ok(ret)
  }

  /// Decrypts a whole message. Padding is left in place.
  pub fn decrypt(mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let bsize = self.prev.len();
    if ciphertext.len() % bsize != 0 {
      return Err(Error::Length {
        len: ciphertext.len(),
        block_len: bsize,
      });
    }
    let mut ret = Vec::with_capacity(ciphertext.len());
    for block in ciphertext.chunks_exact(bsize) {
      ret.extend(self.decrypt_block(block)?);
    }
    Ok(ret)
  }

  fn check_len(&self, block: &[u8]) -> Result<()> {
    if block.len() != self.prev.len() {
      return Err(Error::Length {
        len: block.len(),
        block_len: self.prev.len(),
      });
    }
    Ok(())
  }
}

/// A block cipher in CBC mode; every call opens a fresh session.
pub struct Cbc<C> {
  cipher: C,
}

impl<C: BlockCipher> Cbc<C> {
  pub fn new(cipher: C) -> Cbc<C> {
    Cbc { cipher }
  }

  pub fn block_size(&self) -> usize {
    self.cipher.block_size()
  }

  pub fn session(&self, iv: &[u8]) -> Result<CbcSession<'_, C>> {
    CbcSession::new(&self.cipher, iv)
  }

  pub fn encrypt(&self, iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    self.session(iv)?.encrypt(plaintext)
  }

  pub fn decrypt(&self, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    self.session(iv)?.decrypt(ciphertext)
  }
}

#[cfg(test)]
mod test {
  use super::{Cbc, CbcSession};
  use crate::cipher::Aes;
  use crate::{pkcs7, Error};

  const KEY: &[u8] = b"This is 16 bytes";
  const IV: &[u8] = b"\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0a\x0b\x0c\x0d\x0e\x0f";
  const PLAINTEXTS: &[&[u8]] = &[
    b"My name is Ozymandias, King of Kings;\n\
      Look on my Works, ye Mighty, and despair!",
    b"0123456789abcdef",
    b"",
  ];

  #[test]
  fn encryption() {
    use openssl::symm::{encrypt, Cipher};
    let cbc = Cbc::new(Aes::new(KEY).unwrap());

    for &plaintext in PLAINTEXTS {
      let expected = encrypt(Cipher::aes_128_cbc(), KEY, Some(IV), plaintext).unwrap();
      assert_eq!(cbc.encrypt(IV, plaintext).unwrap(), expected);
    }
  }

  #[test]
  fn decryption_keeps_padding() {
    use openssl::symm::{encrypt, Cipher};
    let cbc = Cbc::new(Aes::new(KEY).unwrap());

    for &plaintext in PLAINTEXTS {
      let ciphertext = encrypt(Cipher::aes_128_cbc(), KEY, Some(IV), plaintext).unwrap();
      let decrypted = cbc.decrypt(IV, &ciphertext).unwrap();
      assert_eq!(decrypted, pkcs7::pad(plaintext, 16).unwrap());
    }
  }

  #[test]
  fn chaining_tracks_ciphertext() {
    let aes = Aes::new(KEY).unwrap();
    let plaintext = b"YELLOW SUBMARINEYELLOW SUBMARINE";

    let mut enc = CbcSession::new(&aes, IV).unwrap();
    assert_eq!(enc.prev(), IV);
    let c1 = enc.encrypt_block(&plaintext[..16]).unwrap();
    assert_eq!(enc.prev(), &c1[..]);
    let c2 = enc.encrypt_block(&plaintext[16..]).unwrap();
    assert_eq!(enc.prev(), &c2[..]);
    // Same plaintext, different ciphertext: that's the chaining.
    assert_ne!(c1, c2);

    let mut dec = CbcSession::new(&aes, IV).unwrap();
    assert_eq!(dec.decrypt_block(&c1).unwrap(), &plaintext[..16]);
    assert_eq!(dec.prev(), &c1[..]);
    assert_eq!(dec.decrypt_block(&c2).unwrap(), &plaintext[16..]);
    assert_eq!(dec.prev(), &c2[..]);
  }

  #[test]
  fn errors() {
    let aes = Aes::new(KEY).unwrap();
    assert!(matches!(
      CbcSession::new(&aes, b"short"),
      Err(Error::IvLength { len: 5, block_len: 16 })
    ));

    let cbc = Cbc::new(Aes::new(KEY).unwrap());
    assert!(matches!(
      cbc.decrypt(IV, &[0; 31]),
      Err(Error::Length { len: 31, block_len: 16 })
    ));

    let mut session = cbc.session(IV).unwrap();
    assert!(matches!(
      session.encrypt_block(&[0; 15]),
      Err(Error::Length { len: 15, .. })
    ));
    // A rejected block leaves the chain alone.
    assert_eq!(session.prev(), IV);
  }

  #[test]
  fn bit_flip_propagation() {
    let cbc = Cbc::new(Aes::new(KEY).unwrap());
    let plaintext = b"AAAAAAAAAAAAAAAABBBBBBBBBBBBBBBB";
    let mut ciphertext = cbc.encrypt(IV, plaintext).unwrap();

    ciphertext[3] ^= 0x01;
    let decrypted = cbc.decrypt(IV, &ciphertext).unwrap();
    assert_ne!(&decrypted[..16], &plaintext[..16]);
    assert_eq!(&decrypted[16..32], b"BBBCBBBBBBBBBBBB");
  }
}
