//
// PKCS#7 padding and its validation.
// https://cryptopals.com/sets/2/challenges/9
// https://cryptopals.com/sets/2/challenges/15
//
use crate::{Error, Result};

fn check_block_len(block_len: usize) -> Result<u8> {
  match block_len {
    1..=255 => Ok(block_len as u8),
    _ => Err(Error::BlockSize(block_len)),
  }
}

/// Pads ‘data’ to a multiple of ‘block_len’.
///
/// Input that is already aligned gets a whole extra block, so the result is
/// always strictly longer than the input.
pub fn pad(data: &[u8], block_len: usize) -> Result<Vec<u8>> {
  check_block_len(block_len)?;
  let pad_len = block_len - data.len() % block_len;
  let mut ret = Vec::with_capacity(data.len() + pad_len);
  ret.extend_from_slice(data);
  ret.resize(data.len() + pad_len, pad_len as u8);
  Ok(ret)
}

/// Returns the length of the PKCS#7 padding at the end of ‘data’.
pub fn padding_len(data: &[u8], block_len: usize) -> Result<usize> {
  check_block_len(block_len)?;

  if data.is_empty() || data.len() % block_len != 0 {
    return Err(Error::Length {
      len: data.len(),
      block_len,
    });
  }

  // Cannot fail: data is not empty.
  let value = data[data.len() - 1];
  let n = value as usize;

  if n == 0 || n > block_len {
    return Err(Error::Range { value, block_len });
  }

  let start = data.len() - n;
  for (i, &b) in data[start..].iter().enumerate() {
    if b != value {
      return Err(Error::PaddingMismatch {
        offset: start + i,
        found: b,
        expected: value,
      });
    }
  }
  Ok(n)
}

/// Validates and removes PKCS#7 padding.
pub fn strip(data: &[u8], block_len: usize) -> Result<&[u8]> {
  let n = padding_len(data, block_len)?;
  Ok(&data[..data.len() - n])
}

#[cfg(test)]
mod test {
  use super::{pad, padding_len, strip};
  use crate::Error;

  #[test]
  fn padding() {
    assert_eq!(pad(b"01", 2).unwrap(), b"01\x02\x02");
    assert_eq!(pad(b"ABC", 6).unwrap(), b"ABC\x03\x03\x03");
    assert_eq!(
      pad(b"YELLOW SUBMARINE", 20).unwrap(),
      b"YELLOW SUBMARINE\x04\x04\x04\x04"
    );
  }

  #[test]
  fn aligned_gets_full_block() {
    assert_eq!(pad(b"", 4).unwrap(), b"\x04\x04\x04\x04");
    let padded = pad(b"YELLOW SUBMARINE", 16).unwrap();
    assert_eq!(padded.len(), 32);
    assert!(padded[16..].iter().all(|&b| b == 16));
    assert_eq!(pad(b"x", 1).unwrap(), b"x\x01");
  }

  #[test]
  fn bad_block_len() {
    assert!(matches!(pad(b"x", 0), Err(Error::BlockSize(0))));
    assert!(matches!(pad(b"x", 256), Err(Error::BlockSize(256))));
    assert!(matches!(strip(b"x", 0), Err(Error::BlockSize(0))));
  }

  #[test]
  fn round_trip() {
    let data: Vec<u8> = (0..=64).collect();
    for len in 0..data.len() {
      for &block_len in &[1, 2, 7, 8, 16, 255] {
        let padded = pad(&data[..len], block_len).unwrap();
        assert_eq!(padded.len() % block_len, 0);
        assert_eq!(strip(&padded, block_len).unwrap(), &data[..len]);
      }
    }
  }

  #[test]
  fn validation() {
    assert_eq!(
      strip(b"ICE ICE BABY\x04\x04\x04\x04", 16).unwrap(),
      b"ICE ICE BABY"
    );
    assert!(matches!(
      strip(b"ICE ICE BABY\x05\x05\x05\x05", 16),
      Err(Error::PaddingMismatch {
        offset: 11,
        found: b'Y',
        expected: 5
      })
    ));
    assert!(matches!(
      strip(b"ICE ICE BABY\x01\x02\x03\x04", 16),
      Err(Error::PaddingMismatch { offset: 12, .. })
    ));
    assert!(matches!(
      strip(b"ICE ICE BABY\x00\x00\x00\x00", 16),
      Err(Error::Range { value: 0, .. })
    ));
    assert!(matches!(
      strip(b"ICE ICE BABY\x11\x11\x11\x11", 16),
      Err(Error::Range { value: 17, .. })
    ));
  }

  #[test]
  fn lengths() {
    assert!(matches!(
      strip(b"", 16),
      Err(Error::Length { len: 0, .. })
    ));
    assert!(matches!(
      strip(b"ICE ICE BABY\x04\x04\x04", 16),
      Err(Error::Length { len: 15, .. })
    ));
  }

  #[test]
  fn every_padding_byte_checked() {
    let padded = pad(b"abcde", 8).unwrap();
    assert_eq!(padding_len(&padded, 8).unwrap(), 3);
    for i in 5..8 {
      let mut broken = padded.clone();
      broken[i] ^= 0x40;
      assert!(strip(&broken, 8).is_err(), "corrupted byte {} accepted", i);
    }
    for i in 5..7 {
      let mut broken = padded.clone();
      broken[i] ^= 0x40;
      assert!(matches!(
        strip(&broken, 8),
        Err(Error::PaddingMismatch { .. })
      ));
    }
  }

  #[test]
  fn full_padding_block() {
    let block = [8u8; 8];
    assert_eq!(strip(&block, 8).unwrap(), b"");
  }
}
