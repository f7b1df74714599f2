//! ECB and CBC built from a bare block cipher, PKCS#7, and the classic
//! oracle attacks against them: byte-at-a-time ECB decryption, ECB
//! cut-and-paste, CBC bit-flipping, and the CBC padding oracle.
use data_encoding::BASE64;
use lazy_static::lazy_static;

pub mod attack;
pub mod bytes;
pub mod cbc;
pub mod cipher;
pub mod ecb;
mod error;
pub mod oracle;
pub mod pkcs7;

pub use crate::error::{Error, Result};

lazy_static! {
  // The default BASE64 encoding is not permissive and
  // does not accept newline characters.
  static ref BASE64_NL: data_encoding::Encoding = {
    let mut spec = BASE64.specification();
    spec.ignore.push_str(" \n");
    spec.encoding().unwrap_or_else(|_| BASE64.clone())
  };
}

/// Decodes base64, skipping any whitespace and newlines in the input.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
  Ok(BASE64_NL.decode(data)?)
}

#[cfg(test)]
pub(crate) fn init_logging() {
  let _ = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_test_writer()
    .try_init();
}
