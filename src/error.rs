use thiserror::Error;

/// Everything that can go wrong in the modes, the codec and the attacks.
#[derive(Debug, Error)]
pub enum Error {
  /// Input is empty where it cannot be, or not a multiple of the block size.
  #[error("{len} bytes is not a whole number of {block_len}-byte blocks")]
  Length { len: usize, block_len: usize },

  #[error("padding value {value} outside 1..={block_len}")]
  Range { value: u8, block_len: usize },

  #[error("padding byte at offset {offset} is {found:#04x}, expected {expected:#04x}")]
  PaddingMismatch {
    offset: usize,
    found: u8,
    expected: u8,
  },

  #[error("unsupported key length: {0} bytes")]
  KeyLength(usize),

  #[error("IV is {len} bytes but blocks are {block_len}")]
  IvLength { len: usize, block_len: usize },

  /// PKCS#7 can only express block sizes that fit in a byte.
  #[error("block size {0} outside 1..=255")]
  BlockSize(usize),

  /// ECB byte search did not find exactly one candidate.
  #[error("{matches} candidates matched for secret byte {position}")]
  AmbiguousOracle { position: usize, matches: usize },

  #[error("no padding-oracle hit for block {block}, byte {position}")]
  OracleExhausted { block: usize, position: usize },

  #[error("ciphertext length never grew after {probed} bytes of input")]
  BlockSizeNotFound { probed: usize },

  #[error("oracle does not look like ECB")]
  NotEcb,

  /// A `k=v` query field without exactly one `=`.
  #[error("malformed query field {0:?}")]
  Field(String),

  #[error("cannot inject {len} bytes into a single {block_len}-byte block")]
  InjectionTooLong { len: usize, block_len: usize },

  #[error(transparent)]
  Cipher(#[from] openssl::error::ErrorStack),

  #[error(transparent)]
  Base64(#[from] data_encoding::DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
