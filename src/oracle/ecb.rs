use rand::{CryptoRng, Rng, RngCore};

use super::{EncryptOracle, Mode};
use crate::cbc::Cbc;
use crate::cipher::Aes;
use crate::ecb::Ecb;
use crate::{pkcs7, Error, Result};

fn random_key<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Aes> {
  Aes::new(&rng.gen::<[u8; 16]>())
}

/// Encrypts `input || secret` under AES-ECB with a key fixed at construction.
pub struct EcbSuffixOracle {
  ecb: Ecb<Aes>,
  secret: Vec<u8>,
}

impl EcbSuffixOracle {
  pub fn new<R: RngCore + CryptoRng>(rng: &mut R, secret: &[u8]) -> Result<EcbSuffixOracle> {
    Ok(EcbSuffixOracle {
      ecb: Ecb::new(random_key(rng)?),
      secret: secret.to_vec(),
    })
  }

  pub fn with_key(key: &[u8], secret: &[u8]) -> Result<EcbSuffixOracle> {
    Ok(EcbSuffixOracle {
      ecb: Ecb::new(Aes::new(key)?),
      secret: secret.to_vec(),
    })
  }
}

impl EncryptOracle for EcbSuffixOracle {
  fn encrypt(&mut self, input: &[u8]) -> Result<Vec<u8>> {
    let data = [input, &self.secret[..]].concat();
    self.ecb.encrypt(&data)
  }
}

/// Like EcbSuffixOracle, but prepends some random bytes to the controlled part.
///
/// The prefix is drawn once, so its length is fixed for the life of the oracle.
pub struct PrefixedEcbOracle {
  prefix: Vec<u8>,
  oracle: EcbSuffixOracle,
}

impl PrefixedEcbOracle {
  pub fn new<R: RngCore + CryptoRng>(rng: &mut R, secret: &[u8]) -> Result<PrefixedEcbOracle> {
    let len = rng.gen_range(1..48);
    PrefixedEcbOracle::with_prefix_len(rng, secret, len)
  }

  pub fn with_prefix_len<R: RngCore + CryptoRng>(
    rng: &mut R,
    secret: &[u8],
    len: usize,
  ) -> Result<PrefixedEcbOracle> {
    let mut prefix = vec![0; len];
    rng.fill_bytes(&mut prefix);
    let oracle = EcbSuffixOracle::new(rng, secret)?;
    Ok(PrefixedEcbOracle { prefix, oracle })
  }

  #[cfg(test)]
  pub(crate) fn prefix_len(&self) -> usize {
    self.prefix.len()
  }
}

impl EncryptOracle for PrefixedEcbOracle {
  fn encrypt(&mut self, input: &[u8]) -> Result<Vec<u8>> {
    let combined = [&self.prefix[..], input].concat();
    self.oracle.encrypt(&combined)
  }
}

/// Encrypts under ECB or CBC, chosen at random when the oracle is built.
///
/// Every call wraps the input in 5 to 10 random bytes on each side; CBC calls
/// also use a fresh IV, which is not part of the output.
pub struct ModeOracle<R> {
  rng: R,
  mode: Mode,
  key: [u8; 16],
}

impl<R: RngCore + CryptoRng> ModeOracle<R> {
  pub fn new(mut rng: R) -> ModeOracle<R> {
    let mode = if rng.gen() { Mode::Ecb } else { Mode::Cbc };
    ModeOracle::with_mode(rng, mode)
  }

  pub fn with_mode(mut rng: R, mode: Mode) -> ModeOracle<R> {
    let key = rng.gen();
    ModeOracle { rng, mode, key }
  }

  /// The mode actually in use, so that guesses can be checked.
  pub fn mode(&self) -> Mode {
    self.mode
  }

  fn affix(&mut self) -> Vec<u8> {
    let mut bytes = vec![0; self.rng.gen_range(5..=10)];
    self.rng.fill_bytes(&mut bytes);
    bytes
  }
}

impl<R: RngCore + CryptoRng> EncryptOracle for ModeOracle<R> {
  fn encrypt(&mut self, input: &[u8]) -> Result<Vec<u8>> {
    let prefix = self.affix();
    let suffix = self.affix();
    let data = [&prefix[..], input, &suffix[..]].concat();
    let aes = Aes::new(&self.key)?;

    match self.mode {
      Mode::Ecb => Ecb::new(aes).encrypt(&data),
      Mode::Cbc => {
        let iv: [u8; 16] = self.rng.gen();
        Cbc::new(aes).encrypt(&iv, &data)
      }
    }
  }
}

//
// For ECB cut-and-paste: user profiles as `k=v&…` strings.
// https://cryptopals.com/sets/2/challenges/13
//
pub const PROFILE_HEAD: &[u8] = b"email=";

/// Encodes a profile, eating the metacharacters ‘&’ and ‘=’ from the address.
pub fn encode_profile(email: &[u8], uid: u32, role: &[u8]) -> Vec<u8> {
  let mut ret = PROFILE_HEAD.to_vec();
  ret.extend(email.iter().filter(|&&b| b != b'&' && b != b'='));
  ret.extend_from_slice(format!("&uid={}&role=", uid).as_bytes());
  ret.extend_from_slice(role);
  ret
}

/// Splits `foo=bar&baz=qux` into its key/value pairs.
pub fn parse_query(query: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
  query
    .split(|&b| b == b'&')
    .map(|field| {
      let mut kv = field.split(|&b| b == b'=');
      match (kv.next(), kv.next(), kv.next()) {
        (Some(key), Some(val), None) => Ok((key.to_vec(), val.to_vec())),
        _ => Err(Error::Field(String::from_utf8_lossy(field).into_owned())),
      }
    })
    .collect()
}

/// Hands out encrypted user profiles under a fixed ECB key.
pub struct ProfileOracle {
  ecb: Ecb<Aes>,
  uid: u32,
}

impl ProfileOracle {
  pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Result<ProfileOracle> {
    Ok(ProfileOracle {
      ecb: Ecb::new(random_key(rng)?),
      uid: 10,
    })
  }

  /// Takes an address, returns the encrypted profile of a plain user.
  pub fn profile_for(&self, email: &[u8]) -> Result<Vec<u8>> {
    self.ecb.encrypt(&encode_profile(email, self.uid, b"user"))
  }

  /// Decrypts a profile back into its fields.
  pub fn decode(&self, ciphertext: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    let padded = self.ecb.decrypt(ciphertext)?;
    parse_query(pkcs7::strip(&padded, self.ecb.block_size())?)
  }

  /// Takes an encrypted profile, searches for ‘role=admin’.
  pub fn is_role_admin(&self, ciphertext: &[u8]) -> Result<bool> {
    Ok(
      self
        .decode(ciphertext)?
        .iter()
        .any(|(key, val)| key == b"role" && val == b"admin"),
    )
  }
}

impl EncryptOracle for ProfileOracle {
  fn encrypt(&mut self, email: &[u8]) -> Result<Vec<u8>> {
    self.profile_for(email)
  }
}
