//! Attacks that only ever talk to an oracle.
pub mod bitflip;
pub mod cutpaste;
pub mod detect;
pub mod ecb;
pub mod padding;

pub use self::bitflip::BitFlip;
pub use self::cutpaste::CutAndPaste;
pub use self::detect::{detect_ecb, guess_mode};
pub use self::ecb::{EcbAttack, LengthProbe, PrefixAligned};
pub use self::padding::PaddingAttack;
