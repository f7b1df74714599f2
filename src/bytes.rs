use std::collections::HashMap;

/// Destructively applies XOR: a[i] ^= b[i].
///
/// Only the common prefix of both slices is touched; callers that care about
/// lengths check them first.
pub fn xor_zip(a: &mut [u8], b: &[u8]) {
  for (dst, &byte) in a.iter_mut().zip(b) {
    *dst ^= byte;
  }
}

/// Returns the ‘index’-th block of ‘data’, if it is there in full.
pub fn nth_block(data: &[u8], block_size: usize, index: usize) -> Option<&[u8]> {
  let beg = block_size.checked_mul(index)?;
  let end = beg.checked_add(block_size)?;
  data.get(beg..end)
}

/// How many times the most repeated block shows up in ‘data’.
pub fn max_repeat_count(data: &[u8], block_size: usize) -> usize {
  if block_size == 0 {
    return 0;
  }
  let mut counts = HashMap::new();
  for block in data.chunks_exact(block_size) {
    *counts.entry(block).or_insert(0) += 1;
  }
  counts.values().copied().max().unwrap_or(0)
}
