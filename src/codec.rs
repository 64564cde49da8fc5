//! Fixed-width length prefix: u64, big-endian regardless of host byte order.

use std::io::{Read, Write};

use crate::protocol::LEN_SIZE;
use crate::wire::{self, WireError};

pub fn encode_u64(value: u64) -> [u8; LEN_SIZE] {
    value.to_be_bytes()
}

pub fn decode_u64(bytes: [u8; LEN_SIZE]) -> u64 {
    u64::from_be_bytes(bytes)
}

/// Write a length prefix.
pub fn send_u64<W: Write + ?Sized>(stream: &mut W, value: u64) -> Result<(), WireError> {
    wire::write_all(stream, &encode_u64(value))
}

/// Read a length prefix.
pub fn recv_u64<R: Read + ?Sized>(stream: &mut R) -> Result<u64, WireError> {
    let mut bytes = [0u8; LEN_SIZE];
    wire::read_exact(stream, &mut bytes)?;
    Ok(decode_u64(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::testing::Trickle;

    #[test]
    fn test_encode_is_big_endian() {
        assert_eq!(encode_u64(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(
            encode_u64(0x0102_0304_0506_0708),
            [1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn test_decode_extremes() {
        assert_eq!(decode_u64([0; 8]), 0);
        assert_eq!(decode_u64([0xFF; 8]), u64::MAX);
        assert_eq!(decode_u64([0x80, 0, 0, 0, 0, 0, 0, 0]), 1 << 63);
    }

    #[test]
    fn test_recv_u64_over_fragmented_stream() {
        let bytes = encode_u64(5_000_000_123);
        let mut r = Trickle::new(&bytes, 3);
        assert_eq!(recv_u64(&mut r).unwrap(), 5_000_000_123);
    }

    #[test]
    fn test_recv_u64_truncated_prefix() {
        let mut r = Trickle::new(&[0, 0, 1], 8);
        assert!(matches!(recv_u64(&mut r), Err(WireError::Closed)));
    }
}
