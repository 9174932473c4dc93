//! Frame checksums
//!
//! Headers are protected by a CRC-16 and payloads by a CRC-32. Both are
//! computed bit by bit without a lookup table. Neither applies a final XOR,
//! so the value returned for one range can seed the next one.

/// Seed for header checksums
pub const CRC16_START: u16 = 0xA281;

/// Seed for payload checksums
pub const CRC32_START: u32 = 0xFFFF_FFFF;

/// Reflected form of the CRC-16 polynomial 0x8005
const CRC16_POLY: u16 = 0xA001;

/// Reflected form of the CRC-32 polynomial 0x04C11DB7
const CRC32_POLY: u32 = 0xEDB8_8320;

/// Compute the CRC-16 of `data`, continuing from `crc`
pub fn crc16(crc: u16, data: &[u8]) -> u16 {
    let mut crc = crc;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC16_POLY
            } else {
                crc >> 1
            };
        }
    }
    crc
}

/// Compute the CRC-32 of `data`, continuing from `crc`
pub fn crc32(crc: u32, data: &[u8]) -> u32 {
    let mut crc = crc;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC32_POLY
            } else {
                crc >> 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK: &[u8] = b"123456789";

    #[test]
    fn test_crc16_check_values() {
        // CRC-16/ARC and CRC-16/MODBUS share this polynomial
        assert_eq!(crc16(0x0000, CHECK), 0xBB3D);
        assert_eq!(crc16(0xFFFF, CHECK), 0x4B37);
    }

    #[test]
    fn test_crc32_check_value() {
        // No output inversion, so this is the CRC-32/JAMCRC check value
        assert_eq!(crc32(CRC32_START, CHECK), 0x340B_C6D9);
        assert_eq!(!crc32(CRC32_START, CHECK), 0xCBF4_3926);
    }

    #[test]
    fn test_empty_input_returns_seed() {
        assert_eq!(crc16(CRC16_START, &[]), CRC16_START);
        assert_eq!(crc32(CRC32_START, &[]), CRC32_START);
    }

    #[test]
    fn test_incremental() {
        let data: [u8; 64] = core::array::from_fn(|i| (i * 7 + 3) as u8);
        for split in [0, 1, 10, 33, 63, 64] {
            let (a, b) = data.split_at(split);
            assert_eq!(crc16(crc16(CRC16_START, a), b), crc16(CRC16_START, &data));
            assert_eq!(crc32(crc32(CRC32_START, a), b), crc32(CRC32_START, &data));
        }
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let header = [0xDE, 0xC0, 0xAD, 0xDE, 0x32, 0x00, 0x10, 0x02, 0x00, 0x00];
        let good16 = crc16(CRC16_START, &header);
        let good32 = crc32(CRC32_START, &header);
        for byte in 0..header.len() {
            for bit in 0..8 {
                let mut corrupt = header;
                corrupt[byte] ^= 1 << bit;
                assert_ne!(crc16(CRC16_START, &corrupt), good16, "byte {} bit {}", byte, bit);
                assert_ne!(crc32(CRC32_START, &corrupt), good32, "byte {} bit {}", byte, bit);
            }
        }
    }
}
