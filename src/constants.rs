// Raffle Draw Engine - Constants

/// Mulberry32 state increment
pub const MULBERRY32_INCREMENT: u32 = 0x6D2B_79F5;

/// 2^32, divisor normalizing a u32 into [0, 1)
pub const U32_RANGE: f64 = 4_294_967_296.0;

/// Fresh seeds are drawn from [0, MAX_SEED)
pub const MAX_SEED: u32 = 0x7FFF_FFFF;

/// Number of hex characters of the SHA-256 digest kept for display
pub const CHECKSUM_PREFIX_LEN: usize = 16;

/// Default delimiter for the winners table export
pub const DEFAULT_DELIMITER: char = ',';
