//! # 位流分帧
//!
//! 帧 = 固定位宽的长度头部 (载荷字节数，MSB 优先) + 载荷的全部位 (每个字节内 MSB 优先)。
//! 使用长度前缀而不是终止符，载荷中出现任何字节模式都不会产生歧义，
//! 容量检查也只需一次算术运算。

use crate::constants::{BITS_PER_BYTE, DEFAULT_HEADER_BITS, MAX_HEADER_BITS};
use crate::error::{Result, StegoError};

/// 帧格式的编码器与解码器。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framer {
    header_bits: u8,
}

impl Default for Framer {
    fn default() -> Self {
        Self {
            header_bits: DEFAULT_HEADER_BITS,
        }
    }
}

impl Framer {
    /// # Errors
    ///
    /// `header_bits` 不在 1..=64 之内时返回 `InvalidHeaderWidth`。
    pub fn new(header_bits: u8) -> Result<Self> {
        if !(1..=MAX_HEADER_BITS).contains(&header_bits) {
            return Err(StegoError::InvalidHeaderWidth(header_bits));
        }
        Ok(Self { header_bits })
    }

    pub fn header_bits(&self) -> u8 {
        self.header_bits
    }

    /// 头部可以表示的最大载荷长度 (字节)。
    pub fn max_payload_len(&self) -> u64 {
        u64::MAX >> (MAX_HEADER_BITS - self.header_bits)
    }

    /// 长度为 `payload_len` 的载荷分帧后的总位数。
    ///
    /// # Errors
    ///
    /// 长度超出头部表示范围，或总位数溢出 `u64` 时返回 `PayloadTooLarge`。
    pub fn frame_len(&self, payload_len: u64) -> Result<u64> {
        let too_large = || StegoError::PayloadTooLarge {
            len: payload_len,
            header_bits: self.header_bits,
            max: self.max_payload_len(),
        };
        if payload_len > self.max_payload_len() {
            return Err(too_large());
        }
        payload_len
            .checked_mul(BITS_PER_BYTE)
            .and_then(|bits| bits.checked_add(u64::from(self.header_bits)))
            .ok_or_else(too_large)
    }

    /// 将载荷编码为帧位流。
    pub fn frame(&self, payload: &[u8]) -> Result<Vec<bool>> {
        let len = payload.len() as u64;
        let total = self.frame_len(len)?;

        let mut bits = Vec::with_capacity(total as usize);
        bits.extend((0..self.header_bits).rev().map(|i| (len >> i) & 1 == 1));
        bits.extend(
            payload
                .iter()
                .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1)),
        );

        Ok(bits)
    }

    /// 从位流开头读取长度头部，只消耗头部所占的位。
    ///
    /// # Errors
    ///
    /// 位流不足一个头部时返回 `TruncatedStream`。
    pub fn read_header<I>(&self, bits: &mut I) -> Result<u64>
    where
        I: Iterator<Item = bool>,
    {
        let needed = u64::from(self.header_bits);
        let mut declared = 0u64;
        for read in 0..needed {
            let bit = bits.next().ok_or(StegoError::TruncatedStream {
                needed,
                available: read,
            })?;
            declared = (declared << 1) | u64::from(bit);
        }
        Ok(declared)
    }

    /// 在头部之后读取恰好 `declared` 个字节，不多消耗任何位。
    ///
    /// # Errors
    ///
    /// 位流提前结束时返回 `TruncatedStream`，其中的位数包含头部。
    pub fn read_payload<I>(&self, declared: u64, bits: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = bool>,
    {
        let needed = self.frame_len(declared)?;
        let mut bits = bits.into_iter();
        let mut available = u64::from(self.header_bits);

        let mut payload = Vec::new();
        for _ in 0..declared {
            let mut byte = 0u8;
            for _ in 0..BITS_PER_BYTE {
                let bit = bits
                    .next()
                    .ok_or(StegoError::TruncatedStream { needed, available })?;
                byte = (byte << 1) | u8::from(bit);
                available += 1;
            }
            payload.push(byte);
        }

        Ok(payload)
    }

    /// 解析完整的帧，返回载荷。
    pub fn unframe<I>(&self, bits: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = bool>,
    {
        let mut bits = bits.into_iter();
        let declared = self.read_header(&mut bits)?;
        self.read_payload(declared, bits)
    }
}
