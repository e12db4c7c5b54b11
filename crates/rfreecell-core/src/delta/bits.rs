//! 固定長バッファへのビット単位書き込み・読み出し

use super::codec::ENCODED_LEN;

/// ビット書き込み（MSBファースト）
pub(super) struct BitWriter {
    buf: [u8; ENCODED_LEN],
    bit: usize,
}

impl BitWriter {
    pub(super) fn new() -> BitWriter {
        BitWriter { buf: [0; ENCODED_LEN], bit: 0 }
    }

    /// 下位 `nbits` ビットを書き込む
    ///
    /// バッファを超える書き込みは符号化の内部不変条件違反であり panic する。
    pub(super) fn push(&mut self, value: u32, nbits: u32) {
        debug_assert!(nbits <= 32);
        debug_assert!(nbits == 32 || value < (1u32 << nbits));
        assert!(
            self.bit + nbits as usize <= ENCODED_LEN * 8,
            "state encoding overflow: {} bits", self.bit + nbits as usize
        );
        for i in (0..nbits).rev() {
            let b = (value >> i) & 1;
            if b != 0 {
                self.buf[self.bit / 8] |= 0x80 >> (self.bit % 8);
            }
            self.bit += 1;
        }
    }

    pub(super) fn finish(self) -> [u8; ENCODED_LEN] {
        self.buf
    }
}

/// ビット読み出し（`BitWriter` と同じ順序）
pub(super) struct BitReader<'a> {
    buf: &'a [u8; ENCODED_LEN],
    bit: usize,
}

impl<'a> BitReader<'a> {
    pub(super) fn new(buf: &'a [u8; ENCODED_LEN]) -> BitReader<'a> {
        BitReader { buf, bit: 0 }
    }

    pub(super) fn pull(&mut self, nbits: u32) -> u32 {
        debug_assert!(nbits <= 32);
        assert!(self.bit + nbits as usize <= ENCODED_LEN * 8, "state decoding overrun");
        let mut value = 0u32;
        for _ in 0..nbits {
            let b = (self.buf[self.bit / 8] >> (7 - self.bit % 8)) & 1;
            value = (value << 1) | b as u32;
            self.bit += 1;
        }
        value
    }
}
