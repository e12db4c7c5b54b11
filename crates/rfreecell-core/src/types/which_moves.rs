//! 非可逆手のクラス別カウンタ
//!
//! ファンデーションへ置かれたカードは二度と戻らないため、その種の手は
//! 探索グラフの連結成分（可逆手のみで互いに到達できる極大集合）の境界を
//! 越える。成分の識別には「どのクラスの非可逆手が何回起きたか」の
//! カウンタベクトルを使う。クラスはカードIDそのもの（52種）で、各カードは
//! 高々一度しかファンデーションに到達しないためカウンタは2bitで足りる。

/// カウンタのバイト長（52クラス × 2bit）
pub const WHICH_MOVES_LEN: usize = 13;

const NUM_CLASSES: usize = 52;

/// 非可逆手カウンタ（2bitレーン × 52）
///
/// 派生経路に沿って成分ごとの加算で単調非減少。レーン総和が
/// 初期配置からの非可逆手数（成分深度）に一致する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WhichMoves([u8; WHICH_MOVES_LEN]);

impl WhichMoves {
    #[inline]
    pub const fn zero() -> WhichMoves {
        WhichMoves([0; WHICH_MOVES_LEN])
    }

    /// バイト列から復元（長さ不一致は `None`）
    pub fn from_bytes(bytes: &[u8]) -> Option<WhichMoves> {
        let arr: [u8; WHICH_MOVES_LEN] = bytes.try_into().ok()?;
        Some(WhichMoves(arr))
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; WHICH_MOVES_LEN] {
        &self.0
    }

    #[inline]
    fn lane(&self, class: usize) -> u8 {
        (self.0[class >> 2] >> ((class & 3) * 2)) & 0x3
    }

    #[inline]
    fn set_lane(&mut self, class: usize, value: u8) {
        let shift = (class & 3) * 2;
        let byte = &mut self.0[class >> 2];
        *byte = (*byte & !(0x3 << shift)) | ((value & 0x3) << shift);
    }

    /// クラス `class` のカウンタを1進める（3で飽和）
    pub fn bump(&mut self, class: usize) {
        debug_assert!(class < NUM_CLASSES);
        let v = self.lane(class);
        if v < 3 {
            self.set_lane(class, v + 1);
        }
    }

    /// レーンごとの加算（3で飽和）
    pub fn add(&mut self, other: &WhichMoves) {
        for class in 0..NUM_CLASSES {
            let sum = self.lane(class) + other.lane(class);
            self.set_lane(class, sum.min(3));
        }
    }

    /// レーン総和
    pub fn total(&self) -> u32 {
        (0..NUM_CLASSES).map(|c| self.lane(c) as u32).sum()
    }

    /// すべてのレーンで `self >= other` か
    pub fn covers(&self, other: &WhichMoves) -> bool {
        (0..NUM_CLASSES).all(|c| self.lane(c) >= other.lane(c))
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}
