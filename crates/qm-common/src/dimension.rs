use std::{collections::BTreeMap, fmt::Debug, hash::Hash};

/// 割り算のガード用の最小分母
pub const MIN_DENOMINATOR: f64 = 1e-9;

/// クイズ領域ごとの評価軸（閉じた enum で実装する）
///
/// `ALL` の並び順がそのまま決定論的なタイブレーク順になる。
pub trait Dimension: Copy + Ord + Eq + Hash + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    /// API / ログで使う安定キー（camelCase）
    fn key(self) -> &'static str;

    /// 表示名
    fn label(self) -> &'static str;

    /// 軸の上側に寄ったときのタグ
    fn high_label(self) -> &'static str;

    /// 軸の下側に寄ったときのタグ
    fn low_label(self) -> &'static str;

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|dim| dim.key() == key)
    }
}

pub type DimensionMap<D> = BTreeMap<D, f64>;

/// 評価軸の値域。中立値と最大ギャップはここから導出する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionScale {
    pub min: f64,
    pub max: f64,
}

impl DimensionScale {
    pub const ZERO_TO_TEN: Self = Self {
        min: 0.0,
        max: 10.0,
    };

    pub const ZERO_TO_HUNDRED: Self = Self {
        min: 0.0,
        max: 100.0,
    };

    pub fn span(&self) -> f64 {
        (self.max - self.min).max(MIN_DENOMINATOR)
    }

    /// 回答が一件もない軸のフォールバック値（中点）
    pub fn neutral(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// 全軸を `value` で埋めたマップ
pub fn filled<D: Dimension>(value: f64) -> DimensionMap<D> {
    D::ALL.iter().map(|dim| (*dim, value)).collect()
}

/// API 向けに軸キーを文字列化する
pub fn keyed<D: Dimension>(map: &DimensionMap<D>) -> BTreeMap<String, f64> {
    map.iter()
        .map(|(dim, value)| (dim.key().to_string(), *value))
        .collect()
}

/// 静的データ定義用: `&[(D, f64)]` から軸マップを作る
pub fn vector<D: Dimension>(pairs: &[(D, f64)]) -> DimensionMap<D> {
    pairs.iter().copied().collect()
}
