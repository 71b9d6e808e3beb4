use std::collections::HashSet;

use rand::Rng;
use tracing::debug;

use crate::{dimension::Dimension, question::Question};

/// 設問バンクから重複なしでランダムに `min..=max` 問を選ぶ
///
/// - ID で重複排除（先勝ち）
/// - `min` / `max` は `[1, プールサイズ]` にクランプ（プールより多く要求されても
///   エラーにせず、出せるだけ出す）
/// - Fisher-Yates でシャッフルして先頭 `count` 件を返す
pub fn select_questions<'a, D, R>(
    bank: &'a [Question<D>],
    min_count: usize,
    max_count: usize,
    rng: &mut R,
) -> Vec<&'a Question<D>>
where
    D: Dimension,
    R: Rng + ?Sized,
{
    let mut seen = HashSet::new();
    let mut pool: Vec<&Question<D>> = bank
        .iter()
        .filter(|question| seen.insert(question.id.as_str()))
        .collect();

    if pool.is_empty() {
        return Vec::new();
    }

    let pool_size = pool.len();
    let mut lower = min_count.clamp(1, pool_size);
    let mut upper = max_count.clamp(1, pool_size);
    if lower > upper {
        std::mem::swap(&mut lower, &mut upper);
    }
    if min_count > pool_size {
        debug!(
            requested = min_count,
            pool_size, "question pool smaller than requested minimum; clamping"
        );
    }

    let count = if lower == upper {
        lower
    } else {
        rng.gen_range(lower..=upper)
    };

    for i in (1..pool_size).rev() {
        let j = rng.gen_range(0..=i);
        pool.swap(i, j);
    }

    pool.truncate(count);
    pool
}
