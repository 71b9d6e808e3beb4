//! ULID ベースの識別子
//!
//! - `instance_id()`: プロセス起動ごとに1つ（ログと `/livez` に出す）
//! - `EvaluationId`: 採点1回ごとに1つ（レスポンスとログの突き合わせ用）

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

static INSTANCE_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// このプロセスの ID（初回アクセス時に生成）
#[inline]
pub fn instance_id() -> &'static str {
    &INSTANCE_ID
}

/// 採点結果の ID。ULID なので文字列順 = 生成順。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationId(String);

impl EvaluationId {
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
