//! K線粒度定義模組 - 從 config/granularities.toml 編譯時生成
//!
//! 內部儲存只保存 1 分鐘K線，其它粒度一律需要向券商取得。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// 包含由 build.rs 生成的粒度宏定義
include!(concat!(env!("OUT_DIR"), "/granularities_generated.rs"));

/// 無法識別的粒度名稱
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown interval '{0}'")]
pub struct UnknownGranularity(pub String);

/// 生成粒度枚舉的內部宏
macro_rules! generate_granularity_enum {
    ($(($variant:ident, $name:literal, $minutes:literal, $display:literal)),*) => {
        /// K線粒度
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Granularity {
            $(
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl Granularity {
            /// 對外使用的區間名稱 (如 "1minute")
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(
                        Granularity::$variant => $name,
                    )*
                }
            }

            /// 每根K線涵蓋的分鐘數
            pub fn minutes(&self) -> u32 {
                match self {
                    $(
                        Granularity::$variant => $minutes,
                    )*
                }
            }

            /// 獲取顯示名稱
            pub fn display_name(&self) -> &'static str {
                match self {
                    $(
                        Granularity::$variant => $display,
                    )*
                }
            }

            /// 獲取所有粒度列表
            pub fn all() -> Vec<Granularity> {
                vec![
                    $(
                        Granularity::$variant,
                    )*
                ]
            }
        }

        impl FromStr for Granularity {
            type Err = UnknownGranularity;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(
                        $name => Ok(Granularity::$variant),
                    )*
                    other => Err(UnknownGranularity(other.to_string())),
                }
            }
        }
    };
}

granularities!(generate_granularity_enum);

impl Granularity {
    /// 內部儲存唯一支援的粒度
    pub fn is_one_minute(&self) -> bool {
        *self == Granularity::OneMinute
    }

    /// 以逗號分隔列出所有可用名稱，用於錯誤訊息
    pub fn valid_names() -> String {
        Self::all()
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::OneMinute
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
