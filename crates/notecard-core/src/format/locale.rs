use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

/// Display language for timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    /// `zh-TW`
    #[default]
    #[serde(rename = "zh-TW")]
    TraditionalChinese,
    /// `en`
    #[serde(rename = "en")]
    English,
}

impl Locale {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::TraditionalChinese => "zh-TW",
            Self::English => "en",
        }
    }

    pub(super) fn relative_days(self, days: i64) -> String {
        match self {
            Self::TraditionalChinese => match days {
                0 => "今天".to_string(),
                1 => "昨天".to_string(),
                2..=6 => format!("{days} 天前"),
                7..=29 => format!("{} 週前", days / 7),
                30..=364 => format!("{} 個月前", days / 30),
                _ => format!("{} 年前", days / 365),
            },
            Self::English => match days {
                0 => "today".to_string(),
                1 => "yesterday".to_string(),
                2..=6 => format!("{days} days ago"),
                7..=29 => plural(days / 7, "week"),
                30..=364 => plural(days / 30, "month"),
                _ => plural(days / 365, "year"),
            },
        }
    }

    pub(super) const fn created_prefix(self) -> &'static str {
        match self {
            Self::TraditionalChinese => "創建於 ",
            Self::English => "Created on ",
        }
    }

    pub(super) fn date(self, value: &DateTime<FixedOffset>) -> String {
        match self {
            Self::TraditionalChinese => value.format("%Y年%-m月%-d日").to_string(),
            Self::English => value.format("%b %-d, %Y").to_string(),
        }
    }

    pub(super) fn date_time(self, value: &DateTime<FixedOffset>) -> String {
        match self {
            Self::TraditionalChinese => {
                let period = if value.hour() < 12 { "上午" } else { "下午" };
                format!("{} {period}{}", self.date(value), value.format("%I:%M"))
            }
            Self::English => value.format("%b %-d, %Y, %I:%M %p").to_string(),
        }
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "zh-tw" | "zh-hant" | "zh" => Ok(Self::TraditionalChinese),
            "en" | "en-us" | "en-gb" => Ok(Self::English),
            other => Err(format!("Unsupported locale '{other}'. Use 'zh-TW' or 'en'.")),
        }
    }
}
