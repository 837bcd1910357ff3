use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// 志望校ごとの出願状況.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplicationStatus {
    #[default]
    Considering,
    Applied,
    Scheduled,
    Completed,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        Self::Considering,
        Self::Applied,
        Self::Scheduled,
        Self::Completed,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::Considering => "検討中",
            Self::Applied => "出願済み",
            Self::Scheduled => "試験予定",
            Self::Completed => "完了",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Considering => "considering",
            Self::Applied => "applied",
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
        }
    }

    /// サイドバー表示用のバッジ.
    pub fn badge(&self) -> String {
        format!("[{}]", self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "considering" => Ok(Self::Considering),
            "applied" => Ok(Self::Applied),
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            other => Err(AppError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
        assert_eq!(
            " Applied ".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Applied
        );
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = "withdrawn".parse::<ApplicationStatus>().unwrap_err();
        assert!(matches!(err, AppError::InvalidStatus(ref s) if s == "withdrawn"));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ApplicationStatus::default(), ApplicationStatus::Considering);
        assert_eq!(ApplicationStatus::Applied.badge(), "[出願済み]");
        assert_eq!(ApplicationStatus::Completed.label(), "完了");
    }
}
