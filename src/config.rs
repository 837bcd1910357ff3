use serde::Deserialize;
use std::path::Path;

use crate::error::AppError;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DbConfig,
    #[serde(default)]
    pub user: UserConfig,
    /// 大学・学部・学科の初期データ. `seed` で DB に取り込む.
    #[serde(rename = "school", default)]
    pub schools: Vec<SchoolSeed>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct UserConfig {
    /// `--user` を省略したときのプロフィール id.
    pub id: Option<i64>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SchoolSeed {
    pub name: String,
    #[serde(rename = "faculty", default)]
    pub faculties: Vec<FacultySeed>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct FacultySeed {
    pub name: String,
    #[serde(rename = "department", default)]
    pub departments: Vec<DepartmentSeed>,
}

/// 日付は "M/D" か "M-D". 未発表なら省略する.
#[derive(Deserialize, Clone, Debug)]
pub struct DepartmentSeed {
    pub name: String,
    pub application_period_start: Option<String>,
    pub application_period_end: Option<String>,
    pub exam_date: Option<String>,
    pub result_date: Option<String>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "admission.db".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("failed to parse {:?}: {}", path, e)))?;
        Ok(config)
    }

    /// ファイルがなければ既定値. 読めるのに壊れている場合はエラー.
    pub fn load_or_default(path: &Path) -> Result<Self, AppError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }
}
