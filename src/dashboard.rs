use chrono::NaiveDate;

use crate::error::AppError;
use crate::schedule::{ScheduleGrid, UniversityScheduleRecord};

/// ダッシュボードから見た保存先. 削除だけを要求する.
pub trait EnrollmentStore {
    /// 削除できたら true, 該当行がなければ false.
    fn delete_enrollment(&self, enrollment_id: i64) -> anyhow::Result<bool>;
}

/// 1 ユーザー分の志望校一覧と, 表示の基準日.
pub struct Dashboard {
    user_name: Option<String>,
    records: Vec<UniversityScheduleRecord>,
    today: NaiveDate,
}

impl Dashboard {
    pub fn new(
        user_name: Option<String>,
        records: Vec<UniversityScheduleRecord>,
        today: NaiveDate,
    ) -> Self {
        Self {
            user_name,
            records,
            today,
        }
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn records(&self) -> &[UniversityScheduleRecord] {
        &self.records
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// このユーザーの登録でなければ `NotFound`.
    pub fn ensure_enrollment(&self, enrollment_id: i64) -> Result<(), AppError> {
        if self.records.iter().any(|r| r.enrollment_id == enrollment_id) {
            Ok(())
        } else {
            Err(AppError::NotFound {
                kind: "enrollment",
                name: enrollment_id.to_string(),
            })
        }
    }

    /// 表示のたびに組み立て直す. キャッシュはしない.
    pub fn grid(&self) -> ScheduleGrid {
        ScheduleGrid::build(&self.records, self.today)
    }

    /// 保存先での削除が成功したときだけ一覧から外す.
    pub fn delete(&mut self, store: &impl EnrollmentStore, enrollment_id: i64) -> bool {
        match store.delete_enrollment(enrollment_id) {
            Ok(true) => {
                self.records.retain(|r| r.enrollment_id != enrollment_id);
                tracing::info!(enrollment_id, "Enrollment deleted");
                true
            }
            Ok(false) => {
                tracing::warn!(enrollment_id, "Enrollment not found in store");
                false
            }
            Err(e) => {
                tracing::error!(enrollment_id, error = %e, "Failed to delete enrollment");
                false
            }
        }
    }
}
