use chrono::{Datelike, NaiveDate};

use crate::academic::{generate_axis, normalize};
use crate::status::ApplicationStatus;

/// ダッシュボードの 1 行. (ユーザー, 大学, 学部, 学科) の登録ごとに 1 件.
/// 日付はすべて DB に保存された断片のまま ("1/27", "2-5" など).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniversityScheduleRecord {
    pub enrollment_id: i64,
    pub school_name: String,
    pub faculty_name: String,
    pub department_name: String,
    pub application_period_start: Option<String>,
    pub application_period_end: Option<String>,
    pub exam_date: Option<String>,
    pub result_date: Option<String>,
    pub status: ApplicationStatus,
}

/// セル 1 つの分類. 複数該当しても 1 つだけを選ぶ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellCategory {
    Today,
    Exam,
    Result,
    ApplicationWindow,
    None,
}

impl CellCategory {
    /// 凡例に並べる順.
    pub const LEGEND: [CellCategory; 4] = [
        Self::ApplicationWindow,
        Self::Exam,
        Self::Result,
        Self::Today,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::Today => "今日",
            Self::Exam => "試験日",
            Self::Result => "合格発表日",
            Self::ApplicationWindow => "出願期間",
            Self::None => "",
        }
    }

    /// テキスト表示で 1 セルに使う文字.
    pub fn glyph(&self) -> char {
        match self {
            Self::Today => '@',
            Self::Exam => 'X',
            Self::Result => 'R',
            Self::ApplicationWindow => '=',
            Self::None => '.',
        }
    }
}

/// 4 つの日付断片をすべて "YYYY-MM-DD" に揃えたもの.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSchedule {
    pub window_start: String,
    pub window_end: String,
    pub exam: String,
    pub result: String,
}

impl NormalizedSchedule {
    /// 1 つでも欠けている, または解釈できない断片があれば `None`.
    pub fn from_record(record: &UniversityScheduleRecord, today: NaiveDate) -> Option<Self> {
        let current_year = today.year();
        let norm = |fragment: &Option<String>| normalize(fragment.as_deref(), current_year, today);

        Some(Self {
            window_start: norm(&record.application_period_start)?,
            window_end: norm(&record.application_period_end)?,
            exam: norm(&record.exam_date)?,
            result: norm(&record.result_date)?,
        })
    }

    /// 今日以外の分類. 試験日 > 合格発表日 > 出願期間 の順に判定する.
    /// ゼロ埋めした ISO 形式なので文字列比較がそのまま日付順になる.
    pub fn category_of(&self, axis_date: NaiveDate) -> CellCategory {
        let day = iso(axis_date);

        if day == self.exam {
            CellCategory::Exam
        } else if day == self.result {
            CellCategory::Result
        } else if day >= self.window_start && day <= self.window_end {
            CellCategory::ApplicationWindow
        } else {
            CellCategory::None
        }
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn cell(schedule: Option<&NormalizedSchedule>, axis_date: NaiveDate, today: NaiveDate) -> CellCategory {
    if axis_date == today {
        return CellCategory::Today;
    }
    schedule.map_or(CellCategory::None, |s| s.category_of(axis_date))
}

/// (大学, 日付) のセルを分類する.
/// 今日が最優先で, 他の日付が同じ日に重なっても `Today` を返す.
pub fn classify(record: &UniversityScheduleRecord, axis_date: NaiveDate, today: NaiveDate) -> CellCategory {
    cell(NormalizedSchedule::from_record(record, today).as_ref(), axis_date, today)
}

/// 軸に沿って 1 行分を分類する. 断片の正規化は 1 回だけ.
pub fn classify_row(
    record: &UniversityScheduleRecord,
    axis: &[NaiveDate],
    today: NaiveDate,
) -> Vec<CellCategory> {
    let schedule = NormalizedSchedule::from_record(record, today);
    axis.iter()
        .map(|&date| cell(schedule.as_ref(), date, today))
        .collect()
}

/// 年度の軸と, 登録ごとの分類行.
#[derive(Debug, Clone)]
pub struct ScheduleGrid {
    pub today: NaiveDate,
    pub axis: Vec<NaiveDate>,
    pub rows: Vec<Vec<CellCategory>>,
}

impl ScheduleGrid {
    /// 軸の生成と分類に同じ `today` を使う.
    pub fn build(records: &[UniversityScheduleRecord], today: NaiveDate) -> Self {
        let axis = generate_axis(today);
        let rows = records
            .iter()
            .map(|record| classify_row(record, &axis, today))
            .collect();
        Self { today, axis, rows }
    }
}
