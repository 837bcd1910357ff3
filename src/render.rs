use chrono::{Datelike, NaiveDate};

use crate::academic::academic_start_year;
use crate::dashboard::Dashboard;
use crate::db::{Department, Faculty, School};
use crate::schedule::{CellCategory, NormalizedSchedule, UniversityScheduleRecord};
use crate::status::ApplicationStatus;

/// 行頭の登録 id 欄の幅.
const ID_WIDTH: usize = 6;

/// ダッシュボード全体をテキストにする.
pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let today = dashboard.today();
    let mut text = format!(
        "AdmissionPlanner  ログイン中: {}\n基準日: {} ({}年度)\n\n",
        dashboard.user_name().unwrap_or("-"),
        today.format("%Y-%m-%d"),
        academic_start_year(today),
    );

    let records = dashboard.records();
    if records.is_empty() {
        text.push_str("登録されている大学はありません。\n");
        return text;
    }

    text.push_str("大学 / 受験方式\n");
    for record in records {
        text.push_str(&sidebar_entry(record, today));
    }
    text.push('\n');

    let grid = dashboard.grid();
    text.push_str(&" ".repeat(ID_WIDTH));
    text.push_str(&month_ruler(&grid.axis));
    text.push('\n');
    for (record, row) in records.iter().zip(&grid.rows) {
        text.push_str(&format!("{:>width$} ", record.enrollment_id, width = ID_WIDTH - 1));
        text.extend(row.iter().map(CellCategory::glyph));
        text.push('\n');
    }
    text.push('\n');

    text.push_str(&legend());
    text.push('\n');
    text.push_str(&status_summary(records));
    text.push('\n');
    text
}

fn sidebar_entry(record: &UniversityScheduleRecord, today: NaiveDate) -> String {
    let dates = match NormalizedSchedule::from_record(record, today) {
        Some(s) => format!(
            "出願 {}〜{} / 試験 {} / 発表 {}",
            s.window_start, s.window_end, s.exam, s.result
        ),
        None => "日程未確定".to_string(),
    };
    format!(
        "  #{} {} {} {} {}\n      {}\n",
        record.enrollment_id,
        record.school_name,
        record.faculty_name,
        record.department_name,
        record.status.badge(),
        dates,
    )
}

/// 各月 1 日の位置に月の数字を置いた目盛り.
fn month_ruler(axis: &[NaiveDate]) -> String {
    let mut ruler = vec![' '; axis.len()];
    for (i, date) in axis.iter().enumerate() {
        if date.day() != 1 {
            continue;
        }
        for (j, ch) in date.month().to_string().chars().enumerate() {
            if let Some(slot) = ruler.get_mut(i + j) {
                *slot = ch;
            }
        }
    }
    ruler.into_iter().collect()
}

pub fn legend() -> String {
    CellCategory::LEGEND
        .iter()
        .map(|c| format!("{} {}", c.glyph(), c.label()))
        .collect::<Vec<_>>()
        .join("  ")
}

fn status_summary(records: &[UniversityScheduleRecord]) -> String {
    ApplicationStatus::ALL
        .iter()
        .map(|status| {
            let count = records.iter().filter(|r| r.status == *status).count();
            format!("{} {}", status.label(), count)
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

pub fn render_school_list(schools: &[School]) -> String {
    if schools.is_empty() {
        return "登録されている大学はありません。\n".to_string();
    }
    schools
        .iter()
        .map(|s| format!("{:>4}  {}\n", s.id, s.name))
        .collect()
}

/// 大学の学部・学科と, 保存されている日付断片をそのまま並べる.
pub fn render_school_detail(school: &School, faculties: &[(Faculty, Vec<Department>)]) -> String {
    let mut text = format!("{}\n", school.name);
    if faculties.is_empty() {
        text.push_str("  (学部なし)\n");
        return text;
    }
    for (faculty, departments) in faculties {
        text.push_str(&format!("  {}\n", faculty.name));
        for dept in departments {
            text.push_str(&format!(
                "    {}  出願 {}〜{}  試験 {}  発表 {}\n",
                dept.name,
                or_unknown(&dept.application_period_start),
                or_unknown(&dept.application_period_end),
                or_unknown(&dept.exam_date),
                or_unknown(&dept.result_date),
            ));
        }
    }
    text
}

fn or_unknown(fragment: &Option<String>) -> &str {
    fragment.as_deref().unwrap_or("未定")
}
