use chrono::{Datelike, Duration, NaiveDate};

/// 年度の日数. 閏年でも 3月31日まで欠けないように 366 日とする.
pub const AXIS_LEN: usize = 366;

/// 年度は 4月始まり.
const ACADEMIC_START_MONTH: u32 = 4;

/// `today` が属する年度の開始年.
pub fn academic_start_year(today: NaiveDate) -> i32 {
    academic_year(today.year(), today)
}

/// 基準の年 `current_year` を年度に読み替える.
/// `today` が 4月以降ならそのまま, 1〜3月なら前年.
pub fn academic_year(current_year: i32, today: NaiveDate) -> i32 {
    if today.month() >= ACADEMIC_START_MONTH {
        current_year
    } else {
        current_year - 1
    }
}

/// 年度の 4月1日から 366 日分の日付列を生成する.
pub fn generate_axis(today: NaiveDate) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(academic_start_year(today), ACADEMIC_START_MONTH, 1)
        .unwrap_or(today);

    (0..AXIS_LEN as i64)
        .map(|offset| start + Duration::days(offset))
        .collect()
}

/// DB に保存された "M/D" または "M-D" 形式の日付断片を
/// 年度に合わせた "YYYY-MM-DD" に変換する.
///
/// 1〜3月の日付は翌年として扱う. 区切りがない, 月が数値でない,
/// 月が 1〜12 の範囲外のいずれかなら `None`.
/// 日は検証せずそのまま 2 桁に揃える.
pub fn normalize(fragment: Option<&str>, current_year: i32, today: NaiveDate) -> Option<String> {
    let fragment = fragment?;

    let separator = if fragment.contains('/') {
        '/'
    } else if fragment.contains('-') {
        '-'
    } else {
        tracing::debug!(fragment = %fragment, "date fragment has no separator");
        return None;
    };

    let mut parts = fragment.split(separator);
    let month_part = parts.next()?;
    let day_part = parts.next()?;

    let month: u32 = match month_part.trim().parse() {
        Ok(m) if (1..=12).contains(&m) => m,
        _ => {
            tracing::debug!(fragment = %fragment, "date fragment has an invalid month");
            return None;
        }
    };

    let base = academic_year(current_year, today);
    let year = if month <= 3 { base + 1 } else { base };

    Some(format!("{}-{:02}-{:0>2}", year, month, day_part))
}
