use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::DepartmentSeed;
use crate::dashboard::EnrollmentStore;
use crate::error::AppError;
use crate::schedule::UniversityScheduleRecord;
use crate::status::ApplicationStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct School {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faculty {
    pub id: i64,
    #[allow(dead_code)]
    pub school_id: i64,
    pub name: String,
}

/// 学科. 日付は "M/D" 形式の断片のまま保存する.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: i64,
    #[allow(dead_code)]
    pub faculty_id: i64,
    pub name: String,
    pub application_period_start: Option<String>,
    pub application_period_end: Option<String>,
    pub exam_date: Option<String>,
    pub result_date: Option<String>,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn init(path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000; PRAGMA foreign_keys=ON;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS profiles (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS schools (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS faculties (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                school_id   INTEGER NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
                name        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(school_id, name)
            );

            CREATE TABLE IF NOT EXISTS departments (
                id                        INTEGER PRIMARY KEY AUTOINCREMENT,
                faculty_id                INTEGER NOT NULL REFERENCES faculties(id) ON DELETE CASCADE,
                name                      TEXT NOT NULL,
                application_period_start  TEXT,
                application_period_end    TEXT,
                exam_date                 TEXT,
                result_date               TEXT,
                created_at                TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(faculty_id, name)
            );

            CREATE TABLE IF NOT EXISTS user_universities (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id        INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                school_id      INTEGER NOT NULL REFERENCES schools(id),
                faculty_id     INTEGER NOT NULL REFERENCES faculties(id),
                department_id  INTEGER NOT NULL REFERENCES departments(id),
                status         TEXT NOT NULL DEFAULT 'considering'
                               CHECK (status IN ('considering', 'applied', 'scheduled', 'completed')),
                created_at     TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_user_universities ON user_universities(user_id);
            ",
        )?;

        Ok(Self { conn })
    }

    /// プロフィールを作成して id を返す. メールアドレスが重複していればエラー.
    pub fn register_profile(&self, name: &str, email: &str) -> anyhow::Result<i64> {
        self.conn.execute(
            "INSERT INTO profiles (name, email) VALUES (?1, ?2)",
            params![name, email],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn profile_name(&self, user_id: i64) -> anyhow::Result<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM profiles WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    pub fn upsert_school(&self, name: &str) -> anyhow::Result<i64> {
        self.conn.execute(
            "INSERT INTO schools (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM schools WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn upsert_faculty(&self, school_id: i64, name: &str) -> anyhow::Result<i64> {
        self.conn.execute(
            "INSERT INTO faculties (school_id, name) VALUES (?1, ?2)
             ON CONFLICT(school_id, name) DO NOTHING",
            params![school_id, name],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM faculties WHERE school_id = ?1 AND name = ?2",
            params![school_id, name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 学科を登録する. 既にあれば日付だけ更新する.
    pub fn upsert_department(&self, faculty_id: i64, seed: &DepartmentSeed) -> anyhow::Result<i64> {
        self.conn.execute(
            "INSERT INTO departments (faculty_id, name, application_period_start,
                                      application_period_end, exam_date, result_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(faculty_id, name) DO UPDATE SET
               application_period_start = excluded.application_period_start,
               application_period_end = excluded.application_period_end,
               exam_date = excluded.exam_date,
               result_date = excluded.result_date",
            params![
                faculty_id,
                seed.name,
                seed.application_period_start,
                seed.application_period_end,
                seed.exam_date,
                seed.result_date,
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM departments WHERE faculty_id = ?1 AND name = ?2",
            params![faculty_id, seed.name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 大学名の完全一致検索 (前後の空白は除く).
    pub fn find_school_by_name(&self, name: &str) -> anyhow::Result<Option<School>> {
        let school = self
            .conn
            .query_row(
                "SELECT id, name FROM schools WHERE name = ?1",
                params![name.trim()],
                |row| {
                    Ok(School {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(school)
    }

    pub fn list_schools(&self) -> anyhow::Result<Vec<School>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM schools ORDER BY name")?;
        let schools = stmt
            .query_map([], |row| {
                Ok(School {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(schools)
    }

    pub fn faculties_of(&self, school_id: i64) -> anyhow::Result<Vec<Faculty>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, school_id, name FROM faculties WHERE school_id = ?1 ORDER BY name",
        )?;
        let faculties = stmt
            .query_map(params![school_id], |row| {
                Ok(Faculty {
                    id: row.get(0)?,
                    school_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(faculties)
    }

    pub fn departments_of(&self, faculty_id: i64) -> anyhow::Result<Vec<Department>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, faculty_id, name, application_period_start, application_period_end,
                    exam_date, result_date
             FROM departments WHERE faculty_id = ?1 ORDER BY name",
        )?;
        let departments = stmt
            .query_map(params![faculty_id], |row| {
                Ok(Department {
                    id: row.get(0)?,
                    faculty_id: row.get(1)?,
                    name: row.get(2)?,
                    application_period_start: row.get(3)?,
                    application_period_end: row.get(4)?,
                    exam_date: row.get(5)?,
                    result_date: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(departments)
    }

    /// 大学 → 学部 → 学科 の順に名前で探す.
    /// 学部はその大学の, 学科はその学部のものに限る. 見つからなかった段階を `NotFound` で返す.
    pub fn resolve_target(
        &self,
        school: &str,
        faculty: &str,
        department: &str,
    ) -> anyhow::Result<(School, Faculty, Department)> {
        let (faculty, department) = (faculty.trim(), department.trim());

        let school = self
            .find_school_by_name(school)?
            .ok_or_else(|| AppError::NotFound {
                kind: "school",
                name: school.trim().to_string(),
            })?;

        let faculty = self
            .faculties_of(school.id)?
            .into_iter()
            .find(|f| f.name == faculty)
            .ok_or_else(|| AppError::NotFound {
                kind: "faculty",
                name: faculty.to_string(),
            })?;

        let department = self
            .departments_of(faculty.id)?
            .into_iter()
            .find(|d| d.name == department)
            .ok_or_else(|| AppError::NotFound {
                kind: "department",
                name: department.to_string(),
            })?;

        Ok((school, faculty, department))
    }

    /// 志望校を登録して登録 id を返す.
    pub fn enroll(
        &self,
        user_id: i64,
        school_id: i64,
        faculty_id: i64,
        department_id: i64,
        status: ApplicationStatus,
    ) -> anyhow::Result<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO user_universities (user_id, school_id, faculty_id, department_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user_id, school_id, faculty_id, department_id, status.as_str(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// ダッシュボード用に大学・学部・学科を結合した行を返す (登録順).
    pub fn schedule_records(&self, user_id: i64) -> anyhow::Result<Vec<UniversityScheduleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT uu.id, s.name, f.name, d.name,
                    d.application_period_start, d.application_period_end,
                    d.exam_date, d.result_date, uu.status
             FROM user_universities uu
             JOIN schools s ON s.id = uu.school_id
             JOIN faculties f ON f.id = uu.faculty_id
             JOIN departments d ON d.id = uu.department_id
             WHERE uu.user_id = ?1
             ORDER BY uu.id",
        )?;

        let records = stmt
            .query_map(params![user_id], |row| {
                let status: String = row.get(8)?;
                let status = status.parse::<ApplicationStatus>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e))
                })?;
                Ok(UniversityScheduleRecord {
                    enrollment_id: row.get(0)?,
                    school_name: row.get(1)?,
                    faculty_name: row.get(2)?,
                    department_name: row.get(3)?,
                    application_period_start: row.get(4)?,
                    application_period_end: row.get(5)?,
                    exam_date: row.get(6)?,
                    result_date: row.get(7)?,
                    status,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// 出願状況を更新する. 該当行がなければ false.
    pub fn set_status(&self, enrollment_id: i64, status: ApplicationStatus) -> anyhow::Result<bool> {
        let affected = self.conn.execute(
            "UPDATE user_universities SET status = ?2 WHERE id = ?1",
            params![enrollment_id, status.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// 志望校の登録を削除する. 該当行がなければ false.
    pub fn delete_enrollment(&self, enrollment_id: i64) -> anyhow::Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM user_universities WHERE id = ?1",
            params![enrollment_id],
        )?;
        Ok(affected > 0)
    }
}

impl EnrollmentStore for Database {
    fn delete_enrollment(&self, enrollment_id: i64) -> anyhow::Result<bool> {
        Database::delete_enrollment(self, enrollment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(name: &str, start: &str, end: &str, exam: &str, result: &str) -> DepartmentSeed {
        DepartmentSeed {
            name: name.to_string(),
            application_period_start: Some(start.into()),
            application_period_end: Some(end.into()),
            exam_date: Some(exam.into()),
            result_date: Some(result.into()),
        }
    }

    /// 1 大学 1 学部 1 学科を登録し (user, school, faculty, department) を返す.
    fn setup(db: &Database) -> (i64, i64, i64, i64) {
        let user = db.register_profile("山田太郎", "taro@example.com").unwrap();
        let school = db.upsert_school("東京大学").unwrap();
        let faculty = db.upsert_faculty(school, "理科一類").unwrap();
        let dept = db
            .upsert_department(faculty, &seed("一般選抜", "1/27", "2/5", "2/25", "3/10"))
            .unwrap();
        (user, school, faculty, dept)
    }

    #[test]
    fn test_profile() {
        let db = Database::init(":memory:").unwrap();
        let id = db.register_profile("山田太郎", "taro@example.com").unwrap();
        assert_eq!(db.profile_name(id).unwrap().as_deref(), Some("山田太郎"));
        assert_eq!(db.profile_name(id + 100).unwrap(), None);
        assert!(db.register_profile("別人", "taro@example.com").is_err());
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let db = Database::init(":memory:").unwrap();
        let s1 = db.upsert_school("京都大学").unwrap();
        let s2 = db.upsert_school("京都大学").unwrap();
        assert_eq!(s1, s2);

        let f1 = db.upsert_faculty(s1, "工学部").unwrap();
        let f2 = db.upsert_faculty(s1, "工学部").unwrap();
        assert_eq!(f1, f2);

        let d1 = db.upsert_department(f1, &seed("情報学科", "1/27", "2/5", "2/25", "3/10")).unwrap();
        let d2 = db.upsert_department(f1, &seed("情報学科", "1/28", "2/6", "2/26", "3/11")).unwrap();
        assert_eq!(d1, d2);

        let depts = db.departments_of(f1).unwrap();
        assert_eq!(depts.len(), 1);
        assert_eq!(depts[0].exam_date.as_deref(), Some("2/26"));
    }

    #[test]
    fn test_find_school_exact_match() {
        let db = Database::init(":memory:").unwrap();
        db.upsert_school("大阪大学").unwrap();
        assert!(db.find_school_by_name("  大阪大学 ").unwrap().is_some());
        assert!(db.find_school_by_name("大阪").unwrap().is_none());
    }

    #[test]
    fn test_listing_is_sorted() {
        let db = Database::init(":memory:").unwrap();
        let b = db.upsert_school("b大学").unwrap();
        db.upsert_school("a大学").unwrap();
        db.upsert_faculty(b, "文学部").unwrap();
        db.upsert_faculty(b, "法学部").unwrap();

        let names: Vec<_> = db.list_schools().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a大学", "b大学"]);
        let faculties = db.faculties_of(b).unwrap();
        assert_eq!(faculties.len(), 2);
        assert!(faculties.iter().all(|f| f.school_id == b));
    }

    #[test]
    fn test_enroll_and_records() {
        let db = Database::init(":memory:").unwrap();
        let (user, school, faculty, dept) = setup(&db);

        let id = db.enroll(user, school, faculty, dept, ApplicationStatus::Applied).unwrap();
        let records = db.schedule_records(user).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.enrollment_id, id);
        assert_eq!(r.school_name, "東京大学");
        assert_eq!(r.faculty_name, "理科一類");
        assert_eq!(r.department_name, "一般選抜");
        assert_eq!(r.exam_date.as_deref(), Some("2/25"));
        assert_eq!(r.status, ApplicationStatus::Applied);

        let other = db.register_profile("佐藤花子", "hanako@example.com").unwrap();
        assert!(db.schedule_records(other).unwrap().is_empty());
    }

    #[test]
    fn test_enroll_requires_profile() {
        let db = Database::init(":memory:").unwrap();
        let (user, school, faculty, dept) = setup(&db);
        assert!(db.enroll(user + 100, school, faculty, dept, ApplicationStatus::Considering).is_err());
    }

    fn not_found_kind(err: &anyhow::Error) -> Option<&'static str> {
        match err.downcast_ref::<AppError>() {
            Some(AppError::NotFound { kind, .. }) => Some(*kind),
            _ => None,
        }
    }

    #[test]
    fn test_resolve_target() {
        let db = Database::init(":memory:").unwrap();
        let (_, school, faculty, dept) = setup(&db);

        let (s, f, d) = db.resolve_target(" 東京大学 ", "理科一類 ", "  一般選抜").unwrap();
        assert_eq!((s.id, f.id, d.id), (school, faculty, dept));
    }

    #[test]
    fn test_resolve_target_reports_missing_level() {
        let db = Database::init(":memory:").unwrap();
        setup(&db);

        // 別の大学にだけある学部, 別の学部にだけある学科
        let other = db.upsert_school("京都大学").unwrap();
        let other_faculty = db.upsert_faculty(other, "工学部").unwrap();
        db.upsert_department(other_faculty, &seed("情報学科", "1/27", "2/5", "2/25", "3/10"))
            .unwrap();
        db.upsert_faculty(db.upsert_school("東京大学").unwrap(), "文科一類").unwrap();

        let err = db.resolve_target("早稲田大学", "理科一類", "一般選抜").unwrap_err();
        assert_eq!(not_found_kind(&err), Some("school"));

        let err = db.resolve_target("東京大学", "工学部", "情報学科").unwrap_err();
        assert_eq!(not_found_kind(&err), Some("faculty"));

        let err = db.resolve_target("東京大学", "理科一類", "情報学科").unwrap_err();
        assert_eq!(not_found_kind(&err), Some("department"));

        let err = db.resolve_target("東京大学", "文科一類", "一般選抜").unwrap_err();
        assert_eq!(not_found_kind(&err), Some("department"));
    }

    #[test]
    fn test_status_and_delete() {
        let db = Database::init(":memory:").unwrap();
        let (user, school, faculty, dept) = setup(&db);
        let id = db.enroll(user, school, faculty, dept, ApplicationStatus::Considering).unwrap();

        assert!(db.set_status(id, ApplicationStatus::Scheduled).unwrap());
        assert_eq!(db.schedule_records(user).unwrap()[0].status, ApplicationStatus::Scheduled);
        assert!(!db.set_status(id + 1, ApplicationStatus::Scheduled).unwrap());

        assert!(db.delete_enrollment(id).unwrap());
        assert!(!db.delete_enrollment(id).unwrap());
        assert!(db.schedule_records(user).unwrap().is_empty());
    }
}
