mod academic;
mod config;
mod dashboard;
mod db;
mod error;
mod render;
mod schedule;
mod status;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::db::Database;
use crate::error::AppError;
use crate::status::ApplicationStatus;

#[derive(Parser)]
#[command(name = "admission-planner", about = "大学受験スケジュール管理")]
struct Cli {
    /// 設定ファイル
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// 基準日 (YYYY-MM-DD). 省略時は今日
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,

    /// プロフィール id. 省略時は設定ファイルの [user] id
    #[arg(long, global = true)]
    user: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// プロフィール登録
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// 設定ファイルの大学データを DB に取り込む
    Seed,
    /// 大学一覧, または 1 大学の学部・学科
    Schools {
        #[arg(long)]
        name: Option<String>,
    },
    /// 志望校を登録
    Add {
        #[arg(long)]
        school: String,
        #[arg(long)]
        faculty: String,
        #[arg(long)]
        department: String,
        #[arg(long, default_value = "considering")]
        status: ApplicationStatus,
    },
    /// ガントチャート表示
    Dashboard,
    /// 出願状況を変更
    Status {
        enrollment_id: i64,
        status: ApplicationStatus,
    },
    /// 志望校の登録を削除
    Delete { enrollment_id: i64 },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load_or_default(&cli.config)?;
    let database = Database::init(&cfg.database.path)?;

    // 壁時計を読むのはここだけ
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let user = cli.user.or(cfg.user.id);

    match cli.command {
        Command::Register { name, email } => {
            let id = database.register_profile(name.trim(), email.trim())?;
            tracing::info!(user_id = id, "Profile registered");
            println!("登録しました (id: {})", id);
        }
        Command::Seed => run_seed(&cfg, &database)?,
        Command::Schools { name } => run_schools(&database, name.as_deref())?,
        Command::Add {
            school,
            faculty,
            department,
            status,
        } => {
            let user_id = require_user(user)?;
            run_add(&database, user_id, &school, &faculty, &department, status)?;
        }
        Command::Dashboard => {
            let user_id = require_user(user)?;
            let dash = load_dashboard(&database, user_id, today)?;
            print!("{}", render::render_dashboard(&dash));
        }
        Command::Status {
            enrollment_id,
            status,
        } => {
            let user_id = require_user(user)?;
            load_dashboard(&database, user_id, today)?.ensure_enrollment(enrollment_id)?;
            if database.set_status(enrollment_id, status)? {
                tracing::info!(enrollment_id, status = %status, "Status updated");
                println!("#{} を「{}」に変更しました", enrollment_id, status.label());
            } else {
                anyhow::bail!(AppError::NotFound {
                    kind: "enrollment",
                    name: enrollment_id.to_string(),
                });
            }
        }
        Command::Delete { enrollment_id } => {
            let user_id = require_user(user)?;
            let mut dash = load_dashboard(&database, user_id, today)?;
            dash.ensure_enrollment(enrollment_id)?;
            if dash.delete(&database, enrollment_id) {
                println!("#{} を削除しました (残り {} 件)", enrollment_id, dash.records().len());
            } else {
                anyhow::bail!("#{} を削除できませんでした", enrollment_id);
            }
        }
    }

    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| AppError::InvalidDate(s.to_string()))
}

fn require_user(user: Option<i64>) -> anyhow::Result<i64> {
    user.ok_or_else(|| anyhow::anyhow!("--user か設定ファイルの [user] id を指定してください"))
}

fn load_dashboard(database: &Database, user_id: i64, today: NaiveDate) -> anyhow::Result<Dashboard> {
    let name = database.profile_name(user_id)?;
    if name.is_none() {
        tracing::warn!(user_id, "Profile not found");
    }
    let records = database.schedule_records(user_id)?;
    tracing::debug!(user_id, count = records.len(), "Loaded schedule records");
    Ok(Dashboard::new(name, records, today))
}

fn run_seed(cfg: &Config, database: &Database) -> anyhow::Result<()> {
    let mut departments = 0usize;
    for school in &cfg.schools {
        let school_id = database.upsert_school(school.name.trim())?;
        for faculty in &school.faculties {
            let faculty_id = database.upsert_faculty(school_id, faculty.name.trim())?;
            for dept in &faculty.departments {
                database.upsert_department(faculty_id, dept)?;
                departments += 1;
            }
        }
    }
    tracing::info!(schools = cfg.schools.len(), departments, "Seed complete");
    println!("{} 校 / {} 学科を取り込みました", cfg.schools.len(), departments);
    Ok(())
}

fn run_schools(database: &Database, name: Option<&str>) -> anyhow::Result<()> {
    let Some(name) = name else {
        print!("{}", render::render_school_list(&database.list_schools()?));
        return Ok(());
    };

    let school = database
        .find_school_by_name(name)?
        .ok_or_else(|| AppError::NotFound {
            kind: "school",
            name: name.trim().to_string(),
        })?;

    let mut faculties = Vec::new();
    for faculty in database.faculties_of(school.id)? {
        let departments = database.departments_of(faculty.id)?;
        faculties.push((faculty, departments));
    }
    print!("{}", render::render_school_detail(&school, &faculties));
    Ok(())
}

fn run_add(
    database: &Database,
    user_id: i64,
    school: &str,
    faculty: &str,
    department: &str,
    status: ApplicationStatus,
) -> anyhow::Result<()> {
    let (school, faculty, department) = database.resolve_target(school, faculty, department)?;

    let id = database.enroll(user_id, school.id, faculty.id, department.id, status)?;
    tracing::info!(
        user_id,
        enrollment_id = id,
        school = %school.name,
        "Enrollment added"
    );
    println!(
        "#{} {} {} {} を登録しました [{}]",
        id,
        school.name,
        faculty.name,
        department.name,
        status.label()
    );
    Ok(())
}
