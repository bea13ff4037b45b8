//! Shared fixtures for report integration tests.
//!
//! Both the in-memory and `PostgreSQL` suites seed the same hiring data and
//! compare the written report against [`EXPECTED_REPORT`].

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;

/// Report path of the seeded job, relative to the output root.
pub const REPORT_PATH: &str = "7/100_data_analyst.csv";

/// Report the seeded data must produce at [`clock`]'s instant.
pub const EXPECTED_REPORT: &str = concat!(
    "user_id,user_last_name,user_first_name,user_email,user_country_code,user_phone,",
    "candidacy_id,candidacy_created_at,candidacy_pipeline_stage,candidacy_status,",
    "candidacy_failed,job_name,tags,percentile,weighted_percentage_score,",
    "assessments_remaining,assessments_completed,hours_since_application,",
    "email_messages_count,sms_messages_count,last_email_created_at,last_sms_created_at,",
    "calendar_events,",
    "a1_percentage,a1_percentile,a1_score,a1_started_at,a1_completed_at,",
    "d1_percentage,d1_percentile,",
    "a2_percentage_non_pipeline,a2_percentile_non_pipeline,a2_score_non_pipeline,",
    "a2_started_at_non_pipeline,a2_completed_at_non_pipeline,",
    "LinkedIn URL\n",
    "501,Lovelace,Ada,user501@example.com,+44,7700900001,",
    "1,2024-05-01 10:00:00,Screening,active,",
    "false,Data Analyst,referral; shortlist,80,66.5,",
    "0,2,2685600,",
    "2,1,2024-05-04 08:00:00,2024-05-05 18:30:00,",
    "2024-05-10 09:00:00,",
    "90,80,12.5,2024-05-02 09:00:00,2024-05-02 09:45:00,",
    "75,80,",
    "70,80,12.5,2024-05-02 09:00:00,2024-05-02 09:45:00,",
    "https://example.com/in/ada\n",
    "502,Turing,Alan,user502@example.com,,,",
    "2,2024-05-03 10:00:00,Screening,active,",
    "true,Data Analyst,,40,,",
    "1,1,2512800,",
    "0,0,,,",
    ",",
    "55,40,,2024-05-02 09:00:00,2024-05-02 09:45:00,",
    ",40,",
    ",,,,,",
    "\n",
);

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Builds a timestamp from calendar parts.
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid test timestamp")
}

/// Clock at 2024-06-01 12:00 UTC.
#[fixture]
pub fn clock() -> FixedClock {
    FixedClock(Utc.from_utc_datetime(&at(2024, 6, 1, 12, 0)))
}

/// Uniquely named directory under the system temp dir, removed on drop.
pub struct ScratchDir {
    base: Utf8PathBuf,
    name: String,
    path: Utf8PathBuf,
}

impl ScratchDir {
    /// Creates an empty directory.
    pub fn new(prefix: &str) -> Self {
        let base = Utf8PathBuf::try_from(std::env::temp_dir()).expect("temp dir is UTF-8");
        let name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
        Dir::open_ambient_dir(&base, ambient_authority())
            .and_then(|dir| dir.create_dir(&name))
            .expect("create scratch dir");
        Self {
            path: base.join(&name),
            base,
            name,
        }
    }

    /// Absolute path of the directory.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads a file below the directory.
    pub fn read(&self, relative: &str) -> String {
        Dir::open_ambient_dir(&self.path, ambient_authority())
            .and_then(|dir| dir.read_to_string(relative))
            .expect("read scratch file")
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        Dir::open_ambient_dir(&self.base, ambient_authority())
            .and_then(|dir| dir.remove_dir_all(&self.name))
            .ok();
    }
}

/// Provides a scratch output directory.
#[fixture]
pub fn scratch() -> ScratchDir {
    ScratchDir::new("report_it")
}
