use chrono::Utc;
use quizgate_core::storage::{self, Database};
use quizgate_core::Config;
use serde_json::json;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let schedule = config.schedule();
    let now = Utc::now();
    let last = storage::last_completed(&db)?;

    let status = json!({
        "due": schedule.is_due(last, now),
        "interval_minutes": schedule.interval_minutes,
        "last_completed_at": last.map(|t| t.to_rfc3339()),
        "next_due_at": schedule.next_due(last, now).map(|t| t.to_rfc3339()),
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
