use chrono::Utc;
use quizgate_core::storage::{self, Database};

pub fn mark_complete() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    let now = Utc::now();
    storage::record_completed(&mut db, now)?;
    println!("last completion set to {}", now.to_rfc3339());
    Ok(())
}

pub fn reset() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    storage::clear_completed(&mut db)?;
    println!("completion history cleared; a quiz is due");
    Ok(())
}
