#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use smart_schedule::{AppConfig, Timetable, http_api, logging};
    use tracing::info;

    logging::init();
    let config = AppConfig::from_env()?;
    let calendar = config.load_calendar()?;

    let mut timetable = Timetable::with_calendar(calendar.clone());
    #[cfg(feature = "sqlite")]
    if let Some(path) = &config.database_path {
        use smart_schedule::{ScheduleStore, SqliteScheduleStore};

        let store = SqliteScheduleStore::new(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        if let Some(mut stored) = store.load_timetable()? {
            info!(
                path = %path.display(),
                sessions = stored.sessions().len(),
                "loaded timetable"
            );
            if config.calendar_path.is_some() {
                stored.set_calendar(calendar);
            }
            timetable = stored;
        }
    }

    http_api::serve(config.http_addr, timetable).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
