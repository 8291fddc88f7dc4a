//! Project saves against a real database.
//!
//! These tests require a `PostgreSQL` database in `DATABASE_URL`; migrations
//! are applied on connect. Run with:
//!
//! ```bash
//! cargo test -p people-integration-tests -- --ignored
//! ```

use chrono::{NaiveDate, Utc};
use secrecy::SecretString;

use people_core::ProjectDates;
use people_server::db::{MIGRATOR, ProjectRepository, create_pool};
use people_server::models::ProjectParams;

async fn pool() -> sqlx::PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database");
    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    pool
}

fn date(day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2026, 6, day)
}

fn params(name: &str, end_day: u32) -> ProjectParams {
    ProjectParams {
        name: name.to_owned(),
        dates: ProjectDates {
            kickoff: date(1),
            starts_at: date(2),
            end_at: date(end_day),
        },
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_update_returns_replaced_row() {
    let pool = pool().await;
    let projects = ProjectRepository::new(&pool);
    let name = format!("Atlas {}", Utc::now().timestamp_micros());

    let created = projects.create(&params(&name, 10), "A", "#123456").await.unwrap();
    let (before, after) = projects.update(created.id, &params(&name, 20)).await.unwrap();

    assert_eq!(before.dates().end_at, date(10));
    assert_eq!(after.dates().end_at, date(20));
    assert_eq!(after.initials, "A");

    projects.delete(created.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_concurrent_updates_each_see_the_other() {
    let pool = pool().await;
    let projects = ProjectRepository::new(&pool);
    let name = format!("Borealis {}", Utc::now().timestamp_micros());

    let created = projects.create(&params(&name, 10), "B", "#654321").await.unwrap();
    let first = params(&name, 20);
    let second = params(&name, 25);
    let (one, two) = tokio::join!(
        projects.update(created.id, &first),
        projects.update(created.id, &second),
    );
    let (one, two) = (one.unwrap(), two.unwrap());

    // Whichever commits second must have replaced the other's dates.
    let befores = [one.0.dates().end_at, two.0.dates().end_at];
    assert!(befores.contains(&date(10)));
    assert!(befores.contains(&date(20)) || befores.contains(&date(25)));

    projects.delete(created.id).await.unwrap();
}
