//! Composed mail flowing through the background queue.

use std::time::Duration;

use chrono::{NaiveDate, Utc};

use people_core::{Email, PositionId, RoleId, UserId};
use people_integration_tests::{RecordingDelivery, test_config};
use people_server::models::{CurrentUser, PositionDetails, User};
use people_server::services::MailQueue;
use people_server::services::email::{
    NEW_POSITION_SUBJECT, NEW_PRIMARY_SUBJECT, NEW_USER_SUBJECT, new_position_mail,
    new_primary_mail, new_user_mail,
};

fn grace() -> User {
    let now = Utc::now();
    User {
        id: UserId::new(7),
        name: "Grace Hopper".to_owned(),
        email: Email::parse("grace@people.test").unwrap(),
        admin: false,
        team_id: None,
        primary_role_id: None,
        created_at: now,
        updated_at: now,
    }
}

fn admin() -> CurrentUser {
    CurrentUser {
        id: UserId::new(1),
        email: Email::parse("ada@people.test").unwrap(),
        name: "Ada Lovelace".to_owned(),
        admin: true,
    }
}

fn position(primary: bool) -> PositionDetails {
    PositionDetails {
        id: PositionId::new(3),
        user_id: UserId::new(7),
        role_id: RoleId::new(2),
        starts_at: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        primary,
        user_name: "Grace Hopper".to_owned(),
        user_email: Email::parse("grace@people.test").unwrap(),
        role_name: "Developer".to_owned(),
    }
}

#[tokio::test]
async fn test_new_user_mail_goes_to_operations() {
    let config = test_config(None);
    let delivery = RecordingDelivery::default();
    let (queue, worker) = MailQueue::spawn_with_delay(delivery.clone(), Duration::ZERO);

    queue.send(new_user_mail(
        &grace(),
        &config.email.notifications_email,
        &config.base_url,
    ));
    drop(queue);
    worker.await.unwrap();

    let sent = delivery.sent();
    let [mail] = sent.as_slice() else {
        panic!("expected one mail, got {sent:?}");
    };
    assert_eq!(mail.to, "ops@people.test");
    assert_eq!(mail.subject, NEW_USER_SUBJECT);
    assert!(mail.text.contains("Grace Hopper"));
    assert!(mail.text.contains("grace@people.test"));
    assert!(mail.html.contains("http://people.test/users/7"));
}

#[tokio::test]
async fn test_primary_position_sends_both_mails_in_order() {
    let config = test_config(None);
    let delivery = RecordingDelivery::default();
    let (queue, worker) = MailQueue::spawn_with_delay(delivery.clone(), Duration::ZERO);

    let details = position(true);
    queue.send(new_position_mail(&details, &admin(), &config.base_url));
    queue.send(new_primary_mail(&details, &admin(), &config.base_url));
    drop(queue);
    worker.await.unwrap();

    let sent = delivery.sent();
    let subjects: Vec<&str> = sent.iter().map(|m| m.subject.as_str()).collect();
    assert_eq!(subjects, [NEW_POSITION_SUBJECT, NEW_PRIMARY_SUBJECT]);
    assert!(sent.iter().all(|m| m.to == "grace@people.test"));
    assert!(sent.iter().all(|m| m.text.contains("Developer")));
    assert!(sent.iter().all(|m| m.text.contains("Ada Lovelace")));
}

#[tokio::test]
async fn test_enqueue_after_worker_stopped_is_an_error() {
    let delivery = RecordingDelivery::default();
    let (queue, worker) = MailQueue::spawn_with_delay(delivery, Duration::ZERO);

    worker.abort();
    let _ = worker.await;

    let mail = new_primary_mail(&position(true), &admin(), "http://people.test").unwrap();
    assert!(queue.enqueue(mail).is_err());
}
