//! Chat notification when a project's dates change.

use tracing::{debug, error, info, instrument};

use people_core::{ProjectDates, dates_updated_message};

use crate::slack::ChatSink;

/// Post one message listing the changed dates, if any changed.
///
/// Returns whether a message was delivered. Delivery failures are logged
/// and reported to Sentry but never surface to the caller.
#[instrument(skip(sink, before, after))]
pub async fn notify_if_dates_changed<S: ChatSink>(
    sink: &S,
    project_name: &str,
    before: &ProjectDates,
    after: &ProjectDates,
) -> bool {
    let changes = after.changes_since(before);
    let Some(message) = dates_updated_message(project_name, &changes) else {
        debug!("No tracked dates changed");
        return false;
    };

    match sink.ping(&message).await {
        Ok(()) => {
            info!(changes = changes.len(), "Project date change posted");
            true
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            error!(error = %e, sentry_event_id = %event_id, "Failed to post project date change");
            false
        }
    }
}

/// Like [`notify_if_dates_changed`], skipping the check when chat is not configured.
pub async fn notify_project_update<S: ChatSink>(
    sink: Option<&S>,
    project_name: &str,
    before: &ProjectDates,
    after: &ProjectDates,
) -> bool {
    let Some(sink) = sink else {
        debug!("Slack not configured, skipping project date notification");
        return false;
    };
    notify_if_dates_changed(sink, project_name, before, after).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;
    use crate::slack::SlackError;

    #[derive(Default)]
    struct Recorder {
        fail: bool,
        messages: Mutex<Vec<String>>,
    }

    impl ChatSink for Recorder {
        async fn ping(&self, text: &str) -> Result<(), SlackError> {
            self.messages.lock().unwrap().push(text.to_owned());
            if self.fail {
                return Err(SlackError::Response {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(())
        }
    }

    fn date(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026, 5, d)
    }

    fn dates() -> ProjectDates {
        ProjectDates {
            kickoff: date(1),
            starts_at: date(2),
            end_at: date(20),
        }
    }

    #[tokio::test]
    async fn test_kickoff_change_pings_once() {
        let sink = Recorder::default();
        let after = ProjectDates {
            kickoff: date(21),
            ..dates()
        };

        assert!(notify_if_dates_changed(&sink, "Portal", &dates(), &after).await);
        assert_eq!(
            *sink.messages.lock().unwrap(),
            ["Dates in project *Portal* has been updated.\n*Kickoff* changed to _2026-05-21_."]
        );
    }

    #[tokio::test]
    async fn test_unchanged_dates_send_nothing() {
        let sink = Recorder::default();
        assert!(!notify_if_dates_changed(&sink, "Portal", &dates(), &dates()).await);
        assert!(sink.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let sink = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let after = ProjectDates {
            end_at: None,
            ..dates()
        };

        assert!(!notify_if_dates_changed(&sink, "Portal", &dates(), &after).await);
        assert_eq!(sink.messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_sink_is_skipped() {
        let after = ProjectDates {
            kickoff: None,
            ..dates()
        };
        assert!(!notify_project_update::<Recorder>(None, "Portal", &dates(), &after).await);
    }
}
