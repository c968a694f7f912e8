use std::fmt;

use tracing::{debug, info, warn};

use crate::alert_notifier::AlertNotifier;
use crate::scan_types::{AvailabilityResult, Slot};
use crate::yelp_client::YELP_HOST;

/// SMS text announcing one open slot, with a deep link to book it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage(String);

impl AlertMessage {
    /// Alert for a slot on `isodate` bookable at the host-relative `form_action`
    pub fn new(isodate: &str, form_action: &str) -> Self {
        Self(format!(
            "Reservation Found for {}. https://{}{}",
            isodate, YELP_HOST, form_action
        ))
    }

    /// Alert for `slot`
    pub fn for_slot(slot: &Slot) -> Self {
        Self::new(&slot.isodate, &slot.form_action)
    }

    /// Message body
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Alerts for every open slot, in endpoint order.
pub fn collect_alerts(result: &AvailabilityResult) -> Vec<AlertMessage> {
    result
        .date_groups()
        .iter()
        .flat_map(|group| group.slots.iter().map(AlertMessage::for_slot))
        .collect()
}

/// Sends one alert per open slot in `result` and returns how many were dispatched.
///
/// Nothing is remembered between calls, so a slot that is still open on the
/// next poll is announced again.
pub async fn parse_results(result: &AvailabilityResult, notifier: &AlertNotifier) -> usize {
    if result.date_groups().is_empty() {
        warn!("No results found");
        return 0;
    }

    info!("Parsing reservation results");

    let mut dispatched = 0;
    for group in result.date_groups() {
        if group.slots.is_empty() {
            debug!("No available reservations for {}", group.date);
            continue;
        }

        for slot in &group.slots {
            let alert = AlertMessage::for_slot(slot);
            info!("{}", alert);
            notifier.send_alert(&alert).await;
            dispatched += 1;
        }
    }

    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan_types::DateGroup;
    use crate::test_support::{DEST_NUMBER, RecordingSms};
    use std::sync::Arc;

    fn slot(isodate: &str, form_action: &str) -> Slot {
        Slot {
            timestamp: 0,
            formatted_time: "7:00 pm".to_string(),
            form_action: form_action.to_string(),
            csrf_token: None,
            isodate: isodate.to_string(),
        }
    }

    fn group(date: &str, slots: Vec<Slot>) -> DateGroup {
        DateGroup {
            slots,
            date: date.to_string(),
            covers: 2,
            time: String::new(),
            timestamp: 0,
            msg: String::new(),
            isodate: String::new(),
        }
    }

    #[test]
    fn test_alert_message_format() {
        let alert = AlertMessage::for_slot(&slot("2024-07-04", "/reserve/123"));
        assert_eq!(
            alert.as_str(),
            "Reservation Found for 2024-07-04. https://www.yelp.com/reserve/123"
        );
        assert_eq!(alert.to_string(), alert.as_str());
    }

    #[test]
    fn test_collect_alerts_keeps_endpoint_order() {
        let result = AvailabilityResult::with_date_groups(vec![
            group("Fri, Jul 5", vec![slot("2024-07-05", "/b"), slot("2024-07-05", "/a")]),
            group("Thu, Jul 4", vec![slot("2024-07-04", "/c")]),
        ]);

        let alerts: Vec<String> = collect_alerts(&result)
            .iter()
            .map(|alert| alert.to_string())
            .collect();

        assert_eq!(
            alerts,
            vec![
                "Reservation Found for 2024-07-05. https://www.yelp.com/b",
                "Reservation Found for 2024-07-05. https://www.yelp.com/a",
                "Reservation Found for 2024-07-04. https://www.yelp.com/c",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_date_groups_sends_nothing() {
        let sms = Arc::new(RecordingSms::default());
        let notifier = AlertNotifier::new(sms.clone(), DEST_NUMBER);

        let dispatched = parse_results(&AvailabilityResult::default(), &notifier).await;

        assert_eq!(dispatched, 0);
        assert_eq!(sms.attempt_count(), 0);
    }

    #[tokio::test]
    async fn test_single_slot_sends_one_alert() {
        let sms = Arc::new(RecordingSms::default());
        let notifier = AlertNotifier::new(sms.clone(), DEST_NUMBER);
        let result = AvailabilityResult::with_date_groups(vec![group(
            "Thu, Jul 4",
            vec![slot("2024-07-04", "/reserve/123")],
        )]);

        let dispatched = parse_results(&result, &notifier).await;

        assert_eq!(dispatched, 1);
        assert_eq!(
            sms.messages(),
            vec!["Reservation Found for 2024-07-04. https://www.yelp.com/reserve/123"]
        );
    }

    #[tokio::test]
    async fn test_empty_group_skipped_and_slot_order_kept() {
        let sms = Arc::new(RecordingSms::default());
        let notifier = AlertNotifier::new(sms.clone(), DEST_NUMBER);
        let result = AvailabilityResult::with_date_groups(vec![
            group("Wed, Jul 3", vec![]),
            group(
                "Thu, Jul 4",
                vec![slot("2024-07-04", "/reserve/2"), slot("2024-07-04", "/reserve/1")],
            ),
        ]);

        let dispatched = parse_results(&result, &notifier).await;

        assert_eq!(dispatched, 2);
        assert_eq!(
            sms.messages(),
            vec![
                "Reservation Found for 2024-07-04. https://www.yelp.com/reserve/2",
                "Reservation Found for 2024-07-04. https://www.yelp.com/reserve/1",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_alert_does_not_stop_the_next() {
        let sms = Arc::new(RecordingSms::failing_on(vec![1]));
        let notifier = AlertNotifier::new(sms.clone(), DEST_NUMBER);
        let result = AvailabilityResult::with_date_groups(vec![group(
            "Thu, Jul 4",
            vec![slot("2024-07-04", "/reserve/1"), slot("2024-07-04", "/reserve/2")],
        )]);

        let dispatched = parse_results(&result, &notifier).await;

        assert_eq!(dispatched, 2);
        assert_eq!(sms.attempt_count(), 2);
        assert_eq!(
            sms.messages(),
            vec!["Reservation Found for 2024-07-04. https://www.yelp.com/reserve/2"]
        );
    }

    #[tokio::test]
    async fn test_repeated_results_are_announced_again() {
        let sms = Arc::new(RecordingSms::default());
        let notifier = AlertNotifier::new(sms.clone(), DEST_NUMBER);
        let result = AvailabilityResult::with_date_groups(vec![group(
            "Thu, Jul 4",
            vec![slot("2024-07-04", "/reserve/123")],
        )]);

        parse_results(&result, &notifier).await;
        parse_results(&result, &notifier).await;

        assert_eq!(sms.messages().len(), 2);
    }
}
