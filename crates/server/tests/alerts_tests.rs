//! Alert dispatcher tests with an in-process SMS client.

use medguard::alerts::{AlertDispatcher, AlertRequest, EmergencyContact, Location};
use medguard::error::SmsError;
use medguard::phone::{DefaultCountry, PhoneNormalizer};
use medguard::sms::{OutboundSms, SentMessage, SmsClient};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Accepts every message except those addressed to `rejected`.
#[derive(Default)]
struct FakeSms {
    rejected: HashSet<String>,
    sent: Mutex<Vec<OutboundSms>>,
    delay: Option<Duration>,
}

impl FakeSms {
    fn rejecting(numbers: &[&str]) -> Self {
        Self {
            rejected: numbers.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<OutboundSms> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SmsClient for FakeSms {
    async fn send(&self, message: OutboundSms) -> Result<SentMessage, SmsError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.rejected.contains(&message.to) {
            return Err(SmsError::Vendor {
                status: 400,
                code: Some(21610),
                message: "Attempt to send to unsubscribed recipient".into(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(SentMessage {
            sid: format!("SM{}", sent.len()),
            status: "queued".into(),
            to: message.to,
            from: message.from,
        })
    }
}

fn contact(name: &str, phone: &str) -> EmergencyContact {
    EmergencyContact {
        name: name.into(),
        phone: phone.into(),
        relationship: "Family".into(),
    }
}

fn request(contacts: Vec<EmergencyContact>) -> AlertRequest {
    AlertRequest {
        patient_name: "Sam Carter".into(),
        location: Some(Location {
            latitude: Some(37.7749),
            longitude: Some(-122.4194),
            address: None,
        }),
        emergency_contacts: contacts,
        custom_message: None,
    }
}

fn dispatcher(fake: Arc<FakeSms>) -> AlertDispatcher {
    AlertDispatcher::new(fake, "+15005550006", PhoneNormalizer::default())
}

#[tokio::test]
async fn test_all_contacts_messaged() {
    let fake = Arc::new(FakeSms::default());
    let outcome = dispatcher(fake.clone())
        .send_emergency_alert(&request(vec![
            contact("Alex", "415-234-5678"),
            contact("Priya", "+91 98765 43210"),
        ]))
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Emergency alerts successfully sent to all 2 contacts.");
    assert_eq!(outcome.sent_count(), 2);

    let sent = fake.sent();
    assert_eq!(sent[0].to, "+14152345678");
    assert_eq!(sent[1].to, "+919876543210");
    assert!(sent.iter().all(|m| m.from == "+15005550006"));
    assert!(sent[0].body.contains("Sam Carter"));
    assert!(sent[0].body.contains("https://maps.google.com/?q=37.7749,-122.4194"));
    assert_eq!(sent[0].body, sent[1].body);
}

#[tokio::test]
async fn test_partial_failure_keeps_contact_order() {
    let fake = Arc::new(FakeSms::rejecting(&["+14152345678"]));
    let outcome = dispatcher(fake.clone())
        .send_emergency_alert(&request(vec![
            contact("Alex", "4152345678"),
            contact("Jo", "call me"),
            contact("Priya", "9876543210"),
        ]))
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Alerts sent to 1/3 contacts. 2 failed.");

    let names: Vec<_> = outcome.results.iter().map(|r| r.contact.as_str()).collect();
    assert_eq!(names, ["Alex", "Jo", "Priya"]);
    assert_eq!(
        outcome.results[0].error.as_deref(),
        Some("Attempt to send to unsubscribed recipient")
    );
    assert!(
        outcome.results[1]
            .error
            .as_deref()
            .is_some_and(|e| e == "Invalid phone number: call me")
    );
    assert!(outcome.results[2].is_sent());
    assert_eq!(outcome.results[2].formatted_phone.as_deref(), Some("+919876543210"));

    // invalid numbers never reach the vendor
    assert_eq!(fake.sent().len(), 1);
}

#[tokio::test]
async fn test_every_contact_failing_is_not_success() {
    let fake = Arc::new(FakeSms::default());
    let outcome = dispatcher(fake.clone())
        .send_emergency_alert(&request(vec![
            contact("A", "1-555-234-5678"),
            contact("B", "1-911-234-5678"),
        ]))
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Failed to send alerts to all 2 contacts.");
    assert_eq!(outcome.results.len(), 2);
    assert!(fake.sent().is_empty());
}

#[tokio::test]
async fn test_no_contacts_is_not_success() {
    let fake = Arc::new(FakeSms::default());
    let outcome = dispatcher(fake).send_emergency_alert(&request(vec![])).await;
    assert!(!outcome.success);
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn test_concurrent_dispatch_preserves_order() {
    let fake = Arc::new(FakeSms {
        delay: Some(Duration::from_millis(5)),
        ..Default::default()
    });
    let contacts: Vec<_> = (0..6)
        .map(|i| contact(&format!("C{i}"), &format!("415234567{i}")))
        .collect();
    let outcome = dispatcher(fake.clone())
        .with_concurrency(3)
        .send_emergency_alert(&request(contacts))
        .await;

    assert_eq!(outcome.sent_count(), 6);
    let names: Vec<_> = outcome.results.iter().map(|r| r.contact.clone()).collect();
    assert_eq!(names, ["C0", "C1", "C2", "C3", "C4", "C5"]);
}

#[tokio::test]
async fn test_dispatch_runs_on_spawned_task() {
    let fake = Arc::new(FakeSms::default());
    let dispatcher = dispatcher(fake.clone()).with_concurrency(2);
    let alert = request(vec![
        contact("Alex", "4152345678"),
        contact("Priya", "9876543210"),
    ]);

    let outcome = tokio::spawn(async move { dispatcher.send_emergency_alert(&alert).await })
        .await
        .expect("dispatch task panicked");

    assert!(outcome.success);
    assert_eq!(outcome.sent_count(), 2);
    assert_eq!(fake.sent().len(), 2);
}

#[tokio::test]
async fn test_india_default_country_only_changes_fallback() {
    let fake = Arc::new(FakeSms::default());
    let dispatcher = AlertDispatcher::new(
        fake.clone(),
        "+15005550006",
        PhoneNormalizer::new(DefaultCountry::India),
    );
    let outcome = dispatcher
        .send_emergency_alert(&request(vec![
            contact("Ten digits", "4152345678"),
            contact("Short", "22 2345 678"),
        ]))
        .await;

    assert_eq!(outcome.results[0].formatted_phone.as_deref(), Some("+14152345678"));
    assert_eq!(outcome.results[1].formatted_phone.as_deref(), Some("+91222345678"));
    assert_eq!(fake.sent().len(), 2);
}

#[tokio::test]
async fn test_send_test_sms_reports_vendor_failure() {
    let fake = Arc::new(FakeSms::rejecting(&["+15005550001"]));
    let dispatcher = dispatcher(fake.clone());

    let ok = dispatcher.send_test_sms("+14152345678").await;
    assert!(ok.success);
    assert_eq!(ok.message, "Test SMS sent successfully to +14152345678");
    assert!(ok.result.is_some());
    assert_eq!(
        fake.sent()[0].body,
        "🧪 Test SMS from MedGuard - This is a test message to verify Twilio SMS functionality."
    );

    let failed = dispatcher.send_test_sms("+15005550001").await;
    assert!(!failed.success);
    assert_eq!(
        failed.message,
        "Failed to send test SMS: Attempt to send to unsubscribed recipient"
    );
}
