// ABOUTME: Subscriber notification: message rendering, the Notifier trait and local delivery channels.
// ABOUTME: WriterNotifier prints to any io::Write; OutboxNotifier drops one message file per recipient.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::detect::ChangeRecord;
use crate::error::WatchError;

/// Subject line used for every alert.
pub const SUBJECT: &str = "Price Change Alert";

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

/// Formats the change list as a plain-text message.
pub fn render_message(changes: &[ChangeRecord]) -> Message {
    let mut body = String::from("The following products have changed price:\n\n");
    for change in changes {
        body.push_str(&format!("URL: {}\n", change.url));
        match change.previous_price {
            Some(prev) => body.push_str(&format!("Previous Price: ₹{}\n", prev)),
            None => body.push_str("Previous Price: unknown\n"),
        }
        body.push_str(&format!("Current Price: ₹{}\n\n", change.current_price));
    }
    Message {
        subject: SUBJECT.to_string(),
        body,
    }
}

/// Delivers a change list to one recipient.
pub trait Notifier {
    fn notify(&mut self, recipient: &str, changes: &[ChangeRecord]) -> Result<(), WatchError>;
}

/// Result of notifying every subscriber.
#[derive(Debug, Default)]
pub struct NotifySummary {
    pub sent: usize,
    pub failed: Vec<WatchError>,
}

/// Notifies every recipient. Nothing is sent for an empty change list;
/// a failing recipient does not stop the others.
pub fn notify_all(
    notifier: &mut dyn Notifier,
    recipients: &[String],
    changes: &[ChangeRecord],
) -> NotifySummary {
    let mut summary = NotifySummary::default();
    if changes.is_empty() {
        tracing::info!("no price changes, no notifications sent");
        return summary;
    }
    for recipient in recipients {
        match notifier.notify(recipient, changes) {
            Ok(()) => {
                tracing::info!(recipient = %recipient, changes = changes.len(), "notification sent");
                summary.sent += 1;
            }
            Err(e) => {
                tracing::warn!(recipient = %recipient, error = %e, "notification failed");
                summary.failed.push(e);
            }
        }
    }
    summary
}

/// Writes each message, mail-style, to a writer (stdout in the CLI).
pub struct WriterNotifier<W: Write> {
    out: W,
}

impl<W: Write> WriterNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for WriterNotifier<W> {
    fn notify(&mut self, recipient: &str, changes: &[ChangeRecord]) -> Result<(), WatchError> {
        let text = format_mail(recipient, &render_message(changes));
        self.out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| WatchError::notify(recipient, "Notify", Some(anyhow::anyhow!(e))))
    }
}

/// Drops one message file per recipient into a directory, for pickup by
/// whatever actually delivers mail.
pub struct OutboxNotifier {
    dir: PathBuf,
    seq: usize,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: 0,
        }
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&mut self, recipient: &str, changes: &[ChangeRecord]) -> Result<(), WatchError> {
        let err = |e: std::io::Error| {
            WatchError::notify(recipient, "Notify", Some(anyhow::anyhow!(e)))
        };
        fs::create_dir_all(&self.dir).map_err(err)?;
        self.seq += 1;
        let path = self
            .dir
            .join(format!("{:03}-{}.txt", self.seq, file_safe(recipient)));
        fs::write(&path, format_mail(recipient, &render_message(changes))).map_err(err)?;
        tracing::debug!(path = %path.display(), "wrote outbox message");
        Ok(())
    }
}

fn format_mail(recipient: &str, message: &Message) -> String {
    format!(
        "To: {}\nSubject: {}\n\n{}",
        recipient, message.subject, message.body
    )
}

fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::Price;
    use pretty_assertions::assert_eq;

    fn changes() -> Vec<ChangeRecord> {
        vec![ChangeRecord {
            url: "https://www.amazon.in/dp/B0C1".into(),
            previous_price: Some(Price::from_major(999)),
            current_price: Price::from_major(949),
        }]
    }

    struct FailFor(&'static str, Vec<String>);

    impl Notifier for FailFor {
        fn notify(&mut self, recipient: &str, _: &[ChangeRecord]) -> Result<(), WatchError> {
            if recipient == self.0 {
                return Err(WatchError::notify(recipient, "Notify", None));
            }
            self.1.push(recipient.to_string());
            Ok(())
        }
    }

    #[test]
    fn render_lists_each_change() {
        let msg = render_message(&changes());
        assert_eq!(msg.subject, "Price Change Alert");
        assert_eq!(
            msg.body,
            "The following products have changed price:\n\n\
             URL: https://www.amazon.in/dp/B0C1\n\
             Previous Price: ₹999.00\n\
             Current Price: ₹949.00\n\n"
        );
    }

    #[test]
    fn writer_notifier_formats_mail() {
        let mut n = WriterNotifier::new(Vec::new());
        n.notify("a@example.com", &changes()).unwrap();
        let out = String::from_utf8(n.into_inner()).unwrap();
        assert!(out.starts_with("To: a@example.com\nSubject: Price Change Alert\n\n"));
        assert!(out.contains("Current Price: ₹949.00"));
    }

    #[test]
    fn notify_all_skips_empty_change_list() {
        let mut n = FailFor("", Vec::new());
        let summary = notify_all(&mut n, &["a@example.com".to_string()], &[]);
        assert_eq!(summary.sent, 0);
        assert!(n.1.is_empty());
    }

    #[test]
    fn notify_all_continues_past_failures() {
        let mut n = FailFor("bad@example.com", Vec::new());
        let recipients = vec![
            "a@example.com".to_string(),
            "bad@example.com".to_string(),
            "c@example.com".to_string(),
        ];
        let summary = notify_all(&mut n, &recipients, &changes());
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].url, "bad@example.com");
        assert_eq!(n.1, vec!["a@example.com", "c@example.com"]);
    }

    #[test]
    fn outbox_writes_one_file_per_recipient() {
        let dir = tempfile::TempDir::new().unwrap();
        let outbox = dir.path().join("outbox");
        let mut n = OutboxNotifier::new(&outbox);
        let recipients = vec!["a@example.com".to_string(), "b+x@example.com".to_string()];
        let summary = notify_all(&mut n, &recipients, &changes());
        assert_eq!(summary.sent, 2);

        let mut names: Vec<String> = fs::read_dir(&outbox)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["001-a@example.com.txt", "002-b_x@example.com.txt"]);

        let first = fs::read_to_string(outbox.join("001-a@example.com.txt")).unwrap();
        assert!(first.starts_with("To: a@example.com\n"));
    }
}
