//! Prints job notifications as they arrive.

use splitdl_core::notify::{Notification, NotificationKind};
use tokio::sync::mpsc;

fn format_line(n: &Notification) -> String {
    match n.kind {
        NotificationKind::Progress => format!("  {}", n.message),
        NotificationKind::Success => n.message.clone(),
        NotificationKind::Abort => format!("error: {}", n.message),
    }
}

/// Process exit code for the job's final notification: 0 only when it
/// reported `Success`.
pub(super) fn exit_code(last: Option<NotificationKind>) -> i32 {
    match last {
        Some(NotificationKind::Success) => 0,
        _ => 1,
    }
}

/// Drains `rx` until the job drops its sender. Returns the last kind seen.
pub(super) async fn print_notifications(
    mut rx: mpsc::Receiver<Notification>,
) -> Option<NotificationKind> {
    let mut last = None;
    while let Some(n) = rx.recv().await {
        match n.kind {
            NotificationKind::Abort => eprintln!("{}", format_line(&n)),
            _ => println!("{}", format_line(&n)),
        }
        last = Some(n.kind);
    }
    last
}
