use vendora_common::{Notification, Priority};

/// Render a notification to an email subject and plain-text body.
pub fn render(notification: &Notification) -> (String, String) {
    let prefix = match notification.priority {
        Priority::Urgent => "[URGENT] ",
        Priority::High => "[Action needed] ",
        Priority::Medium | Priority::Low => "",
    };
    let subject = format!("{prefix}{}", notification.title);

    let mut body = notification.message.clone();
    if let Some(url) = &notification.action_url {
        body.push_str("\n\nView details: ");
        body.push_str(url);
    }
    body.push_str("\n\n— Vendora Marketplace");

    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use vendora_common::{Identity, NotificationRequest, NotificationType};

    fn notification(priority: Priority, action_url: Option<&str>) -> Notification {
        let builder = NotificationRequest::builder()
            .recipient(Identity::user(Uuid::new_v4()))
            .notification_type(NotificationType::LowStock)
            .title("Low stock: Blue Mug")
            .message("Only 3 units remain.")
            .priority(priority);
        let request = match action_url {
            Some(url) => builder.action_url(url).build(),
            None => builder.build(),
        };
        Notification::from_request(request, Utc::now())
    }

    #[test]
    fn urgent_priority_is_flagged_in_subject() {
        let (subject, _) = render(&notification(Priority::Urgent, None));
        assert!(subject.starts_with("[URGENT] "));
    }

    #[test]
    fn medium_priority_subject_is_plain() {
        let (subject, _) = render(&notification(Priority::Medium, None));
        assert_eq!(subject, "Low stock: Blue Mug");
    }

    #[test]
    fn action_url_appears_in_body() {
        let (_, body) = render(&notification(Priority::Medium, Some("/products/42")));
        assert!(body.contains("View details: /products/42"));
    }
}
