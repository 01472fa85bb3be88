//! Emails sent after a committed change. Delivery failures are logged and
//! never reach the caller.

use super::mailer::{EmailMessage, Mailer};
use crate::database::models::{CaseView, GeneralRequestView};

fn recipients<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for email in candidates.into_iter().flatten() {
        let email = email.trim();
        if email.is_empty() || out.iter().any(|known| known.eq_ignore_ascii_case(email)) {
            continue;
        }
        out.push(email.to_string());
    }
    out
}

async fn deliver(mailer: &dyn Mailer, message: EmailMessage) {
    if message.to.is_empty() {
        return;
    }
    if let Err(e) = mailer.send(&message).await {
        tracing::warn!("Notification '{}' not delivered: {}", message.subject, e);
    }
}

/// Escapes text placed inside the HTML body.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn case_body(case: &CaseView, headline: &str) -> String {
    format!(
        "<p>{headline}</p>\
         <p><strong>Caso #{id}</strong>: {subject}</p>\
         <p>Estado: {status}<br>Prioridad: {priority}<br>Técnico: {technician}</p>",
        headline = headline,
        id = case.id_case,
        subject = escape_html(&case.subject),
        status = escape_html(&case.status_name),
        priority = escape_html(&case.priority),
        technician = escape_html(case.technical_account_name.as_deref().unwrap_or("Sin asignar")),
    )
}

fn request_body(request: &GeneralRequestView, headline: &str) -> String {
    format!(
        "<p>{headline}</p>\
         <p><strong>Solicitud #{id}</strong>: {subject}</p>\
         <p>Proceso: {process} / {category}<br>Estado: {status}<br>Responsable: {owner}</p>",
        headline = headline,
        id = request.id_general_request,
        subject = escape_html(&request.subject),
        process = escape_html(&request.process_name),
        category = escape_html(&request.process_category_name),
        status = escape_html(&request.status_name),
        owner = escape_html(request.assigned_user_name.as_deref().unwrap_or("Sin asignar")),
    )
}

pub async fn case_created(mailer: &dyn Mailer, case: &CaseView) {
    let message = EmailMessage {
        to: recipients([Some(case.requester_email.as_str())]),
        subject: format!("Caso #{} registrado", case.id_case),
        html: case_body(case, "Su caso fue registrado."),
        ..Default::default()
    };
    deliver(mailer, message).await;
}

pub async fn case_updated(mailer: &dyn Mailer, case: &CaseView) {
    let message = EmailMessage {
        to: recipients([Some(case.requester_email.as_str()), case.technical_account_email.as_deref()]),
        subject: format!("Caso #{} actualizado", case.id_case),
        html: case_body(case, "El caso fue actualizado."),
        ..Default::default()
    };
    deliver(mailer, message).await;
}

pub async fn case_assigned(mailer: &dyn Mailer, case: &CaseView) {
    let message = EmailMessage {
        to: recipients([case.technical_account_email.as_deref(), Some(case.requester_email.as_str())]),
        subject: format!("Caso #{} asignado", case.id_case),
        html: case_body(case, "El caso fue asignado."),
        ..Default::default()
    };
    deliver(mailer, message).await;
}

pub async fn request_created(mailer: &dyn Mailer, request: &GeneralRequestView) {
    let message = EmailMessage {
        to: recipients([request.assigned_user_email.as_deref(), Some(request.requester_email.as_str())]),
        subject: format!("Solicitud #{} registrada", request.id_general_request),
        html: request_body(request, "Se registró una nueva solicitud."),
        ..Default::default()
    };
    deliver(mailer, message).await;
}

pub async fn request_updated(mailer: &dyn Mailer, request: &GeneralRequestView) {
    let message = EmailMessage {
        to: recipients([Some(request.requester_email.as_str()), request.assigned_user_email.as_deref()]),
        subject: format!("Solicitud #{} actualizada", request.id_general_request),
        html: request_body(request, "La solicitud fue actualizada."),
        ..Default::default()
    };
    deliver(mailer, message).await;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::integrations::IntegrationError;

    struct FailingMailer {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _message: &EmailMessage) -> Result<(), IntegrationError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(IntegrationError::NotConfigured("servicio de correo"))
        }
    }

    fn case() -> CaseView {
        CaseView {
            id_case: 7,
            subject: "Impresora".into(),
            description: String::new(),
            priority: "Alta".into(),
            case_type: "Incidente".into(),
            id_status: 2,
            status_name: "En proceso".into(),
            is_final: false,
            id_department: None,
            department_name: None,
            id_requester: 1,
            requester_name: "Ana".into(),
            requester_email: "ana@empresa.com".into(),
            id_technical_account: Some(2),
            technical_account_name: Some("Luis".into()),
            technical_account_email: Some("ANA@empresa.com ".into()),
            id_place: None,
            place_name: None,
            id_company: 1,
            resolution: None,
            id_category: None,
            category_name: None,
            id_subcategory: None,
            subcategory_name: None,
            id_activity: None,
            activity_name: None,
            created_at: Utc::now(),
            end_date: None,
        }
    }

    #[test]
    fn recipients_are_trimmed_and_deduplicated() {
        let to = recipients([Some(" ana@empresa.com"), Some("ANA@empresa.com"), None, Some(""), Some("luis@empresa.com")]);
        assert_eq!(to, vec!["ana@empresa.com".to_string(), "luis@empresa.com".to_string()]);
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let mailer = FailingMailer { attempts: AtomicUsize::new(0) };
        case_updated(&mailer, &case()).await;
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn body_mentions_case_and_technician() {
        let html = case_body(&case(), "El caso fue actualizado.");
        assert!(html.contains("Caso #7"));
        assert!(html.contains("Luis"));
    }

    #[test]
    fn user_text_is_escaped_in_body() {
        let mut case = case();
        case.subject = "<a href=\"http://evil\">Haga clic</a>".into();
        case.technical_account_name = Some("Luis & <b>Ana</b>".into());
        let html = case_body(&case, "El caso fue actualizado.");
        assert!(!html.contains("<a href"));
        assert!(html.contains("&lt;a href=&quot;http://evil&quot;&gt;Haga clic&lt;/a&gt;"));
        assert!(html.contains("Luis &amp; &lt;b&gt;Ana&lt;/b&gt;"));
    }

    #[test]
    fn escape_leaves_plain_text_alone() {
        assert_eq!(escape_html("Impresora piso 3"), "Impresora piso 3");
        assert_eq!(escape_html("O'Higgins"), "O&#39;Higgins");
    }
}
