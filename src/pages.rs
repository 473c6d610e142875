use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::error;

/// Render a template, falling back to a bare 500 if rendering itself fails.
pub fn render<T: Template>(status: StatusCode, page: &T) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "template render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// One-shot messages carried across a redirect in `?notice=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Registered,
    LoginRequired,
    LoggedOut,
}

impl Notice {
    const ALL: [Notice; 3] = [Notice::Registered, Notice::LoginRequired, Notice::LoggedOut];

    fn code(self) -> &'static str {
        match self {
            Notice::Registered => "registered",
            Notice::LoginRequired => "login_required",
            Notice::LoggedOut => "logged_out",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::Registered => "Registration successful. Please log in.",
            Notice::LoginRequired => "Please log in to take the survey.",
            Notice::LoggedOut => "You have been logged out.",
        }
    }

    /// `path` with this notice attached.
    pub fn location(self, path: &str) -> String {
        format!("{path}?notice={}", self.code())
    }
}

/// Query string of pages that show a [`Notice`]. Unknown codes are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    pub fn message(&self) -> Option<String> {
        let code = self.notice.as_deref()?;
        Notice::ALL
            .into_iter()
            .find(|n| n.code() == code)
            .map(|n| n.message().to_string())
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub logged_in: bool,
    pub is_admin: bool,
    pub notice: Option<String>,
}

#[derive(Template, Default)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub error: Option<String>,
    pub email: String,
    pub phone: String,
}

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub email: String,
}

pub struct QuestionView {
    pub number: usize,
    pub text: &'static str,
    pub answer: String,
}

#[derive(Template)]
#[template(path = "survey.html")]
pub struct SurveyPage {
    pub email: String,
    pub questions: Vec<QuestionView>,
}

#[derive(Template)]
#[template(path = "thanks.html")]
pub struct ThanksPage {
    pub updated: bool,
}

#[derive(Template, Default)]
#[template(path = "admin_gate.html")]
pub struct AdminGatePage {
    pub error: Option<String>,
}

pub struct EntryView {
    pub response_id: String,
    pub user_id: i64,
    pub email: String,
    pub phone: String,
    pub submitted_at: String,
    pub answers: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminPage {
    pub questions: &'static [&'static str],
    pub entries: Vec<EntryView>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_input_is_escaped() {
        let page = RegisterPage {
            error: Some("<b>bad</b>".into()),
            email: "\"><script>alert(1)</script>".into(),
            phone: String::new(),
        };
        let html = page.render().expect("render");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;b&gt;bad"));
    }

    #[test]
    fn notices_round_trip_through_the_query_string() {
        for notice in Notice::ALL {
            let location = notice.location("/login");
            let code = location.split_once("?notice=").expect("query").1;
            let q = NoticeQuery { notice: Some(code.to_string()) };
            assert_eq!(q.message().as_deref(), Some(notice.message()));
        }
        let q = NoticeQuery { notice: Some("<script>".into()) };
        assert_eq!(q.message(), None);
        assert_eq!(NoticeQuery::default().message(), None);
    }

    #[test]
    fn index_shows_notice() {
        let page = IndexPage {
            logged_in: false,
            is_admin: false,
            notice: Some(Notice::LoggedOut.message().into()),
        };
        let html = page.render().expect("render");
        assert!(html.contains("You have been logged out."));
    }

    #[test]
    fn survey_form_numbers_fields_from_one() {
        let page = SurveyPage {
            email: "a@b.io".into(),
            questions: vec![
                QuestionView { number: 1, text: "First?", answer: "yes".into() },
                QuestionView { number: 2, text: "Second?", answer: String::new() },
            ],
        };
        let html = page.render().expect("render");
        assert!(html.contains(r#"name="q1""#));
        assert!(html.contains(r#"name="q2""#));
        assert!(html.contains("yes"));
    }
}
