use reqwest::Response;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::FetchError;
use crate::parser::{decode_envelope, TimetableEnvelope};
use crate::quiz::{Quiz, QuizAnalysis, QuizRequest, QuizSubmission};

/// Who the API calls are made for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub student_id: String,
    pub token: String,
}

impl SessionContext {
    pub fn new(student_id: impl Into<String>, token: impl Into<String>) -> Self {
        SessionContext {
            student_id: student_id.into(),
            token: token.into(),
        }
    }

    fn require(&self) -> Result<(), FetchError> {
        if self.student_id.trim().is_empty() || self.token.trim().is_empty() {
            return Err(FetchError::MissingIdentity);
        }
        Ok(())
    }
}

/// Client for the academic portal API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /student/timetable?student_id=<id>`
    pub async fn fetch_timetable(&self, ctx: &SessionContext) -> Result<TimetableEnvelope, FetchError> {
        ctx.require()?;
        let url = format!("{}/student/timetable", self.base_url);
        debug!(%url, student_id = %ctx.student_id, "fetching timetable");

        let response = self
            .http
            .get(&url)
            .query(&[("student_id", ctx.student_id.as_str())])
            .bearer_auth(&ctx.token)
            .send()
            .await?;
        let body = read_success(response).await?;
        let envelope = decode_envelope(&body)?;

        info!(
            student_id = %ctx.student_id,
            sessions = envelope.data.len(),
            source = envelope.source.as_deref().unwrap_or("unknown"),
            "timetable loaded"
        );
        Ok(envelope)
    }

    /// `POST /quiz/generate`
    pub async fn generate_quiz(&self, ctx: &SessionContext, request: &QuizRequest) -> Result<Quiz, FetchError> {
        ctx.require()?;
        let url = format!("{}/quiz/generate", self.base_url);
        debug!(%url, course = %request.course_id, unit = request.unit, "generating quiz");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&ctx.token)
            .json(request)
            .send()
            .await?;
        let body = read_success(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /ai/quiz-analysis`, priorities come back sorted High to Low
    pub async fn analyze_quiz(
        &self,
        ctx: &SessionContext,
        submission: &QuizSubmission,
    ) -> Result<QuizAnalysis, FetchError> {
        ctx.require()?;
        let url = format!("{}/ai/quiz-analysis", self.base_url);
        debug!(
            %url,
            course = %submission.course_id,
            mistakes = submission.wrong_questions.len(),
            "requesting quiz analysis"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&ctx.token)
            .json(submission)
            .send()
            .await?;
        let body = read_success(response).await?;
        let mut analysis: QuizAnalysis = serde_json::from_str(&body)?;
        analysis.sort_priorities();
        Ok(analysis)
    }
}

async fn read_success(response: Response) -> Result<String, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use std::collections::HashMap;

    const TOKEN: &str = "test-token";

    fn authorized(req: &HttpRequest) -> bool {
        req.headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("Bearer {TOKEN}"))
            .unwrap_or(false)
    }

    async fn fake_timetable(req: HttpRequest, query: web::Query<HashMap<String, String>>) -> HttpResponse {
        if !authorized(&req) {
            return HttpResponse::Unauthorized().json(serde_json::json!({"error": "Invalid or expired token"}));
        }
        match query.get("student_id").map(String::as_str) {
            Some("1RV22CS001") => HttpResponse::Ok().json(serde_json::json!({
                "source": "database",
                "data": [{
                    "course_id": "CD252IA",
                    "title": "DBMS",
                    "section_name": "A",
                    "day_of_week": "Monday",
                    "start_time": "09:00",
                    "end_time": "10:00",
                    "room_number": "PG-101"
                }]
            })),
            Some("broken") => HttpResponse::Ok().json(serde_json::json!({"rows": []})),
            _ => HttpResponse::InternalServerError().finish(),
        }
    }

    async fn fake_analysis(req: HttpRequest, body: web::Json<QuizSubmission>) -> HttpResponse {
        if !authorized(&req) {
            return HttpResponse::Unauthorized().finish();
        }
        HttpResponse::Ok().json(serde_json::json!({
            "weak_areas": [format!("{} basics", body.course_id)],
            "study_priorities": [
                {"topic": "Joins", "priority": "Low", "reason": "minor"},
                {"topic": "Keys", "priority": "High", "reason": "missed twice"}
            ]
        }))
    }

    /// Starts a fake API on an ephemeral port and returns a client for it
    fn spawn_fake_api() -> ApiClient {
        let server = HttpServer::new(|| {
            App::new()
                .route("/student/timetable", web::get().to(fake_timetable))
                .route("/ai/quiz-analysis", web::post().to(fake_analysis))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        ApiClient::with_client(http, format!("http://{addr}/"))
    }

    #[test]
    fn trims_trailing_slash() {
        assert_eq!(ApiClient::new("http://localhost:8080/").base_url(), "http://localhost:8080");
    }

    #[actix_web::test]
    async fn missing_identity_skips_the_request() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client
            .fetch_timetable(&SessionContext::new("", TOKEN))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingIdentity));
    }

    #[actix_web::test]
    async fn fetches_timetable_with_bearer_token() {
        let client = spawn_fake_api();
        let envelope = client
            .fetch_timetable(&SessionContext::new("1RV22CS001", TOKEN))
            .await
            .unwrap();
        assert_eq!(envelope.source.as_deref(), Some("database"));
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].course_id, "CD252IA");
    }

    #[actix_web::test]
    async fn non_success_status_is_reported() {
        let client = spawn_fake_api();
        let err = client
            .fetch_timetable(&SessionContext::new("1RV22CS001", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(401)));

        let err = client
            .fetch_timetable(&SessionContext::new("unknown", TOKEN))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
    }

    #[actix_web::test]
    async fn shape_mismatch_is_a_decode_error() {
        let client = spawn_fake_api();
        let err = client
            .fetch_timetable(&SessionContext::new("broken", TOKEN))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[actix_web::test]
    async fn analysis_comes_back_sorted() {
        let client = spawn_fake_api();
        let submission = QuizSubmission {
            course_id: "CD252IA".into(),
            wrong_questions: Vec::new(),
            total_questions: 5,
            score: 3,
        };
        let analysis = client
            .analyze_quiz(&SessionContext::new("1RV22CS001", TOKEN), &submission)
            .await
            .unwrap();
        assert_eq!(analysis.weak_areas, vec!["CD252IA basics".to_string()]);
        assert_eq!(analysis.study_priorities[0].topic, "Keys");
    }
}
