use actix_web::HttpResponse;

pub struct Success<T: serde::Serialize> {
    pub status: actix_web::http::StatusCode,
    pub body: T,
}

impl<T: serde::Serialize> Success<T> {
    pub fn ok(data: T) -> Self {
        Self { status: actix_web::http::StatusCode::OK, body: data }
    }
}

impl<T: serde::Serialize> actix_web::Responder for Success<T> {
    type Body = actix_web::body::BoxBody;

    fn respond_to(self, _req: &actix_web::HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::build(self.status).json(self.body)
    }
}

/// Body returned by mutations that have nothing else to report.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Acknowledged {
    pub success: bool,
}

impl Acknowledged {
    pub fn yes() -> Self {
        Self { success: true }
    }
}
