//! Extractors whose rejections surface as `BookingError::Validation`, so
//! malformed bodies, query strings and path ids get the same JSON error body
//! as every other bad input.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::BookingError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(BookingError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(BookingError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(BookingError))]
pub struct ApiPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use chrono::NaiveDate;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Dates {
        check_in: Option<NaiveDate>,
    }

    #[tokio::test]
    async fn malformed_json_date_is_a_validation_error() {
        let request = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"check_in":"2024-13-01"}"#))
            .unwrap();
        let err = ApiJson::<Dates>::from_request(request, &()).await.unwrap_err();
        match err {
            BookingError::Validation(msg) => assert!(msg.contains("check_in"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_query_is_a_validation_error() {
        let (mut parts, _) = Request::builder().uri("/?check_in=junk").body(()).unwrap().into_parts();
        let err = ApiQuery::<Dates>::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let (mut parts, _) = Request::builder().uri("/?check_in=2024-06-01").body(()).unwrap().into_parts();
        let ApiQuery(dates) = ApiQuery::<Dates>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(dates.check_in, NaiveDate::from_ymd_opt(2024, 6, 1));
    }
}
