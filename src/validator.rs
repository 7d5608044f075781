use anyhow::anyhow;
use axum::{
    Json,
    extract::{
        FromRequest, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use campusdesk_core::AppError;

/// Flattens nested and list errors into `field: message` strings.
fn collect_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = match (prefix.is_empty(), &field[..]) {
            (true, "__all__") => String::new(),
            (false, "__all__") => prefix.to_string(),
            (true, f) => f.to_string(),
            (false, f) => format!("{}.{}", prefix, f),
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path));
                    if path.is_empty() || err.message.is_none() {
                        out.push(message);
                    } else {
                        out.push(format!("{}: {}", path, message));
                    }
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

pub fn format_errors(errors: &ValidationErrors) -> String {
    let mut out = Vec::new();
    collect_errors("", errors, &mut out);
    out.join(", ")
}

/// JSON body extractor that runs `validator` rules. Every rejection is a 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection_to_error)?;

        value
            .validate()
            .map_err(|errors| AppError::bad_request(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

fn json_rejection_to_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let error_msg = rejection.body_text();

    if error_msg.contains("missing field") {
        let field = error_msg
            .split("missing field `")
            .nth(1)
            .and_then(|s| s.split('`').next())
            .unwrap_or("unknown");
        return AppError::bad_request(anyhow!("{} is required", field));
    }

    if error_msg.contains("unknown variant") || error_msg.contains("invalid type") {
        return AppError::bad_request(anyhow!("Invalid field value in request: {}", error_msg));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

/// Unwraps an optional-rejection `Query` extractor, turning a bad query string into a 400.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| AppError::bad_request(anyhow!("Invalid query parameters: {}", e.body_text())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Inner {
        #[validate(length(min = 2, message = "too short"))]
        name: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Outer {
        #[validate(range(min = 1))]
        count: i32,
        #[validate(nested)]
        items: Vec<Inner>,
    }

    #[test]
    fn nested_list_errors_are_reported() {
        let outer = Outer {
            count: 0,
            items: vec![
                Inner {
                    name: "ok".to_string(),
                },
                Inner {
                    name: "x".to_string(),
                },
            ],
        };
        let msg = format_errors(&outer.validate().unwrap_err());
        assert!(msg.contains("count is invalid"), "{msg}");
        assert!(msg.contains("items[1].name: too short"), "{msg}");
    }
}
