use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use indexmap::IndexMap;
use reqwest::Method;
use serde_json::{json, Value};

const UNEXPECTED_RESPONSE: &str = "Unexpected response from server";

/// Raw outcome of a remote call: HTTP status and the decoded JSON body
/// (`Value::Null` when the body is not JSON).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// `message`, or `error.message`, when the provider included one.
    pub fn message(&self) -> Option<String> {
        self.body
            .get("message")
            .and_then(|value| value_text(Some(value)))
            .or_else(|| {
                self.body
                    .get("error")
                    .and_then(|error| error.get("message"))
                    .and_then(|value| value_text(Some(value)))
            })
    }
}

/// Field name to value map a provider requires for one service.
pub type ServiceFields = IndexMap<String, String>;

/// The carrier's account API. Every method is one blocking round trip.
pub trait LttApi {
    fn get_verification_code(&self, phone_num: &str, device_id: &str) -> CliResult<ApiResponse>;
    fn verify_phone_num(&self, otp: &str, phone_num: &str, device_id: &str)
        -> CliResult<ApiResponse>;
    fn signup(&self, phone_num: &str, device_id: &str) -> CliResult<ApiResponse>;
    fn get_token(
        &self,
        client_id: &str,
        client_secret: &str,
        phone_num: &str,
        device_id: &str,
    ) -> CliResult<ApiResponse>;
    fn refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> CliResult<ApiResponse>;
    fn validate_token(&self, token: &str) -> CliResult<ApiResponse>;
    fn delete_account(&self, token: &str) -> CliResult<ApiResponse>;

    fn get_services(&self) -> CliResult<ApiResponse>;
    fn get_service_info(&self, service_type_id: &str) -> CliResult<ApiResponse>;
    fn get_package_categories(&self) -> CliResult<ApiResponse>;
    fn get_packages(&self, category_id: &str) -> CliResult<ApiResponse>;

    fn add_service(
        &self,
        service_type_id: &str,
        name: &str,
        fields: &ServiceFields,
        token: &str,
    ) -> CliResult<ApiResponse>;
    fn delete_service(&self, service_id: &str, token: &str) -> CliResult<ApiResponse>;
    fn update_friendly_name(
        &self,
        new_name: &str,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse>;
    fn get_user_service_info(
        &self,
        fields: &ServiceFields,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse>;
    fn recharge_voucher(
        &self,
        voucher: &str,
        fields: &ServiceFields,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse>;
    fn get_auto_recharge_status(&self, service_id: &str, token: &str) -> CliResult<ApiResponse>;
    fn toggle_auto_recharge_status(&self, service_id: &str, token: &str)
        -> CliResult<ApiResponse>;
    fn subscribe_to_package(
        &self,
        package_id: &str,
        fields: &ServiceFields,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse>;
}

/// Turns a raw response into its body, or into the fatal error for the
/// current command. The provider message is echoed on success.
pub fn handle_response(response: ApiResponse) -> CliResult<Value> {
    let message = response.message();
    if !response.is_success() {
        return Err(CliError::remote(
            message.unwrap_or_else(|| UNEXPECTED_RESPONSE.to_string()),
        ));
    }
    if let Some(message) = message {
        println!("{}", message);
    }
    Ok(response.body)
}

pub fn unexpected_response() -> CliError {
    CliError::remote(UNEXPECTED_RESPONSE)
}

pub fn get_path_value<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = current.get(*segment)?;
    }
    Some(current)
}

/// Text of a JSON scalar; provider ids arrive as either strings or numbers.
pub fn value_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    }
}

/// JSON truthiness: null, false, 0, "" and empty containers are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

pub fn require_text(body: &Value, path: &[&str]) -> CliResult<String> {
    value_text(get_path_value(body, path)).ok_or_else(unexpected_response)
}

pub struct HttpLttApi {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpLttApi {
    pub fn new(config: &AppConfig) -> CliResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("ltt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CliError::remote(format!("failed to build HTTP client: {}", err)))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> CliResult<ApiResponse> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut request = self
            .client
            .request(method, &url)
            .header("Accept", "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .map_err(|err| CliError::remote(format!("failed to reach {}: {}", url, err)))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|err| CliError::remote(format!("failed to read response: {}", err)))?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
        Ok(ApiResponse::new(status, body))
    }
}

impl LttApi for HttpLttApi {
    fn get_verification_code(&self, phone_num: &str, device_id: &str) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            "auth/otp",
            None,
            Some(json!({ "mobile": phone_num, "device_id": device_id })),
        )
    }

    fn verify_phone_num(
        &self,
        otp: &str,
        phone_num: &str,
        device_id: &str,
    ) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            "auth/otp/verify",
            None,
            Some(json!({ "otp": otp, "mobile": phone_num, "device_id": device_id })),
        )
    }

    fn signup(&self, phone_num: &str, device_id: &str) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            "auth/register",
            None,
            Some(json!({ "mobile": phone_num, "device_id": device_id })),
        )
    }

    fn get_token(
        &self,
        client_id: &str,
        client_secret: &str,
        phone_num: &str,
        device_id: &str,
    ) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            "oauth/token",
            None,
            Some(json!({
                "grant_type": "password",
                "client_id": client_id,
                "client_secret": client_secret,
                "username": phone_num,
                "password": device_id,
            })),
        )
    }

    fn refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            "oauth/token",
            None,
            Some(json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
                "client_id": client_id,
                "client_secret": client_secret,
            })),
        )
    }

    fn validate_token(&self, token: &str) -> CliResult<ApiResponse> {
        self.send(Method::GET, "auth/validate", Some(token), None)
    }

    fn delete_account(&self, token: &str) -> CliResult<ApiResponse> {
        self.send(Method::DELETE, "auth/account", Some(token), None)
    }

    fn get_services(&self) -> CliResult<ApiResponse> {
        self.send(Method::GET, "services", None, None)
    }

    fn get_service_info(&self, service_type_id: &str) -> CliResult<ApiResponse> {
        self.send(Method::GET, &format!("services/{}", service_type_id), None, None)
    }

    fn get_package_categories(&self) -> CliResult<ApiResponse> {
        self.send(Method::GET, "packages/categories", None, None)
    }

    fn get_packages(&self, category_id: &str) -> CliResult<ApiResponse> {
        self.send(
            Method::GET,
            &format!("packages/categories/{}", category_id),
            None,
            None,
        )
    }

    fn add_service(
        &self,
        service_type_id: &str,
        name: &str,
        fields: &ServiceFields,
        token: &str,
    ) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            "user/services",
            Some(token),
            Some(json!({
                "service_id": service_type_id,
                "friendly_name": name,
                "credentials": fields,
            })),
        )
    }

    fn delete_service(&self, service_id: &str, token: &str) -> CliResult<ApiResponse> {
        self.send(
            Method::DELETE,
            &format!("user/services/{}", service_id),
            Some(token),
            None,
        )
    }

    fn update_friendly_name(
        &self,
        new_name: &str,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        self.send(
            Method::PUT,
            &format!("user/services/{}", service_id),
            Some(token),
            Some(json!({ "friendly_name": new_name })),
        )
    }

    fn get_user_service_info(
        &self,
        fields: &ServiceFields,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            &format!("user/services/{}/info", service_id),
            Some(token),
            Some(json!({ "credentials": fields })),
        )
    }

    fn recharge_voucher(
        &self,
        voucher: &str,
        fields: &ServiceFields,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            &format!("user/services/{}/recharge", service_id),
            Some(token),
            Some(json!({ "voucher": voucher, "credentials": fields })),
        )
    }

    fn get_auto_recharge_status(&self, service_id: &str, token: &str) -> CliResult<ApiResponse> {
        self.send(
            Method::GET,
            &format!("user/services/{}/auto-recharge", service_id),
            Some(token),
            None,
        )
    }

    fn toggle_auto_recharge_status(
        &self,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            &format!("user/services/{}/auto-recharge", service_id),
            Some(token),
            None,
        )
    }

    fn subscribe_to_package(
        &self,
        package_id: &str,
        fields: &ServiceFields,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        self.send(
            Method::POST,
            &format!("user/services/{}/subscribe", service_id),
            Some(token),
            Some(json!({ "package_id": package_id, "credentials": fields })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn top_level_message_is_used_for_failures() {
        let response = ApiResponse::new(401, json!({ "message": "Invalid OTP" }));
        let err = handle_response(response).expect_err("401 must fail");
        assert_eq!(err.kind, ErrorKind::RemoteApi);
        assert_eq!(err.message, "Invalid OTP");
    }

    #[test]
    fn nested_error_message_is_used_when_top_level_is_absent() {
        let response = ApiResponse::new(
            500,
            json!({ "error": { "code": 12, "message": "Service unavailable" } }),
        );
        let err = handle_response(response).expect_err("500 must fail");
        assert_eq!(err.message, "Service unavailable");
    }

    #[test]
    fn failure_without_message_uses_generic_fallback() {
        let err = handle_response(ApiResponse::new(502, Value::Null)).expect_err("must fail");
        assert_eq!(err.message, "Unexpected response from server");
    }

    #[test]
    fn only_status_200_counts_as_success() {
        let err = handle_response(ApiResponse::new(201, json!({}))).expect_err("201 must fail");
        assert_eq!(err.kind, ErrorKind::RemoteApi);

        let body = handle_response(ApiResponse::new(200, json!({ "result": { "id": 4 } })))
            .expect("200 succeeds");
        assert_eq!(require_text(&body, &["result", "id"]).expect("id"), "4");
    }

    #[test]
    fn require_text_reports_missing_fields_as_unexpected() {
        let err = require_text(&json!({ "result": {} }), &["result", "client_secret"])
            .expect_err("missing field");
        assert_eq!(err.message, "Unexpected response from server");
    }

    #[test]
    fn truthiness_follows_json_emptiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!({ "a": null })));
    }

    #[test]
    fn value_text_accepts_strings_and_numbers_only() {
        assert_eq!(value_text(Some(&json!(" abc "))), Some("abc".to_string()));
        assert_eq!(value_text(Some(&json!(42))), Some("42".to_string()));
        assert_eq!(value_text(Some(&json!(""))), None);
        assert_eq!(value_text(Some(&json!({ "a": 1 }))), None);
        assert_eq!(value_text(None), None);
    }
}
