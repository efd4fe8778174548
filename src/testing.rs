use crate::api::{ApiResponse, LttApi, ServiceFields};
use crate::error::{CliError, CliResult};
use crate::prompt::Prompter;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// In-memory API: replies are queued per method and the last queued reply
/// keeps answering. Every call is recorded as `method|arg|arg...`.
#[derive(Default)]
pub struct FakeApi {
    replies: Mutex<HashMap<&'static str, VecDeque<ApiResponse>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &'static str, status: u16, body: Value) {
        if let Ok(mut replies) = self.replies.lock() {
            replies
                .entry(method)
                .or_default()
                .push_back(ApiResponse::new(status, body));
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn calls_named(&self, method: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.split('|').next() == Some(method))
            .collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls_named(method).len()
    }

    fn reply(&self, method: &'static str, args: &[&str]) -> CliResult<ApiResponse> {
        let mut call = vec![method.to_string()];
        call.extend(args.iter().map(|arg| arg.to_string()));
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.join("|"));
        }

        let mut replies = self
            .replies
            .lock()
            .map_err(|_| CliError::remote("fake api poisoned"))?;
        let queue = replies
            .get_mut(method)
            .ok_or_else(|| CliError::remote(format!("unexpected call: {}", method)))?;
        if queue.len() > 1 {
            queue
                .pop_front()
                .ok_or_else(|| CliError::remote(format!("unexpected call: {}", method)))
        } else {
            queue
                .front()
                .cloned()
                .ok_or_else(|| CliError::remote(format!("unexpected call: {}", method)))
        }
    }
}

fn fields_text(fields: &ServiceFields) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

impl LttApi for FakeApi {
    fn get_verification_code(&self, phone_num: &str, device_id: &str) -> CliResult<ApiResponse> {
        self.reply("get_verification_code", &[phone_num, device_id])
    }

    fn verify_phone_num(
        &self,
        otp: &str,
        phone_num: &str,
        device_id: &str,
    ) -> CliResult<ApiResponse> {
        self.reply("verify_phone_num", &[otp, phone_num, device_id])
    }

    fn signup(&self, phone_num: &str, device_id: &str) -> CliResult<ApiResponse> {
        self.reply("signup", &[phone_num, device_id])
    }

    fn get_token(
        &self,
        client_id: &str,
        client_secret: &str,
        phone_num: &str,
        device_id: &str,
    ) -> CliResult<ApiResponse> {
        self.reply("get_token", &[client_id, client_secret, phone_num, device_id])
    }

    fn refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> CliResult<ApiResponse> {
        self.reply("refresh_token", &[refresh_token, client_id, client_secret])
    }

    fn validate_token(&self, token: &str) -> CliResult<ApiResponse> {
        self.reply("validate_token", &[token])
    }

    fn delete_account(&self, token: &str) -> CliResult<ApiResponse> {
        self.reply("delete_account", &[token])
    }

    fn get_services(&self) -> CliResult<ApiResponse> {
        self.reply("get_services", &[])
    }

    fn get_service_info(&self, service_type_id: &str) -> CliResult<ApiResponse> {
        self.reply("get_service_info", &[service_type_id])
    }

    fn get_package_categories(&self) -> CliResult<ApiResponse> {
        self.reply("get_package_categories", &[])
    }

    fn get_packages(&self, category_id: &str) -> CliResult<ApiResponse> {
        self.reply("get_packages", &[category_id])
    }

    fn add_service(
        &self,
        service_type_id: &str,
        name: &str,
        fields: &ServiceFields,
        token: &str,
    ) -> CliResult<ApiResponse> {
        let fields = fields_text(fields);
        self.reply("add_service", &[service_type_id, name, fields.as_str(), token])
    }

    fn delete_service(&self, service_id: &str, token: &str) -> CliResult<ApiResponse> {
        self.reply("delete_service", &[service_id, token])
    }

    fn update_friendly_name(
        &self,
        new_name: &str,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        self.reply("update_friendly_name", &[new_name, service_id, token])
    }

    fn get_user_service_info(
        &self,
        fields: &ServiceFields,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        let fields = fields_text(fields);
        self.reply("get_user_service_info", &[fields.as_str(), service_id, token])
    }

    fn recharge_voucher(
        &self,
        voucher: &str,
        fields: &ServiceFields,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        let fields = fields_text(fields);
        self.reply("recharge_voucher", &[voucher, fields.as_str(), service_id, token])
    }

    fn get_auto_recharge_status(&self, service_id: &str, token: &str) -> CliResult<ApiResponse> {
        self.reply("get_auto_recharge_status", &[service_id, token])
    }

    fn toggle_auto_recharge_status(
        &self,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        self.reply("toggle_auto_recharge_status", &[service_id, token])
    }

    fn subscribe_to_package(
        &self,
        package_id: &str,
        fields: &ServiceFields,
        service_id: &str,
        token: &str,
    ) -> CliResult<ApiResponse> {
        let fields = fields_text(fields);
        self.reply(
            "subscribe_to_package",
            &[package_id, fields.as_str(), service_id, token],
        )
    }
}

/// Replays canned answers; confirmations read `y`/`n`. Running out of
/// answers behaves like the user aborting.
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|answer| answer.to_string()).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|asked| asked.clone()).unwrap_or_default()
    }

    fn next(&self, label: &str) -> CliResult<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(label.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .ok_or_else(CliError::aborted)
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, label: &str) -> CliResult<String> {
        self.next(label)
    }

    fn confirm(&self, label: &str, default: bool) -> CliResult<bool> {
        let answer = self.next(label)?;
        Ok(match answer.trim() {
            "y" | "Y" | "yes" => true,
            "n" | "N" | "no" => false,
            _ => default,
        })
    }
}
