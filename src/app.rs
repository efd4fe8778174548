use crate::api::{
    get_path_value, handle_response, is_truthy, require_text, value_text, ApiResponse,
    HttpLttApi, LttApi, ServiceFields,
};
use crate::cli::{Command, ServiceCli, ServiceCommand};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult, ErrorKind};
use crate::eventlog::{token_fingerprint, SessionEvent, SessionLogWriter};
use crate::format::{format_phone_num, generate_device_id, is_valid_phone_num, normalize_digits};
use crate::prompt::{choice_prompt, integer_prompt, Prompter, TerminalPrompter};
use crate::render::{render_package_catalog, render_service_status, PackageCatalog};
use crate::router::{classify_service_args, resolve_route, resolve_service_target, Route};
use crate::session::SessionManager;
use crate::store::{CredentialStore, Credentials, ServiceRecord};
use clap::Parser;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

const SWITCH_ACCOUNT_PROMPT: &str =
    "Are you sure that you want to switch accounts? all of your services are going to be removed";
const DUPLICATE_NAME: &str = "You already have a service with this name";

/// Loaded account plus the service the command targets, if any.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub credentials: Credentials,
    pub service_name: Option<String>,
}

impl ServiceContext {
    fn require_name(&self) -> CliResult<String> {
        self.service_name
            .clone()
            .ok_or_else(|| CliError::validation("You must specify a service"))
    }
}

struct RequiredField {
    order: i64,
    name: String,
    label: String,
    suffix: Option<String>,
}

pub struct LttApp {
    config: AppConfig,
    store: CredentialStore,
    log: SessionLogWriter,
    api: Arc<dyn LttApi>,
    prompter: Arc<dyn Prompter>,
}

impl LttApp {
    pub fn new(config: AppConfig) -> CliResult<Self> {
        let api = HttpLttApi::new(&config)?;
        Ok(Self::with_clients(
            config,
            Arc::new(api),
            Arc::new(TerminalPrompter),
        ))
    }

    pub fn with_clients(
        config: AppConfig,
        api: Arc<dyn LttApi>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        let store = CredentialStore::new(config.credentials_path());
        let log = SessionLogWriter::new(config.log_dir());
        Self {
            config,
            store,
            log,
            api,
            prompter,
        }
    }

    pub fn run(&self, command: Option<Command>) -> CliResult<()> {
        let credentials = self.store.load()?;
        match resolve_route(command, credentials.is_signed_up())? {
            Route::Signup { replaces_account } => {
                if replaces_account && !self.prompter.confirm(SWITCH_ACCOUNT_PROMPT, false)? {
                    return Err(CliError::aborted());
                }
                self.signup()
            }
            Route::DeleteAccount => self.delete_account(credentials),
            Route::Service(args) => {
                let invocation = classify_service_args(&args);
                let argv = std::iter::once("ltt service".to_string()).chain(invocation.args);
                let parsed = ServiceCli::try_parse_from(argv).unwrap_or_else(|err| err.exit());
                let target =
                    resolve_service_target(&credentials, invocation.service_name, parsed.command)?;
                let context = ServiceContext {
                    credentials,
                    service_name: target.service_name,
                };
                self.dispatch(context, target.command)
            }
        }
    }

    pub fn dispatch(&self, context: ServiceContext, command: ServiceCommand) -> CliResult<()> {
        match command {
            ServiceCommand::ListAll => print_lines(&list_all_lines(&context.credentials)?),
            ServiceCommand::Status => print_lines(&self.status_lines(context)?),
            ServiceCommand::Add => self.add(context),
            ServiceCommand::Remove => self.remove(context),
            ServiceCommand::Rename { new_name } => self.rename(context, new_name),
            ServiceCommand::TopUp { voucher } => self.top_up(context, voucher),
            ServiceCommand::AutoRecharge => self.auto_recharge(context),
            ServiceCommand::Subscribe => self.subscribe(context),
        }
    }

    fn session(&self) -> SessionManager<'_> {
        SessionManager::new(
            self.api.as_ref(),
            &self.store,
            &self.log,
            self.config.lock_dir(),
        )
    }

    /// `handle_response` plus an `api_error` log record on failure.
    fn call(&self, operation: &str, response: CliResult<ApiResponse>) -> CliResult<Value> {
        let result = response.and_then(handle_response);
        if let Err(err) = &result {
            if err.kind == ErrorKind::RemoteApi {
                self.log.write(
                    SessionEvent::ApiError,
                    &[
                        ("operation", Some(operation.to_string())),
                        ("message", Some(err.message.clone())),
                    ],
                );
            }
        }
        result
    }

    fn save(&self, credentials: &Credentials) -> CliResult<()> {
        self.store.save(credentials)?;
        self.log.write(
            SessionEvent::CredentialsSaved,
            &[("services", Some(credentials.services.len().to_string()))],
        );
        Ok(())
    }

    pub fn signup(&self) -> CliResult<()> {
        let device_id = generate_device_id();
        let phone_num = format_phone_num(&self.prompter.input("Mobile number")?);
        if !is_valid_phone_num(&phone_num) {
            return Err(CliError::validation(
                "This is not a valid Libyan mobile number",
            ));
        }

        self.call(
            "get_verification_code",
            self.api.get_verification_code(&phone_num, &device_id),
        )?;
        let otp = integer_prompt(self.prompter.as_ref(), "Verification code")?;
        self.call(
            "verify_phone_num",
            self.api.verify_phone_num(&otp, &phone_num, &device_id),
        )?;

        let body = self.call("signup", self.api.signup(&phone_num, &device_id))?;
        let client_id = require_text(&body, &["result", "client_id"])?;
        let client_secret = require_text(&body, &["result", "client_secret"])?;

        let body = self.call(
            "get_token",
            self.api
                .get_token(&client_id, &client_secret, &phone_num, &device_id),
        )?;
        let token = require_text(&body, &["access_token"])?;
        let refresh_token = require_text(&body, &["refresh_token"])?;

        let credentials = Credentials {
            device_id,
            phone_num,
            client_id,
            client_secret,
            token,
            refresh_token,
            services: IndexMap::new(),
        };
        self.save(&credentials)?;
        self.log.write(
            SessionEvent::SignupComplete,
            &[("token", token_fingerprint(&credentials.token))],
        );
        Ok(())
    }

    pub fn delete_account(&self, credentials: Credentials) -> CliResult<()> {
        if !self.prompter.confirm("Are you sure?", false)? {
            return Ok(());
        }

        let credentials = self.session().ensure_valid(credentials)?;
        self.call("delete_account", self.api.delete_account(&credentials.token))?;
        self.store.delete()?;
        self.log.write(SessionEvent::CredentialsDeleted, &[]);
        Ok(())
    }

    pub fn status_lines(&self, context: ServiceContext) -> CliResult<Vec<String>> {
        let name = context.require_name()?;
        let credentials = self.session().ensure_valid(context.credentials)?;
        let record = service_record(&credentials, &name)?;

        let body = self.call(
            "get_user_service_info",
            self.api.get_user_service_info(
                &record.credentials,
                &record.service_id,
                &credentials.token,
            ),
        )?;
        let payload = body.get("result").cloned().unwrap_or(Value::Null);

        let body = self.call(
            "get_packages",
            self.api.get_packages(&record.package_category_id),
        )?;
        let catalog = PackageCatalog::from_value(body.get("result").unwrap_or(&Value::Null));

        let rendered = render_service_status(
            &name,
            catalog.group_type.as_deref(),
            &payload,
            &self.config.dump_dir,
        );
        if let Some(path) = &rendered.dump_path {
            self.log.write(
                SessionEvent::PhonePayloadDumped,
                &[("path", Some(path.display().to_string()))],
            );
        }
        Ok(rendered.lines)
    }

    pub fn add(&self, context: ServiceContext) -> CliResult<()> {
        let body = self.call("get_services", self.api.get_services())?;
        let service_types: Vec<(String, String)> = body
            .get("result")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        Some((
                            value_text(item.get("name"))?,
                            value_text(item.get("id"))?,
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if service_types.is_empty() {
            return Err(CliError::remote("No service types are available"));
        }

        for (index, (name, _)) in service_types.iter().enumerate() {
            println!("[{}] {}", index + 1, name);
        }
        let choice = choice_prompt(
            self.prompter.as_ref(),
            "Service Type",
            1,
            service_types.len(),
        )?;
        let (service_type, service_type_id) = service_types[choice - 1].clone();

        let body = self.call(
            "get_package_categories",
            self.api.get_package_categories(),
        )?;
        let category_id = body
            .get("result")
            .and_then(Value::as_array)
            .and_then(|categories| {
                categories
                    .iter()
                    .rev()
                    .find(|category| {
                        value_text(category.get("title")).as_deref() == Some(service_type.as_str())
                    })
                    .and_then(|category| value_text(category.get("id")))
            })
            .ok_or_else(|| CliError::remote("Couldn't get the service's category ID"))?;

        let name = match context.service_name {
            Some(name) => name,
            None => self
                .prompter
                .input("What do you want to name this service")?
                .trim()
                .to_string(),
        };
        if name.is_empty() {
            return Err(CliError::validation("The service name can't be empty"));
        }
        if context.credentials.services.contains_key(&name) {
            return Err(CliError::validation(DUPLICATE_NAME));
        }

        let body = self.call(
            "get_service_info",
            self.api.get_service_info(&service_type_id),
        )?;
        let mut fields = ServiceFields::new();
        for field in required_fields(&body) {
            let mut input = self.prompter.input(&field.label)?;
            if let Some(suffix) = &field.suffix {
                if !input.ends_with(suffix.as_str()) {
                    input.push_str(suffix);
                }
            }
            fields.insert(field.name, input);
        }

        let mut credentials = self.session().ensure_valid(context.credentials)?;
        let body = self.call(
            "add_service",
            self.api
                .add_service(&service_type_id, &name, &fields, &credentials.token),
        )?;
        let service_id = require_text(&body, &["result", "service_id"])?;

        credentials.services.insert(
            name,
            ServiceRecord {
                service_type,
                service_id,
                package_category_id: category_id,
                credentials: fields,
            },
        );
        self.save(&credentials)
    }

    pub fn remove(&self, context: ServiceContext) -> CliResult<()> {
        if !self.prompter.confirm("Are you sure?", false)? {
            return Ok(());
        }

        let name = context.require_name()?;
        let mut credentials = self.session().ensure_valid(context.credentials)?;
        let service_id = service_record(&credentials, &name)?.service_id.clone();
        self.call(
            "delete_service",
            self.api.delete_service(&service_id, &credentials.token),
        )?;

        credentials.services.shift_remove(&name);
        self.save(&credentials)
    }

    pub fn rename(&self, context: ServiceContext, new_name: Option<String>) -> CliResult<()> {
        let name = context.require_name()?;
        let mut credentials = self.session().ensure_valid(context.credentials)?;
        let service_id = service_record(&credentials, &name)?.service_id.clone();

        let new_name = match new_name {
            Some(new_name) => new_name,
            None => self
                .prompter
                .input("What do you want to rename this service to")?,
        };
        let new_name = new_name.trim().to_string();
        if new_name.is_empty() {
            return Err(CliError::validation("The service name can't be empty"));
        }
        if credentials.services.contains_key(&new_name) {
            return Err(CliError::validation(DUPLICATE_NAME));
        }

        self.call(
            "update_friendly_name",
            self.api
                .update_friendly_name(&new_name, &service_id, &credentials.token),
        )?;
        credentials.rename_service(&name, &new_name);
        self.save(&credentials)
    }

    pub fn top_up(&self, context: ServiceContext, voucher: Option<String>) -> CliResult<()> {
        let name = context.require_name()?;
        let credentials = self.session().ensure_valid(context.credentials)?;
        let record = service_record(&credentials, &name)?;

        let voucher = match voucher {
            Some(raw) => {
                let digits = normalize_digits(raw.trim());
                if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
                    return Err(CliError::validation(format!(
                        "'{}' is not a valid voucher number",
                        raw
                    )));
                }
                digits
            }
            None => integer_prompt(self.prompter.as_ref(), "Voucher number")?,
        };

        self.call(
            "recharge_voucher",
            self.api.recharge_voucher(
                &voucher,
                &record.credentials,
                &record.service_id,
                &credentials.token,
            ),
        )?;
        Ok(())
    }

    pub fn auto_recharge(&self, context: ServiceContext) -> CliResult<()> {
        let name = context.require_name()?;
        let credentials = self.session().ensure_valid(context.credentials)?;
        let service_id = service_record(&credentials, &name)?.service_id.clone();

        let body = self.call(
            "get_auto_recharge_status",
            self.api
                .get_auto_recharge_status(&service_id, &credentials.token),
        )?;
        let enabled = get_path_value(&body, &["result", "auto_recharge_status"])
            .map(is_truthy)
            .unwrap_or(false);
        let (current, next) = if enabled { ("on", "off") } else { ("off", "on") };
        println!("Auto-Recharge: {}", current);

        if !self
            .prompter
            .confirm(&format!("Do you want to turn it {}", next), false)?
        {
            return Ok(());
        }

        let credentials = self.session().ensure_valid(credentials)?;
        self.call(
            "toggle_auto_recharge_status",
            self.api
                .toggle_auto_recharge_status(&service_id, &credentials.token),
        )?;
        Ok(())
    }

    pub fn subscribe(&self, context: ServiceContext) -> CliResult<()> {
        let name = context.require_name()?;
        let category_id = service_record(&context.credentials, &name)?
            .package_category_id
            .clone();

        let body = self.call("get_packages", self.api.get_packages(&category_id))?;
        let catalog = PackageCatalog::from_value(body.get("result").unwrap_or(&Value::Null));
        let rendered = render_package_catalog(&catalog);
        if rendered.package_ids.is_empty() {
            return Err(CliError::remote(
                "There are no packages available for this service",
            ));
        }
        print_lines(&rendered.lines);

        let choice = choice_prompt(
            self.prompter.as_ref(),
            "Package",
            1,
            rendered.package_ids.len(),
        )?;
        let package_id = &rendered.package_ids[choice - 1];
        if !self.prompter.confirm("Are you sure?", true)? {
            return Ok(());
        }

        let credentials = self.session().ensure_valid(context.credentials)?;
        let record = service_record(&credentials, &name)?;
        self.call(
            "subscribe_to_package",
            self.api.subscribe_to_package(
                package_id,
                &record.credentials,
                &record.service_id,
                &credentials.token,
            ),
        )?;
        Ok(())
    }
}

pub fn list_all_lines(credentials: &Credentials) -> CliResult<Vec<String>> {
    if credentials.services.is_empty() {
        return Err(CliError::validation(
            "You don't have any services yet, try to add some",
        ));
    }

    let mut lines = vec!["Services list:".to_string()];
    for (name, record) in &credentials.services {
        lines.push(format!("\t[*] {} ({})", name, record.service_type));
    }
    Ok(lines)
}

fn service_record<'c>(credentials: &'c Credentials, name: &str) -> CliResult<&'c ServiceRecord> {
    credentials.services.get(name).ok_or_else(|| {
        CliError::validation(format!(
            "You don't have a service with the name \"{}\"",
            name
        ))
    })
}

/// `result.required_fields`, ordered by field id.
fn required_fields(body: &Value) -> Vec<RequiredField> {
    let mut fields: Vec<RequiredField> = get_path_value(body, &["result", "required_fields"])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let name = value_text(item.get("name"))?;
                    let order = value_text(item.get("id"))
                        .and_then(|id| id.parse::<i64>().ok())
                        .unwrap_or(i64::MAX);
                    Some(RequiredField {
                        order,
                        label: value_text(item.get("label")).unwrap_or_else(|| name.clone()),
                        suffix: value_text(item.get("suffix")),
                        name,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    fields.sort_by_key(|field| field.order);
    fields
}

fn print_lines(lines: &[String]) -> CliResult<()> {
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
