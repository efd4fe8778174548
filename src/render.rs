//! Provider payloads to human-readable lines.
//!
//! Payload shapes differ per service group (`internet` / `phone`) and per
//! package cadence (`monthly`, `weekly`, `daily` or `payg`). Every field is
//! optional: a missing or oddly typed field drops its line instead of failing.

use crate::api::{is_truthy, value_text};
use crate::format::{
    append_unit, convert_bytes_to_gib, convert_cents_to_lyd, float_text, format_datetime,
    remove_seconds_from_time, round2,
};
use crate::store::to_tab_json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const PHONE_DUMP_FILE: &str = "phone_details.json";
const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const BANNER_WIDTH: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupType {
    Internet,
    Phone,
    Other,
}

impl GroupType {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("internet") => Self::Internet,
            Some("phone") => Self::Phone,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Recurring,
    PayAsYouGo,
    Other,
}

impl Cadence {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("monthly" | "weekly" | "daily") => Self::Recurring,
            Some("payg") => Self::PayAsYouGo,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServiceStatus {
    #[serde(deserialize_with = "scalar")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub package: Option<PackageStatus>,
    #[serde(deserialize_with = "lenient")]
    pub balances: Option<Balances>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PackageStatus {
    #[serde(deserialize_with = "scalar")]
    pub name: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub status: Option<String>,
    #[serde(rename = "type", deserialize_with = "scalar")]
    pub cadence: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub quota: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub offpeak: Option<OffPeakTerms>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OffPeakTerms {
    #[serde(deserialize_with = "flag")]
    pub enabled: bool,
    #[serde(deserialize_with = "scalar")]
    pub quota_gb: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub end_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Balances {
    #[serde(deserialize_with = "lenient")]
    pub quota: Option<BalanceEntry>,
    #[serde(deserialize_with = "lenient")]
    pub offpeak: Option<BalanceEntry>,
    #[serde(deserialize_with = "lenient")]
    pub credit: Option<BalanceEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BalanceEntry {
    #[serde(deserialize_with = "scalar")]
    pub amount: Option<String>,
    #[serde(rename = "validDate", deserialize_with = "scalar")]
    pub valid_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PackageCatalog {
    #[serde(rename = "type", deserialize_with = "scalar")]
    pub group_type: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub groups: Vec<PackageGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PackageGroup {
    #[serde(rename = "type", deserialize_with = "scalar")]
    pub cadence: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub packages: Vec<CatalogPackage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogPackage {
    #[serde(deserialize_with = "scalar")]
    pub id: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub speed: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub quota: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub price: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub price_peak: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub price_off_peak: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub off_peak_start_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub off_peak_end_time: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub minutes_quota: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub sms_quota: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub mms_quota: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub gprs_quota: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub calls_price: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub sms_price: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub mms_price: Option<String>,
}

impl ServiceStatus {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

impl PackageCatalog {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !is_truthy(&value) {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(Some(&value)))
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::String(text) => !matches!(text.trim(), "" | "0" | "false"),
        other => is_truthy(other),
    })
}

#[derive(Debug, Default)]
pub struct RenderedStatus {
    pub lines: Vec<String>,
    pub dump_path: Option<PathBuf>,
}

/// Lays out one service's status block. `group_type` comes from the
/// service's package catalog; phone packages are dumped to `dump_dir`.
pub fn render_service_status(
    service_name: &str,
    group_type: Option<&str>,
    payload: &Value,
    dump_dir: &Path,
) -> RenderedStatus {
    let status = ServiceStatus::from_value(payload);
    let mut rendered = RenderedStatus::default();
    let lines = &mut rendered.lines;

    let title = match status.status.as_deref() {
        Some(state) => format!("  {} ({})  ", service_name, state),
        None => format!("  {}  ", service_name),
    };
    let header = format!(
        "{}{}{}",
        "=".repeat(BANNER_WIDTH),
        title,
        "=".repeat(BANNER_WIDTH)
    );
    let footer = "=".repeat(header.chars().count());

    lines.push(String::new());
    lines.push(header);
    lines.push(String::new());

    let balances = status.balances.unwrap_or_default();
    if let Some(package) = status.package.as_ref() {
        lines.push(package_title_line(package));

        let cadence = Cadence::parse(package.cadence.as_deref());
        match (GroupType::parse(group_type), cadence) {
            (GroupType::Internet, Cadence::Recurring) => {
                push_internet_quota(lines, package, &balances);
                lines.push(String::new());
            }
            (GroupType::Phone, Cadence::Recurring) => {
                rendered.dump_path = push_phone_dump(lines, payload, dump_dir);
                lines.push(String::new());
            }
            _ => {}
        }
    }

    if let Some(credit) = balances.credit.as_ref() {
        if let Some(amount) = credit.amount.as_deref() {
            lines.push(format!("Balance: {}", convert_cents_to_lyd(amount)));
            if let Some(valid_date) = credit.valid_date.as_deref() {
                lines.push(format!("\tExpiration Date: {}", format_datetime(valid_date)));
            }
        }
    }

    lines.push(String::new());
    lines.push(footer);
    lines.push(String::new());
    rendered
}

fn package_title_line(package: &PackageStatus) -> String {
    let name = package.name.as_deref().unwrap_or("Unknown");
    match package.status.as_deref() {
        Some(state) => format!("Package: {} ({})", name, state),
        None => format!("Package: {}", name),
    }
}

fn push_internet_quota(lines: &mut Vec<String>, package: &PackageStatus, balances: &Balances) {
    let quota = balances.quota.as_ref();
    if let Some(quota) = quota {
        if let Some(amount) = quota
            .amount
            .as_deref()
            .filter(|amount| amount.chars().all(|ch| ch.is_ascii_digit()))
        {
            lines.push(quota_line("Quota", amount, package.quota.as_deref()));
        }
        if let Some(valid_date) = quota.valid_date.as_deref() {
            lines.push(format!("\tExpiration Date: {}", format_datetime(valid_date)));
        }
    }

    let Some(terms) = package.offpeak.as_ref().filter(|terms| terms.enabled) else {
        return;
    };
    let Some(offpeak) = balances.offpeak.as_ref() else {
        return;
    };

    lines.push(String::new());
    if let Some(amount) = offpeak.amount.as_deref() {
        lines.push(quota_line("Off-Peak Quota", amount, terms.quota_gb.as_deref()));
    }
    if let (Some(start), Some(end)) = (terms.start_time.as_deref(), terms.end_time.as_deref()) {
        lines.push(format!(
            "\tOff-Peak Time: from {} to {}",
            remove_seconds_from_time(start),
            remove_seconds_from_time(end)
        ));
    }
    if let Some(valid_date) = offpeak.valid_date.as_deref() {
        let main_date = quota.and_then(|quota| quota.valid_date.as_deref());
        if main_date != Some(valid_date) {
            lines.push(format!("\tExpiration Date: {}", format_datetime(valid_date)));
        }
    }
}

/// `\t<label>: <remaining> GiB out of <total> GiB (<n>% remaining)`; the total
/// and percentage are dropped when the package does not report a total.
fn quota_line(label: &str, amount_bytes: &str, total_gib: Option<&str>) -> String {
    let remaining = append_unit(&convert_bytes_to_gib(amount_bytes), "GiB");
    let Some(total) = total_gib else {
        return format!("\t{}: {}", label, remaining);
    };

    let mut line = format!("\t{}: {} out of {}", label, remaining, append_unit(total, "GiB"));
    let bytes = amount_bytes.trim().parse::<f64>().ok();
    let total = total.trim().parse::<f64>().ok().filter(|total| *total > 0.0);
    if let (Some(bytes), Some(total)) = (bytes, total) {
        let percent = round2(bytes / BYTES_PER_GIB / total * 100.0);
        line.push_str(&format!(" ({}% remaining)", float_text(percent)));
    }
    line
}

fn push_phone_dump(lines: &mut Vec<String>, payload: &Value, dump_dir: &Path) -> Option<PathBuf> {
    lines.push("\tNo package due to the lack of support for phone services".to_string());

    let dump_path = dump_dir.join(PHONE_DUMP_FILE);
    let content = json!({
        "package": payload.get("package").cloned().unwrap_or(Value::Null),
        "balances": payload
            .get("balances")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())),
    });
    let written = to_tab_json(&content)
        .map_err(std::io::Error::from)
        .and_then(|data| fs::write(&dump_path, data));

    match written {
        Ok(()) => {
            lines.push(format!(
                "\tJSON data was dumped to \"{}\" instead",
                dump_path.display()
            ));
            lines.push("\tif you want to help improve phone services support".to_string());
            lines.push("\tyou can attach the file to an issue on the project tracker".to_string());
            Some(dump_path)
        }
        Err(_) => {
            lines.push(format!(
                "\ttried to dump JSON data instead, but couldn't access \"{}\"",
                dump_path.display()
            ));
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderedCatalog {
    pub lines: Vec<String>,
    /// Package ids in printed order: entry `n - 1` is choice `[n]`.
    pub package_ids: Vec<String>,
}

pub fn render_package_catalog(catalog: &PackageCatalog) -> RenderedCatalog {
    let mut rendered = RenderedCatalog::default();
    let group_type = GroupType::parse(catalog.group_type.as_deref());

    for group in &catalog.groups {
        let cadence = Cadence::parse(group.cadence.as_deref());
        for package in &group.packages {
            let Some(id) = package.id.clone() else {
                continue;
            };
            rendered.package_ids.push(id.clone());
            let title = package
                .title
                .clone()
                .unwrap_or_else(|| format!("Package {}", id));
            rendered
                .lines
                .push(format!("[{}] {}", rendered.package_ids.len(), title));

            match group_type {
                GroupType::Internet => push_internet_package(&mut rendered.lines, package, cadence),
                GroupType::Phone => push_phone_package(&mut rendered.lines, package, cadence),
                GroupType::Other => {}
            }
            rendered.lines.push(String::new());
        }
    }
    rendered
}

fn push_field(lines: &mut Vec<String>, label: &str, value: Option<&str>, unit: Option<&str>) {
    let Some(value) = value else { return };
    let text = match unit {
        Some(unit) => append_unit(value, unit),
        None => value.to_string(),
    };
    lines.push(format!("\t{}: {}", label, text));
}

fn push_internet_package(lines: &mut Vec<String>, package: &CatalogPackage, cadence: Cadence) {
    push_field(lines, "Speed", package.speed.as_deref(), Some("Mb/s"));

    match cadence {
        Cadence::Recurring => {
            push_field(lines, "Quota", package.quota.as_deref(), Some("GiB"));
            push_field(lines, "Price", package.price.as_deref(), Some("LYD"));
        }
        Cadence::PayAsYouGo => {
            let Some(peak) = package.price_peak.as_deref() else {
                push_field(lines, "Price", package.price.as_deref(), Some("LYD/GiB"));
                return;
            };
            push_field(lines, "Price", Some(peak), Some("LYD/GiB"));

            let Some(off_peak) = package.price_off_peak.as_deref().filter(|off| *off != peak)
            else {
                return;
            };
            let label = match (
                package.off_peak_start_time.as_deref(),
                package.off_peak_end_time.as_deref(),
            ) {
                (Some(start), Some(end)) => format!(
                    "Price Off-Peak ({} - {})",
                    remove_seconds_from_time(start),
                    remove_seconds_from_time(end)
                ),
                _ => "Price Off-Peak".to_string(),
            };
            push_field(lines, &label, Some(off_peak), Some("LYD/GiB"));
        }
        Cadence::Other => {}
    }
}

fn push_phone_package(lines: &mut Vec<String>, package: &CatalogPackage, cadence: Cadence) {
    match cadence {
        Cadence::Recurring => {
            push_field(lines, "Calls", package.minutes_quota.as_deref(), Some("Minutes"));
            push_field(lines, "SMS's", package.sms_quota.as_deref(), None);
            push_field(lines, "MMS's", package.mms_quota.as_deref(), None);
            push_field(lines, "Internet", package.gprs_quota.as_deref(), Some("MiB"));
            push_field(lines, "Price", package.price.as_deref(), Some("LYD"));
        }
        Cadence::PayAsYouGo => {
            push_field(lines, "Calls Price", package.calls_price.as_deref(), Some("LYD/MIN"));
            push_field(lines, "SMS Price", package.sms_price.as_deref(), Some("LYD/MSG"));
            let mms_price = package.mms_price.as_deref().or(package.sms_price.as_deref());
            push_field(lines, "MMS Price", mms_price, Some("LYD/MSG"));
        }
        Cadence::Other => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn monthly_internet_payload() -> Value {
        json!({
            "status": "Active",
            "package": {
                "name": "Super 50",
                "status": "Active",
                "type": "monthly",
                "quota": "50",
                "offpeak": { "enabled": false }
            },
            "balances": {
                "quota": { "amount": "13421772800", "validDate": "2024-02-01 23:59:59" },
                "credit": { "amount": "1500", "validDate": "2025-01-01 00:00:00" }
            }
        })
    }

    #[test]
    fn monthly_internet_status_without_offpeak() {
        let temp = TempDir::new().expect("temp dir");
        let rendered = render_service_status(
            "home",
            Some("internet"),
            &monthly_internet_payload(),
            temp.path(),
        );

        let header = format!("{}  home (Active)  {}", "=".repeat(25), "=".repeat(25));
        let expected = vec![
            String::new(),
            header.clone(),
            String::new(),
            "Package: Super 50 (Active)".to_string(),
            "\tQuota: 12.5 GiB out of 50 GiB (25.0% remaining)".to_string(),
            "\tExpiration Date: 2024/02/01 at 23:59".to_string(),
            String::new(),
            "Balance: 1.5 LYD".to_string(),
            "\tExpiration Date: 2025/01/01 at 00:00".to_string(),
            String::new(),
            "=".repeat(header.len()),
            String::new(),
        ];
        assert_eq!(rendered.lines, expected);
        assert!(rendered.dump_path.is_none());
        assert!(!rendered.lines.iter().any(|line| line.contains("Off-Peak")));
    }

    #[test]
    fn offpeak_block_requires_terms_and_balance_and_skips_duplicate_date() {
        let temp = TempDir::new().expect("temp dir");
        let payload = json!({
            "status": "Active",
            "package": {
                "name": "Night Owl",
                "status": "Active",
                "type": "weekly",
                "quota": 10,
                "offpeak": {
                    "enabled": 1,
                    "quota_gb": 20,
                    "start_time": "01:00:00",
                    "end_time": "07:00:00"
                }
            },
            "balances": {
                "quota": { "amount": "1073741824", "validDate": "2024-02-01 23:59:59" },
                "offpeak": { "amount": "2147483648", "validDate": "2024-02-01 23:59:59" }
            }
        });

        let rendered = render_service_status("night", Some("internet"), &payload, temp.path());
        let lines = rendered.lines;

        assert!(lines.contains(&"\tQuota: 1.0 GiB out of 10 GiB (10.0% remaining)".to_string()));
        assert!(lines.contains(
            &"\tOff-Peak Quota: 2.0 GiB out of 20 GiB (10.0% remaining)".to_string()
        ));
        assert!(lines.contains(&"\tOff-Peak Time: from 01:00 to 07:00".to_string()));
        let expirations = lines
            .iter()
            .filter(|line| line.starts_with("\tExpiration Date"))
            .count();
        assert_eq!(expirations, 1);
    }

    #[test]
    fn offpeak_expiration_is_shown_when_it_differs() {
        let temp = TempDir::new().expect("temp dir");
        let mut payload = monthly_internet_payload();
        payload["package"]["offpeak"] = json!({
            "enabled": true, "quota_gb": "Unlimited", "start_time": "02:00:00", "end_time": "08:00:00"
        });
        payload["balances"]["offpeak"] =
            json!({ "amount": "unlimited", "validDate": "2024-01-15 12:00:00" });

        let lines = render_service_status("home", Some("internet"), &payload, temp.path()).lines;

        assert!(lines.contains(&"\tOff-Peak Quota: unlimited out of Unlimited".to_string()));
        assert!(lines.contains(&"\tExpiration Date: 2024/01/15 at 12:00".to_string()));
    }

    #[test]
    fn offpeak_is_hidden_when_balance_is_empty() {
        let temp = TempDir::new().expect("temp dir");
        let mut payload = monthly_internet_payload();
        payload["package"]["offpeak"] = json!({ "enabled": true, "quota_gb": 5 });
        payload["balances"]["offpeak"] = json!([]);

        let lines = render_service_status("home", Some("internet"), &payload, temp.path()).lines;
        assert!(!lines.iter().any(|line| line.contains("Off-Peak")));
    }

    #[test]
    fn missing_fields_drop_lines_instead_of_failing() {
        let temp = TempDir::new().expect("temp dir");
        let payload = json!({
            "package": { "name": "Mystery", "type": "monthly" },
            "balances": { "quota": { "amount": "Unlimited" }, "credit": {} }
        });

        let lines = render_service_status("x", Some("internet"), &payload, temp.path()).lines;
        assert_eq!(lines[1], format!("{}  x  {}", "=".repeat(25), "=".repeat(25)));
        assert_eq!(lines[3], "Package: Mystery");
        assert!(!lines.iter().any(|line| line.contains("Quota")));
        assert!(!lines.iter().any(|line| line.starts_with("Balance")));
    }

    #[test]
    fn null_package_renders_only_banner_and_balance() {
        let temp = TempDir::new().expect("temp dir");
        let payload = json!({
            "status": "Suspended",
            "package": null,
            "balances": { "credit": { "amount": 250, "validDate": "bad-date" } }
        });

        let lines = render_service_status("old", Some("internet"), &payload, temp.path()).lines;
        assert!(!lines.iter().any(|line| line.starts_with("Package")));
        assert!(lines.contains(&"Balance: 0.25 LYD".to_string()));
        assert!(lines.contains(&"\tExpiration Date: bad-date".to_string()));
    }

    #[test]
    fn phone_status_is_dumped_for_diagnostics() {
        let temp = TempDir::new().expect("temp dir");
        let payload = json!({
            "status": "Active",
            "package": { "name": "Talk", "status": "Active", "type": "monthly", "minutes": 100 },
            "balances": { "voice": { "amount": "60" } }
        });

        let rendered = render_service_status("mobile", Some("phone"), &payload, temp.path());

        let dump_path = temp.path().join(PHONE_DUMP_FILE);
        assert_eq!(rendered.dump_path.as_deref(), Some(dump_path.as_path()));
        assert!(rendered
            .lines
            .contains(&"\tNo package due to the lack of support for phone services".to_string()));
        let dumped: Value =
            serde_json::from_str(&fs::read_to_string(&dump_path).expect("dump")).expect("json");
        assert_eq!(dumped["package"]["minutes"], 100);
        assert_eq!(dumped["balances"]["voice"]["amount"], "60");
    }

    #[test]
    fn phone_dump_failure_degrades_to_notice() {
        let temp = TempDir::new().expect("temp dir");
        let missing_dir = temp.path().join("does/not/exist");
        let payload = json!({
            "package": { "name": "Talk", "type": "daily" }
        });

        let rendered = render_service_status("mobile", Some("phone"), &payload, &missing_dir);

        assert!(rendered.dump_path.is_none());
        assert!(rendered
            .lines
            .iter()
            .any(|line| line.starts_with("\ttried to dump JSON data instead")));
    }

    #[test]
    fn catalog_numbering_is_contiguous_across_groups() {
        let catalog = PackageCatalog::from_value(&json!({
            "type": "internet",
            "groups": [
                {
                    "type": "monthly",
                    "packages": [
                        { "id": 11, "title": "Super 50", "speed": "8", "quota": "50", "price": "50" },
                        { "id": 12, "title": "Unlimited", "speed": "4", "quota": "Unlimited", "price": "100" }
                    ]
                },
                {
                    "type": "payg",
                    "packages": [
                        {
                            "id": 21, "title": "Flex", "speed": "16",
                            "price_peak": "5", "price_off_peak": "2.5",
                            "off_peak_start_time": "00:00:00", "off_peak_end_time": "06:00:00"
                        },
                        { "id": 22, "title": "Basic", "speed": "2", "price": "4" }
                    ]
                }
            ]
        }));

        let rendered = render_package_catalog(&catalog);

        assert_eq!(rendered.package_ids, vec!["11", "12", "21", "22"]);
        let expected = vec![
            "[1] Super 50",
            "\tSpeed: 8 Mb/s",
            "\tQuota: 50 GiB",
            "\tPrice: 50 LYD",
            "",
            "[2] Unlimited",
            "\tSpeed: 4 Mb/s",
            "\tQuota: Unlimited",
            "\tPrice: 100 LYD",
            "",
            "[3] Flex",
            "\tSpeed: 16 Mb/s",
            "\tPrice: 5 LYD/GiB",
            "\tPrice Off-Peak (00:00 - 06:00): 2.5 LYD/GiB",
            "",
            "[4] Basic",
            "\tSpeed: 2 Mb/s",
            "\tPrice: 4 LYD/GiB",
            "",
        ];
        assert_eq!(rendered.lines, expected);
    }

    #[test]
    fn payg_with_equal_peak_prices_shows_single_price() {
        let catalog = PackageCatalog::from_value(&json!({
            "type": "internet",
            "groups": [{ "type": "payg", "packages": [
                { "id": "p1", "title": "Even", "price_peak": "3", "price_off_peak": "3" }
            ]}]
        }));

        let rendered = render_package_catalog(&catalog);
        assert_eq!(rendered.lines, vec!["[1] Even", "\tPrice: 3 LYD/GiB", ""]);
    }

    #[test]
    fn phone_catalog_lists_quotas_and_unit_prices() {
        let catalog = PackageCatalog::from_value(&json!({
            "type": "phone",
            "groups": [
                { "type": "weekly", "packages": [{
                    "id": 5, "title": "Talk Week", "minutes_quota": "100",
                    "sms_quota": "50", "mms_quota": "10", "gprs_quota": "500", "price": "7"
                }]},
                { "type": "payg", "packages": [{
                    "id": 6, "title": "Per Use", "calls_price": "0.15", "sms_price": "0.05"
                }]}
            ]
        }));

        let rendered = render_package_catalog(&catalog);
        assert_eq!(
            rendered.lines,
            vec![
                "[1] Talk Week",
                "\tCalls: 100 Minutes",
                "\tSMS's: 50",
                "\tMMS's: 10",
                "\tInternet: 500 MiB",
                "\tPrice: 7 LYD",
                "",
                "[2] Per Use",
                "\tCalls Price: 0.15 LYD/MIN",
                "\tSMS Price: 0.05 LYD/MSG",
                "\tMMS Price: 0.05 LYD/MSG",
                "",
            ]
        );
    }

    #[test]
    fn packages_without_id_are_not_numbered() {
        let catalog = PackageCatalog::from_value(&json!({
            "type": "internet",
            "groups": [{ "type": "monthly", "packages": [
                { "title": "Broken" },
                { "id": 3, "title": "Good" }
            ]}]
        }));

        let rendered = render_package_catalog(&catalog);
        assert_eq!(rendered.package_ids, vec!["3"]);
        assert_eq!(rendered.lines[0], "[1] Good");
    }

    #[test]
    fn malformed_catalog_is_empty() {
        let catalog = PackageCatalog::from_value(&json!({ "type": "internet", "groups": "oops" }));
        assert!(render_package_catalog(&catalog).package_ids.is_empty());
        assert_eq!(
            PackageCatalog::from_value(&json!("nope")).group_type,
            None
        );
    }
}
