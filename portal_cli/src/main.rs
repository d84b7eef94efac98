use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use portal_core::{
    delete_request, finalize_target, first_blocking, parse_delete_response, parse_upload_response,
    project, subtype_options, FieldKind, FieldState, FileList, LoanType, PortalConfig,
    SelectedFile, SubmitState,
};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::Url;
use serde_json::json;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Loan portal client CLI", long_about = None)]
struct Cli {
    /// JSON file overriding endpoints and UI strings
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show which loan form fields are visible for a type/subtype pair
    LoanForm(LoanFormArgs),
    /// Decide whether a form with the given required fields may be submitted
    CheckFields(CheckFieldsArgs),
    /// Upload files the way the upload page does
    Upload(UploadArgs),
    /// Delete an uploaded file
    Delete(DeleteArgs),
    /// Print the URL that turns uploaded files into database records
    FinalizeUrl(FinalizeArgs),
}

#[derive(Parser, Debug)]
struct LoanFormArgs {
    /// Loan type (immediate|building|Sofortkredit|Baudarlehen)
    #[arg(long)]
    loan_type: String,

    /// Loan subtype; defaults to the first option the form would offer
    #[arg(long)]
    subtype: Option<String>,

    /// Emit JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Parser, Debug)]
struct CheckFieldsArgs {
    /// Required fields as `text:VALUE`, `select:VALUE` or `other:VALUE`;
    /// append `:hidden` for fields without a layout box
    #[arg(required = true)]
    fields: Vec<String>,
}

#[derive(Parser, Debug)]
struct ServerArgs {
    /// Base URL of the portal server
    #[arg(long, env = "PORTAL_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Value of the `session_id` login cookie
    #[arg(long, env = "PORTAL_SESSION_ID")]
    session_id: Option<String>,
}

#[derive(Parser, Debug)]
struct UploadArgs {
    #[command(flatten)]
    server: ServerArgs,

    /// Form action path (defaults to the configured upload endpoint)
    #[arg(long)]
    action: Option<String>,

    /// Extra form fields as `name=value`, e.g. `application_id=3`
    #[arg(long = "field")]
    fields: Vec<String>,

    /// Files to upload
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    files: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct DeleteArgs {
    #[command(flatten)]
    server: ServerArgs,

    /// Server id of the file
    file_id: u64,

    /// Person identifier sent along with the deletion
    #[arg(long)]
    person: Option<String>,
}

#[derive(Parser, Debug)]
struct FinalizeArgs {
    /// Base URL of the portal server
    #[arg(long, env = "PORTAL_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Person identifier
    #[arg(long)]
    person: Option<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = match cli.config.as_ref() {
        Some(path) => PortalConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PortalConfig::default(),
    };

    match cli.command {
        Command::LoanForm(args) => handle_loan_form(args),
        Command::CheckFields(args) => handle_check_fields(args),
        Command::Upload(args) => handle_upload(args, &config),
        Command::Delete(args) => handle_delete(args, &config),
        Command::FinalizeUrl(args) => handle_finalize_url(args, &config),
    }
}

fn handle_loan_form(args: LoanFormArgs) -> Result<ExitCode> {
    let loan_type = LoanType::parse(&args.loan_type);
    if loan_type.is_none() {
        warn!(loan_type = %args.loan_type, "unknown loan type, no subtypes apply");
    }
    let options = subtype_options(loan_type);
    let subtype = args
        .subtype
        .clone()
        .or_else(|| options.first().map(|o| o.value.clone()))
        .unwrap_or_default();
    let projection = project(&args.loan_type, &subtype);

    if args.json {
        let out = json!({
            "subtype_options": options,
            "projection": projection,
            "term_disabled": projection.term_disabled(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(ExitCode::SUCCESS);
    }

    let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
    println!("loan type:     {}", loan_type.map(LoanType::as_str).unwrap_or("-"));
    println!("subtypes:      {}", if values.is_empty() { "-".to_string() } else { values.join(", ") });
    println!("subtype:       {}", if subtype.is_empty() { "-" } else { subtype.as_str() });
    println!("repay amount:  {}", shown(projection.visibility.show_repay));
    println!("term:          {}", shown(projection.visibility.show_term));
    println!("term input:    {}", if projection.term_disabled() { "disabled" } else { "enabled" });
    println!(
        "collateral:    {}",
        if projection.collateral.required { "shown, required" } else { "hidden, disabled" }
    );
    Ok(ExitCode::SUCCESS)
}

fn shown(flag: bool) -> &'static str {
    if flag {
        "shown"
    } else {
        "hidden"
    }
}

fn parse_field(raw: &str) -> Result<FieldState> {
    let (body, visible) = match raw.strip_suffix(":hidden") {
        Some(body) => (body, false),
        None => (raw, true),
    };
    let (kind, value) = body
        .split_once(':')
        .ok_or_else(|| anyhow!("field `{raw}` is not KIND:VALUE"))?;
    let kind = match kind {
        "text" => FieldKind::Text,
        "select" => FieldKind::Select,
        "other" => FieldKind::Other,
        other => return Err(anyhow!("unknown field kind `{other}`")),
    };
    Ok(FieldState::new(kind, value, visible))
}

fn handle_check_fields(args: CheckFieldsArgs) -> Result<ExitCode> {
    let fields = args
        .fields
        .iter()
        .map(|raw| parse_field(raw))
        .collect::<Result<Vec<_>>>()?;
    match SubmitState::from_fields(&fields) {
        SubmitState::Ready => {
            println!("ready");
            Ok(ExitCode::SUCCESS)
        }
        SubmitState::NotReady => {
            let idx = first_blocking(&fields).unwrap_or_default();
            println!("not ready: field {} ({}) is empty", idx + 1, args.fields[idx]);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn server_url(base: &str, path: &str) -> Result<Url> {
    let base = Url::parse(base).with_context(|| format!("invalid base URL {base}"))?;
    base.join(path)
        .with_context(|| format!("cannot resolve {path} against {base}"))
}

fn client(server: &ServerArgs) -> Result<(Client, Option<String>)> {
    let client = Client::builder().build().context("building HTTP client")?;
    let cookie = server.session_id.as_ref().map(|id| format!("session_id={id}"));
    Ok((client, cookie))
}

fn read_response(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    debug!(status, body = %body, "response received");
    (status, body)
}

fn handle_upload(args: UploadArgs, config: &PortalConfig) -> Result<ExitCode> {
    for path in &args.files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = SelectedFile::new(name);
        debug!(file = %file.name, icon = ?file.icon, "selected");
    }

    let mut form = multipart::Form::new();
    for raw in &args.fields {
        let (name, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("--field `{raw}` is not name=value"))?;
        form = form.text(name.to_string(), value.to_string());
    }
    for path in &args.files {
        form = form
            .file("files", path)
            .with_context(|| format!("reading {}", path.display()))?;
    }

    let action = args.action.as_deref().unwrap_or(&config.endpoints.upload);
    let url = server_url(&args.server.base_url, action)?;
    let (client, cookie) = client(&args.server)?;
    let mut request = client.post(url.clone()).multipart(form);
    if let Some(cookie) = cookie {
        request = request.header(reqwest::header::COOKIE, cookie);
    }
    info!(%url, files = args.files.len(), "uploading");

    let response = request
        .send()
        .map_err(|e| portal_core::PortalError::Transport(e.to_string()))?;
    let (status, body) = read_response(response);
    let records = parse_upload_response(status, &body)?;

    let mut list = FileList::new();
    let added = list.extend_from_records(&records, &config.endpoints);
    info!(listed = list.len(), "upload accepted");
    for row in added {
        println!(
            "{}\t{}\t{}",
            row.element_id().unwrap_or_else(|| "-".to_string()),
            row.file_name,
            row.href.as_deref().unwrap_or("-")
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_delete(args: DeleteArgs, config: &PortalConfig) -> Result<ExitCode> {
    let target = delete_request(
        &config.endpoints,
        args.file_id,
        args.person.as_deref(),
        config.delete_with_person_identifier,
    );
    let mut url = server_url(&args.server.base_url, &target.path)?;
    for (key, value) in target.query() {
        url.query_pairs_mut().append_pair(key, value);
    }

    let (client, cookie) = client(&args.server)?;
    let mut request = client.delete(url.clone());
    if let Some(cookie) = cookie {
        request = request.header(reqwest::header::COOKIE, cookie);
    }
    info!(%url, "deleting");

    let response = request
        .send()
        .map_err(|e| portal_core::PortalError::Transport(e.to_string()))?;
    let (status, body) = read_response(response);
    parse_delete_response(status, &body)?;
    println!("deleted file {}", args.file_id);
    Ok(ExitCode::SUCCESS)
}

fn handle_finalize_url(args: FinalizeArgs, config: &PortalConfig) -> Result<ExitCode> {
    let target = finalize_target(&config.endpoints, args.person.as_deref())?;
    let mut url = server_url(&args.base_url, &target.path)?;
    for (key, value) in target.query() {
        url.query_pairs_mut().append_pair(key, value);
    }
    println!("{url}");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_specs_parse() {
        let f = parse_field("text:Anna").unwrap();
        assert_eq!(f, FieldState::new(FieldKind::Text, "Anna", true));
        let f = parse_field("select::hidden").unwrap();
        assert_eq!(f, FieldState::new(FieldKind::Select, "", false));
        let f = parse_field("text:12:30").unwrap();
        assert_eq!(f.value, "12:30");
        assert!(parse_field("checkbox:x").is_err());
        assert!(parse_field("novalue").is_err());
    }

    #[test]
    fn server_paths_resolve_against_base() {
        let url = server_url("http://localhost:8000", "/file/3").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/file/3");
    }
}
