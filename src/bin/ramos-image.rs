use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use serde::Serialize;

use ramos_image::artifact::{esp, iso};
use ramos_image::state::{self, DecodeReport};
use ramos_image::{preflight, BuildConfig, HostTools};

fn usage() -> &'static str {
    "Usage:\n  ramos-image build-esp\n  ramos-image build-iso\n  ramos-image state seed\n  ramos-image state show <path>\n  ramos-image preflight"
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        eprintln!("ramos-image: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["build-esp"] => build_esp(),
        ["build-iso"] => build_iso(),
        ["state", "seed"] => print_seed(),
        ["state", "show", path] => show_state(Path::new(path)),
        ["preflight"] => {
            preflight::check_host_tools().context("checking host tools")?;
            info!("All host tools present");
            Ok(())
        }
        _ => bail!(usage()),
    }
}

fn build_esp() -> Result<()> {
    let config = BuildConfig::default();
    let tools = HostTools::new(config.timestamp_epoch);
    let output = esp::build_esp(&tools, &config)
        .with_context(|| format!("building '{}'", config.esp_image.display()))?;
    println!("{}", output.display());
    Ok(())
}

fn build_iso() -> Result<()> {
    let config = BuildConfig::default();
    let tools = HostTools::new(config.timestamp_epoch);
    let output = iso::build_iso(&tools, &config)
        .with_context(|| format!("building '{}'", config.iso_image.display()))?;
    println!("{}", output.display());
    Ok(())
}

fn print_seed() -> Result<()> {
    let bytes = state::encode(&state::default_state());
    print!("{}", String::from_utf8_lossy(&bytes));
    Ok(())
}

#[derive(Serialize)]
struct StateSummary<'a> {
    variables: Vec<(&'a str, &'a str)>,
    hidden_variables: usize,
    history: &'a [String],
    hint_level: u64,
    vault_present: bool,
    skipped_lines: &'a [usize],
}

impl<'a> StateSummary<'a> {
    fn new(report: &'a DecodeReport) -> Self {
        let state = &report.state;
        let variables: Vec<_> = state.visible_variables().collect();
        Self {
            hidden_variables: state.variables.len() - variables.len(),
            variables,
            history: &state.history,
            hint_level: state.hint_level,
            vault_present: state.vault_secret().is_some(),
            skipped_lines: &report.skipped_lines,
        }
    }
}

fn show_state(path: &Path) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading state file '{}'", path.display()))?;
    let report = state::decode_report(&bytes)
        .with_context(|| format!("decoding state file '{}'", path.display()))?;
    report.log_skipped();

    let summary = StateSummary::new(&report);
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("serialising state summary")?
    );
    Ok(())
}
