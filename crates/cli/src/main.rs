use std::path::PathBuf;

use larder_cli::Scenario;

const SCENARIO_ENV: &str = "LARDER_SCENARIO";

fn main() -> anyhow::Result<()> {
    larder_observability::init();

    let path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(SCENARIO_ENV))
        .map(PathBuf::from);

    let scenario = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading scenario");
            Scenario::from_path(&path)?
        }
        None => {
            tracing::warn!("no scenario given (argv or {SCENARIO_ENV}); replaying the bundled burger demo");
            Scenario::bundled()?
        }
    };

    let report = scenario.run()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
