use std::fs;
use std::io::Read;

use molbridge::service::{Endpoint, dispatch};
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::CallArgs;
use crate::error::{CliError, Result};

pub fn run(args: CallArgs) -> Result<()> {
    let endpoint = Endpoint::from_name(&args.endpoint)
        .ok_or_else(|| CliError::Endpoint(args.endpoint.clone()))?;

    let request = load_request(&args)?;
    debug!("Dispatching {} request", endpoint.name());

    let response = dispatch(endpoint, request);
    let status = response["status"].as_str().unwrap_or("failed");
    info!("Endpoint {} answered status {}", endpoint.name(), status);

    let rendered = if args.compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };

    match &args.output {
        Some(path) => fs::write(path, rendered + "\n")?,
        None => println!("{rendered}"),
    }

    if status == "failed" {
        return Err(CliError::Failed);
    }
    Ok(())
}

fn load_request(args: &CallArgs) -> Result<Value> {
    match &args.request {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text).map_err(|source| CliError::RequestParsing {
                path: path.clone(),
                source,
            })
        }
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(serde_json::from_str(&text)?)
        }
    }
}
