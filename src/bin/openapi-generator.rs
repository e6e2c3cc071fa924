use std::process::ExitCode;

use codequest::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> ExitCode {
    let doc = ApiDoc::openapi();
    match doc.to_pretty_json() {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to render OpenAPI document: {err}");
            ExitCode::FAILURE
        }
    }
}
