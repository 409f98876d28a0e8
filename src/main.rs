// Entrypoint for the CLI application.
// - Keeps `main` small: load configuration, build the API client and the
//   object store, then hand control to the command loop.
// - Startup validation failures print an error and exit 0 without entering
//   the loop.

use std::path::Path;

use anyhow::Context;
use dialoguer::Input;

use recipeapp_cli::{api::ApiClient, config, storage::S3Store, ui};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("** Welcome to RecipeApp **");
    println!();

    println!("Config file to use for this session?");
    println!("Press ENTER to use default, or");
    let entered: String = Input::new()
        .with_prompt("enter config file name")
        .allow_empty(true)
        .interact_text()?;
    let config_file = if entered.is_empty() {
        config::DEFAULT_CONFIG_FILE.to_string()
    } else {
        entered
    };

    let path = Path::new(&config_file);
    if !path.is_file() {
        println!("**ERROR: config file '{config_file}' does not exist, exiting");
        return Ok(());
    }

    let cfg = match config::load(path) {
        Ok(cfg) => cfg,
        Err(err) => {
            println!("**ERROR: {err:#}");
            return Ok(());
        }
    };

    let base_url = match cfg.base_url() {
        Ok(url) => url,
        Err(err) => {
            println!("**ERROR: {err}");
            return Ok(());
        }
    };

    let api = ApiClient::new(base_url).context("failed to build HTTP client")?;
    let store = S3Store::new(cfg.storage.bucket, cfg.storage.region);

    ui::run(&api, &store)?;

    println!();
    println!("** done **");
    Ok(())
}
