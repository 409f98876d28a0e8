// UI layer: the interactive command loop and one handler per command.
// Handlers prompt with `dialoguer`, call the API client, and print the
// result; every per-command failure is reported and control returns to the
// loop.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{AllergyOutcome, ApiClient, DownloadOutcome};
use crate::domain::{DownloadTicket, Recipe, User};
use crate::storage::{ObjectStore, StorageError};

/// Recipe categories accepted by the service. Validated client-side,
/// case-sensitive, before any network call is made.
const CATEGORIES: [&str; 14] = [
    "Beef",
    "Chicken",
    "Goat",
    "Lamb",
    "Pork",
    "Seafood",
    "Pasta",
    "Dessert",
    "Side",
    "Starter",
    "Vegan",
    "Vegetarian",
    "Breakfast",
    "Miscellaneous",
];

/// Run the command loop until the exit code is entered.
pub fn run(api: &ApiClient, store: &dyn ObjectStore) -> Result<()> {
    loop {
        match prompt()? {
            0 => return Ok(()),
            1 => add_user(api)?,
            2 => list_users(api),
            3 => add_allergy(api)?,
            4 => get_recipe(api)?,
            5 => list_recipes(api),
            6 => download_recipe(api, store)?,
            7 => recipe_cost(api)?,
            _ => println!("** Unknown command, try again..."),
        }
    }
}

/// Show the menu and read a command code.
fn prompt() -> Result<i64> {
    println!();
    println!(">> Enter a command:");
    println!("   0 => end");
    println!("   1 => add user");
    println!("   2 => get all users");
    println!("   3 => add new allergy");
    println!("   4 => get recipe");
    println!("   5 => get all recipes");
    println!("   6 => download recipe txt");
    println!("   7 => get recipe cost");

    let line: String = Input::new().allow_empty(true).interact_text()?;
    Ok(parse_command(&line))
}

/// Empty or non-numeric input normalizes to an invalid sentinel so the
/// loop re-prompts instead of dispatching.
fn parse_command(line: &str) -> i64 {
    line.trim().parse().unwrap_or(-1)
}

/// Status spinner shown while a remote call is in flight.
fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Command 1: create a user from prompted names.
fn add_user(api: &ApiClient) -> Result<()> {
    let first: String = Input::new()
        .with_prompt("Enter user's first name")
        .interact_text()?;
    let last: String = Input::new()
        .with_prompt("Enter user's last name")
        .interact_text()?;

    match api.add_user(&first, &last) {
        Ok(()) => println!("User has been added successfully."),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

/// Command 2: list every user with the allergies on file for them.
fn list_users(api: &ApiClient) {
    match api.all_users() {
        Ok(users) => print!("{}", render_users(&users)),
        Err(err) => println!("{err}"),
    }
}

fn render_users(users: &[User]) -> String {
    let mut out = String::new();
    for user in users {
        out.push_str(&format!("{}\n", user.user_id));
        out.push_str(&format!(" First name: {}\n", user.first_name));
        out.push_str(&format!(" Last name: {}\n", user.last_name));
        out.push_str(&format!(" Allergies: {}\n", render_allergies(&user.allergies)));
    }
    out
}

fn render_allergies(allergies: &[String]) -> String {
    if allergies.is_empty() {
        "None".to_string()
    } else {
        allergies.join(", ")
    }
}

/// Command 3: attach allergies to a user, one call per entry, until the
/// sentinel is entered. An unknown user aborts the whole loop.
fn add_allergy(api: &ApiClient) -> Result<()> {
    let user_id: String = Input::new().with_prompt("Enter user id").interact_text()?;
    let mut allergy: String = Input::new()
        .with_prompt("Enter allergy (enter 0 if finished)")
        .interact_text()?;

    while allergy != "0" {
        match api.add_allergy(&user_id, &allergy) {
            Ok(AllergyOutcome::Added) => {
                allergy = Input::new()
                    .with_prompt("Allergy has been added. Enter new allergy (enter 0 if finished)")
                    .interact_text()?;
            }
            Ok(AllergyOutcome::UnknownUser) => {
                println!("Userid does not exist.");
                return Ok(());
            }
            Err(err) => {
                println!("{err}");
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Command 4: fetch a recipe for a user from a chosen category. The
/// service filters the recipe against the user's allergies.
fn get_recipe(api: &ApiClient) -> Result<()> {
    let user_id: String = Input::new().with_prompt("Enter a user id").interact_text()?;

    println!("Below are the available recipe categories: ");
    for category in CATEGORIES {
        println!("     > {category}");
    }
    println!();
    let category: String = Input::new().with_prompt("Enter a category").interact_text()?;

    if !is_known_category(&category) {
        println!("Input does not match any of the categories. Note that first letter must be capitalized.");
        return Ok(());
    }

    let bar = spinner("Finding a recipe...");
    let result = api.find_recipe(&user_id, &category);
    bar.finish_and_clear();

    match result {
        Ok(body) => println!("{body}"),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn is_known_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

/// Command 5: list the recipe catalog.
fn list_recipes(api: &ApiClient) {
    match api.all_recipes() {
        Ok(recipes) => print!("{}", render_recipes(&recipes)),
        Err(err) => println!("{err}"),
    }
}

fn render_recipes(recipes: &[Recipe]) -> String {
    if recipes.is_empty() {
        return "no recipes...\n".to_string();
    }
    let mut out = String::new();
    for recipe in recipes {
        out.push_str(&format!("{}\n", recipe.recipe_id));
        out.push_str(&format!(" TheMealDB id: {}\n", recipe.mealdb_id));
        out.push_str(&format!(" Name: {}\n", recipe.name));
        if recipe.asset.is_empty() {
            out.push_str(" Asset name: None\n");
        } else {
            out.push_str(&format!(" Asset name: {}\n", recipe.asset));
        }
        out.push_str(&format!(" Id: {}\n", recipe.recipe_id));
    }
    out
}

/// Command 6: download a recipe's rendered text file from the results
/// bucket under the name the service picked for it.
fn download_recipe(api: &ApiClient, store: &dyn ObjectStore) -> Result<()> {
    let mealdb_id: String = Input::new()
        .with_prompt("Enter a recipe's TheMealDB id")
        .interact_text()?;

    match api.download_recipe(&mealdb_id) {
        Ok(DownloadOutcome::UnknownRecipe) => println!("Recipeid doesn't exist."),
        Ok(DownloadOutcome::Ready(ticket)) => {
            println!("Downloading file '{}'", ticket.local_filename);
            let bar = spinner("Downloading...");
            let saved = save_download(store, &ticket);
            bar.finish_and_clear();
            match saved {
                Ok(path) => println!("File downloaded and saved as '{}'", path.display()),
                Err(err) => println!("{err}"),
            }
        }
        Err(err) => println!("{err}"),
    }
    Ok(())
}

/// Fetch the object named by a download ticket and save it locally.
fn save_download(
    store: &dyn ObjectStore,
    ticket: &DownloadTicket,
) -> Result<PathBuf, StorageError> {
    store.fetch(&ticket.bucket_key, &ticket.local_filename)
}

/// Command 7: estimated ingredient cost for a recipe.
fn recipe_cost(api: &ApiClient) -> Result<()> {
    let mealdb_id: String = Input::new()
        .with_prompt("Enter a recipe's TheMealDB id")
        .interact_text()?;
    println!("Getting estimated cost details...");
    println!();

    match api.recipe_cost(&mealdb_id) {
        Ok(body) => println!("{body}"),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::FakeStore;
    use serde_json::{json, Value};

    #[test]
    fn command_codes_parse_with_surrounding_whitespace() {
        assert_eq!(parse_command("3"), 3);
        assert_eq!(parse_command(" 7 "), 7);
        assert_eq!(parse_command("0"), 0);
    }

    #[test]
    fn empty_and_non_numeric_input_normalize_to_the_invalid_sentinel() {
        assert_eq!(parse_command(""), -1);
        assert_eq!(parse_command("abc"), -1);
        assert_eq!(parse_command("2.5"), -1);
    }

    fn users_from_rows(rows: Value) -> Vec<User> {
        rows.as_array()
            .unwrap()
            .iter()
            .map(|row| User::from_row(row.as_array().unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn user_listing_renders_allergies_or_none() {
        let users = users_from_rows(json!([[1, "A", "B", []], [2, "C", "D", ["nuts", "eggs"]]]));

        let rendered = render_users(&users);

        assert!(rendered.contains("1\n First name: A\n Last name: B\n Allergies: None\n"));
        assert!(rendered.contains("2\n First name: C\n Last name: D\n Allergies: nuts, eggs\n"));
    }

    #[test]
    fn empty_recipe_listing_renders_a_notice() {
        assert_eq!(render_recipes(&[]), "no recipes...\n");
    }

    #[test]
    fn recipe_listing_renders_missing_assets_as_none() {
        let recipes = vec![Recipe {
            mealdb_id: "52804".to_string(),
            name: "Poutine".to_string(),
            asset: String::new(),
            recipe_id: "4".to_string(),
        }];

        let rendered = render_recipes(&recipes);

        assert!(rendered.contains(" Asset name: None\n"));
        assert!(rendered.contains(" TheMealDB id: 52804\n"));
        assert!(rendered.contains(" Id: 4\n"));
    }

    #[test]
    fn recipe_listing_is_idempotent_for_unchanged_data() {
        let recipes = vec![
            Recipe {
                mealdb_id: "52772".to_string(),
                name: "Teriyaki Chicken".to_string(),
                asset: "teriyaki.jpg".to_string(),
                recipe_id: "3".to_string(),
            },
            Recipe {
                mealdb_id: "52804".to_string(),
                name: "Poutine".to_string(),
                asset: String::new(),
                recipe_id: "4".to_string(),
            },
        ];

        assert_eq!(render_recipes(&recipes), render_recipes(&recipes));
    }

    #[test]
    fn category_check_is_case_sensitive_and_exact() {
        for category in CATEGORIES {
            assert!(is_known_category(category));
        }
        assert!(!is_known_category("beef"));
        assert!(!is_known_category("Soup"));
        assert!(!is_known_category(""));
    }

    #[test]
    fn download_ticket_drives_the_object_fetch_and_local_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::new(dir.path(), b"recipe text");
        let ticket: DownloadTicket = serde_json::from_value(json!({
            "local_filename": "x.txt",
            "bucketkey_results_file": "k"
        }))
        .unwrap();

        let saved = save_download(&store, &ticket).unwrap();

        assert_eq!(saved.file_name().unwrap(), "x.txt");
        assert_eq!(std::fs::read(&saved).unwrap(), b"recipe text");
        assert_eq!(store.requested_keys(), vec!["k"]);
    }
}
