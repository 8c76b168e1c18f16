use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use time::UtcOffset;

use mealtrack::meals::DayBucket;
use mealtrack::{
    ApiError, AppConfig, DeleteConfirmer, DeleteOutcome, HttpApi, Meal, MealHistory, MealType,
    MealUpload, MutationCoordinator, Session, TodayLedger, TokenStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "mealtrack=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let config = AppConfig::from_env()?;
    let api = Arc::new(HttpApi::new(&config)?);
    let store = TokenStore::open()?;
    let mut session = Session::restore(api.clone(), store).await;
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    match (command.as_str(), &args[1..]) {
        ("signup", [username, password, limit]) => {
            let limit: u32 = limit
                .parse()
                .context("calorie limit must be a positive integer")?;
            session
                .signup(username, password, limit)
                .await
                .map_err(surface)?;
            println!("account created, you are logged in as {username}");
        }
        ("login", [username, password]) => {
            session.login(username, password).await.map_err(surface)?;
            println!("logged in as {username}");
        }
        ("logout", []) => {
            session.logout();
            println!("logged out");
        }
        ("limit", [new_limit]) => {
            let new_limit: u32 = new_limit
                .parse()
                .context("calorie limit must be a positive integer")?;
            session
                .update_calorie_target(new_limit)
                .await
                .map_err(surface)?;
            println!("daily calorie target is now {new_limit} kcal");
        }
        ("today", []) => {
            let target = calorie_target(&session)?;
            let mut ledger = TodayLedger::new();
            ledger.load(api.as_ref()).await.map_err(surface)?;
            if ledger.is_empty() {
                println!("no meals recorded today");
            }
            for meal in ledger.meals() {
                print_meal(meal);
            }
            println!(
                "total {} kcal, remaining {} kcal of {}",
                ledger.total_calories(),
                ledger.remaining(target),
                target
            );
        }
        ("history", []) => {
            let target = calorie_target(&session)?;
            let mut history = MealHistory::new(offset);
            history.load(api.as_ref()).await.map_err(surface)?;
            if history.is_empty() {
                println!("no meals recorded yet");
            }
            // Buckets come in first-seen order; sort for display.
            let mut buckets: Vec<&DayBucket> = history.buckets().iter().collect();
            buckets.sort_by_key(|b| std::cmp::Reverse(b.date));
            for bucket in buckets {
                println!(
                    "{}  total {} kcal, remaining {} kcal",
                    bucket.date,
                    bucket.total_calories(),
                    bucket.delta(target)
                );
                for meal in bucket.meals() {
                    print_meal(meal);
                }
            }
        }
        ("upload", [meal_type, path]) => {
            calorie_target(&session)?;
            let meal_type: MealType = meal_type.parse().map_err(anyhow::Error::msg)?;
            let body = std::fs::read(path).with_context(|| format!("read {path}"))?;
            let file_name = std::path::Path::new(path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("meal.jpg")
                .to_string();
            let upload = MealUpload {
                meal_type,
                content_type: content_type_for(&file_name).to_string(),
                file_name,
                body: Bytes::from(body),
            };

            let mut ledger = TodayLedger::new();
            ledger.load(api.as_ref()).await.map_err(surface)?;
            let mut coordinator = MutationCoordinator::new();
            let created = coordinator
                .upload_meal(api.as_ref(), &mut ledger, &upload)
                .await
                .map_err(surface)?;
            println!(
                "recorded {} ({} kcal): {}",
                created.meal_type,
                created.calories,
                created.description.as_deref().unwrap_or("no description")
            );
        }
        ("delete", rest) if !rest.is_empty() => {
            calorie_target(&session)?;
            let meal_id: i64 = rest[0].parse().context("meal id must be an integer")?;
            let skip_prompt = rest.iter().any(|a| a == "--yes");

            let mut ledger = TodayLedger::new();
            ledger.load(api.as_ref()).await.map_err(surface)?;
            let mut history = MealHistory::new(offset);
            history.load(api.as_ref()).await.map_err(surface)?;

            let confirmer: Box<dyn DeleteConfirmer> = if skip_prompt {
                Box::new(AlwaysConfirm)
            } else {
                Box::new(StdinConfirmer)
            };
            let mut coordinator = MutationCoordinator::new();
            let outcome = coordinator
                .delete_meal(
                    api.as_ref(),
                    confirmer.as_ref(),
                    &mut ledger,
                    &mut history,
                    meal_id,
                )
                .await
                .map_err(surface)?;
            match outcome {
                DeleteOutcome::Deleted => println!("meal {meal_id} deleted"),
                DeleteOutcome::Cancelled => println!("kept meal {meal_id}"),
            }
        }
        _ => {
            print_usage();
            anyhow::bail!("unknown or malformed command: {command}");
        }
    }

    Ok(())
}

fn surface(e: ApiError) -> anyhow::Error {
    anyhow::anyhow!(e.detail())
}

fn calorie_target(session: &Session) -> anyhow::Result<u32> {
    match session.user() {
        Some(user) => Ok(user.daily_calorie_limit),
        None => anyhow::bail!("not logged in; run `mealtrack login <username> <password>`"),
    }
}

fn print_meal(meal: &Meal) {
    println!(
        "  #{:<6} {:<10} {:>5} kcal  {}",
        meal.id,
        meal.meal_type,
        meal.calories,
        meal.description.as_deref().unwrap_or("")
    );
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().map(str::to_ascii_lowercase) {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

struct StdinConfirmer;

#[async_trait]
impl DeleteConfirmer for StdinConfirmer {
    async fn confirm(&self, meal_id: i64) -> bool {
        print!("delete meal {meal_id}? [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes")
    }
}

struct AlwaysConfirm;

#[async_trait]
impl DeleteConfirmer for AlwaysConfirm {
    async fn confirm(&self, _meal_id: i64) -> bool {
        true
    }
}

fn print_usage() {
    println!(
        "mealtrack — calorie-ledger client\n\
         \n\
         usage:\n\
         \x20 mealtrack signup <username> <password> <daily-calorie-limit>\n\
         \x20 mealtrack login <username> <password>\n\
         \x20 mealtrack logout\n\
         \x20 mealtrack today\n\
         \x20 mealtrack history\n\
         \x20 mealtrack limit <kcal>\n\
         \x20 mealtrack upload <breakfast|lunch|dinner> <image-path>\n\
         \x20 mealtrack delete <meal-id> [--yes]"
    );
}
