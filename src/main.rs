// Copyright 2023 Remi Bernotavicius

use clap::Parser;
use clap::Subcommand;
use recipe_notes::catalog::{self, CatalogSeed};
use recipe_notes::compiler;
use recipe_notes::database::{
    self,
    models::{Ingredient, IngredientId, MeasurementTypeId, RecipeId, UtensilId},
};
use recipe_notes::listing::{self, EntityConsumer};
use recipe_notes::query::RecipeQuery;
use recipe_notes::recipe::Recipe;
use recipe_notes::session::EditSession;
use recipe_notes::store;
use recipe_notes::Record;
use std::path::PathBuf;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
struct Args {
    /// Database file. Defaults to `data.sqlite` in the user data directory.
    #[arg(long, env = "RECIPE_NOTES_DATABASE")]
    database: Option<PathBuf>,

    /// Catalog definitions used when the database is first created, instead of the packaged ones.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, default_value = "warn")]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum CatalogCommands {
    Ingredients {
        #[arg(long)]
        search: Option<String>,
    },
    Utensils,
    Measurements,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(subcommand)]
    Catalog(CatalogCommands),
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long, default_value_t = 0)]
        budget: i32,
        #[arg(long, default_value_t = 1)]
        diners: i32,
        /// `ID=AMOUNT`, or `ID=AMOUNTu` for a count of whole units.
        #[arg(long = "ingredient", value_parser = parse_ingredient_amount)]
        ingredients: Vec<IngredientAmount>,
        #[arg(long = "utensil")]
        utensils: Vec<i32>,
    },
    Show {
        id: i32,
    },
    List,
    Delete {
        id: i32,
    },
    Search {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        max_budget: Option<i32>,
        #[arg(long)]
        min_diners: Option<i32>,
        #[arg(long = "include-ingredient")]
        include_ingredients: Vec<i32>,
        #[arg(long = "ban-ingredient")]
        ban_ingredients: Vec<i32>,
        #[arg(long = "include-utensil")]
        include_utensils: Vec<i32>,
        #[arg(long = "ban-utensil")]
        ban_utensils: Vec<i32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct IngredientAmount {
    id: IngredientId,
    amount: f32,
    in_units: bool,
}

fn parse_ingredient_amount(s: &str) -> std::result::Result<IngredientAmount, String> {
    let (id, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=AMOUNT, got {s:?}"))?;
    let id: i32 = id
        .trim()
        .parse()
        .map_err(|e| format!("bad ingredient id {id:?}: {e}"))?;
    let amount = amount.trim();
    let (amount, in_units) = match amount.strip_suffix('u') {
        Some(amount) => (amount, true),
        None => (amount, false),
    };
    let amount: f32 = amount
        .parse()
        .map_err(|e| format!("bad amount {amount:?}: {e}"))?;
    Ok(IngredientAmount {
        id: id.into(),
        amount,
        in_units,
    })
}

/// This is where the database and other user-data lives on-disk. On Linux it should be like:
/// `~/.local/share/recipe_notes/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or("failed to get user home directory")?;
    let path = dirs.data_dir().join("recipe_notes");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn print_recipe(conn: &mut database::Connection, id: RecipeId, recipe: &Recipe) -> Result<()> {
    println!("#{id} {}", recipe.name);
    println!(
        "  budget {}, serves {}, created {}",
        recipe.budget,
        recipe.diners,
        recipe.created_at.format("%Y-%m-%d %H:%M")
    );
    for (ingredient_id, properties) in &recipe.ingredients {
        let ingredient = catalog::get_ingredient(conn, *ingredient_id)?
            .ok_or(recipe_notes::Error::NotFound(Record::Ingredient(*ingredient_id)))?;
        let unit = if properties.in_units {
            "units".to_owned()
        } else {
            catalog::get_measurement_type(conn, ingredient.measurement_type_id)?
                .map(|m| m.name)
                .unwrap_or_default()
        };
        println!(
            "  - {} {} ({unit})",
            properties.amount,
            ingredient.display_name()
        );
    }
    for utensil_id in &recipe.utensils {
        if let Some(utensil) = catalog::get_utensil(conn, *utensil_id)? {
            println!("  * {}", utensil.name);
        }
    }
    if !recipe.body.is_empty() {
        println!();
        for line in recipe.body.lines() {
            println!("  {line}");
        }
    }
    Ok(())
}

struct RecipeSummaries;

impl EntityConsumer<RecipeId, Recipe> for RecipeSummaries {
    fn consume(&mut self, id: RecipeId, recipe: &Recipe) {
        println!(
            "{id:>5}  {:<40} budget {:>4}  serves {}",
            recipe.name, recipe.budget, recipe.diners
        );
    }
}

fn list_recipes(recipes: &[(RecipeId, Recipe)]) {
    let count = listing::feed(recipes.iter().map(|(id, r)| (*id, r)), &mut RecipeSummaries);
    println!("{count} recipes");
}

fn run_catalog(conn: &mut database::Connection, command: CatalogCommands) -> Result<()> {
    match command {
        CatalogCommands::Ingredients { search } => {
            let ingredients = match search {
                Some(search) => catalog::search_ingredients(conn, &search)?,
                None => catalog::all_ingredients(conn)?,
            };
            listing::feed(
                ingredients.iter().map(|i| (i.id, i)),
                &mut |id: IngredientId, ingredient: &Ingredient| {
                    let units = if ingredient.allows_units { " (units)" } else { "" };
                    println!("{id:>5}  {}{units}", ingredient.full_name);
                },
            );
        }
        CatalogCommands::Utensils => {
            let utensils = catalog::all_utensils(conn)?;
            listing::feed(
                utensils.iter().map(|u| (u.id, u.name.as_str())),
                &mut |id: UtensilId, name: &str| println!("{id:>5}  {name}"),
            );
        }
        CatalogCommands::Measurements => {
            let measurement_types = catalog::all_measurement_types(conn)?;
            listing::feed(
                measurement_types.iter().map(|m| (m.id, m.name.as_str())),
                &mut |id: MeasurementTypeId, name: &str| println!("{id:>5}  {name}"),
            );
        }
    }
    Ok(())
}

fn run(conn: &mut database::Connection, command: Commands) -> Result<()> {
    match command {
        Commands::Catalog(command) => run_catalog(conn, command)?,
        Commands::Add {
            name,
            body,
            budget,
            diners,
            ingredients,
            utensils,
        } => {
            let mut session = EditSession::create(Recipe::new(name));
            let draft = session.draft_mut();
            draft.body = body;
            draft.budget = budget;
            draft.diners = diners;
            for i in ingredients {
                let ingredient = catalog::get_ingredient(conn, i.id)?
                    .ok_or(recipe_notes::Error::NotFound(Record::Ingredient(i.id)))?;
                if i.in_units && !ingredient.allows_units {
                    log::warn!(
                        "{} can't be counted in units, measuring it by its measurement type",
                        ingredient.full_name
                    );
                }
                draft.set_ingredient(&ingredient, i.amount, i.in_units);
            }
            for id in utensils {
                draft.add_utensil(id.into());
            }
            let id = session.commit(conn)?;
            println!("added recipe {id}");
        }
        Commands::Show { id } => {
            let id = RecipeId::from(id);
            let recipe = store::get_by_id(conn, id)?
                .ok_or(recipe_notes::Error::NotFound(Record::Recipe(id)))?;
            print_recipe(conn, id, &recipe)?;
        }
        Commands::List => list_recipes(&store::get_all(conn)?),
        Commands::Delete { id } => {
            store::delete(conn, id.into())?;
            println!("deleted recipe {id}");
        }
        Commands::Search {
            name,
            max_budget,
            min_diners,
            include_ingredients,
            ban_ingredients,
            include_utensils,
            ban_utensils,
        } => {
            let mut query = RecipeQuery::new();
            query.name = name;
            query.max_budget = max_budget;
            query.min_diners = min_diners;
            for id in include_ingredients {
                query.include_ingredient(id.into(), false);
            }
            for id in ban_ingredients {
                let id = IngredientId::from(id);
                if !query.ban_ingredient(id, false) && query.is_ingredient_present(id) {
                    log::warn!("ingredient {id} is already included, not banning it");
                }
            }
            for id in include_utensils {
                query.include_utensil(id.into(), false);
            }
            for id in ban_utensils {
                let id = UtensilId::from(id);
                if !query.ban_utensil(id, false) && query.is_utensil_present(id) {
                    log::warn!("utensil {id} is already included, not banning it");
                }
            }
            list_recipes(&compiler::search_recipes(conn, &query)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    simple_logger::SimpleLogger::new()
        .with_level(args.log_level)
        .env()
        .init()?;

    let seed = match &args.catalog {
        Some(path) => CatalogSeed::from_path(path)?,
        None => CatalogSeed::packaged()?,
    };
    let path = match args.database {
        Some(path) => path,
        None => data_path()?.join("data.sqlite"),
    };
    log::debug!("using database {}", path.display());

    let mut conn = database::establish_connection(path, &seed)?;
    run(&mut conn, args.commands)
}
