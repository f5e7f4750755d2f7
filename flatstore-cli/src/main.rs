use clap::{Parser, Subcommand, ValueEnum};
use flatstore::{Condition, QueryOption, Record, Store};
use std::process;

/// flatstore CLI — query a flatstore data directory from the command line
#[derive(Parser)]
#[command(name = "flatstore", version, about)]
struct Cli {
    /// Path to the data directory (default: current directory)
    #[arg(long, default_value = ".")]
    data_dir: String,

    /// Output format
    #[arg(long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Command {
    /// Insert a new record
    Insert {
        /// Collection name
        collection: String,
        /// Field values (e.g. --field name="Alice Chen")
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Select records matching a where-condition
    Select {
        /// Collection name
        collection: String,
        /// Equality constraints (e.g. --where status=published)
        #[arg(long = "where", value_parser = parse_key_value)]
        conditions: Vec<(String, String)>,
        /// Full where-condition as JSON (e.g. --where-json '{"age":{"$gt":30}}')
        #[arg(long)]
        where_json: Option<String>,
    },

    /// Update records matching a where-condition
    Update {
        /// Collection name
        collection: String,
        /// Field values to merge (e.g. --field status=published)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
        /// Equality constraints
        #[arg(long = "where", value_parser = parse_key_value)]
        conditions: Vec<(String, String)>,
        /// Full where-condition as JSON
        #[arg(long)]
        where_json: Option<String>,
    },

    /// Delete records matching a where-condition
    Delete {
        /// Collection name
        collection: String,
        /// Equality constraints
        #[arg(long = "where", value_parser = parse_key_value)]
        conditions: Vec<(String, String)>,
        /// Full where-condition as JSON
        #[arg(long)]
        where_json: Option<String>,
    },

    /// List the collections declared in the schema
    Collections,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("Invalid key=value pair: no '=' found in '{s}'"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&cli.data_dir)?;

    match cli.command {
        Command::Insert { collection, fields } => {
            let data = fields_to_record(&fields);
            let id = store.insert(&collection, &data)?;
            print_output(&serde_json::json!({ "id": id }), &cli.format);
        }

        Command::Select {
            collection,
            conditions,
            where_json,
        } => {
            let option = build_option(&conditions, where_json.as_deref())?;
            let records = store.select(&collection, &option)?;
            print_output(&serde_json::Value::Array(
                records.into_iter().map(serde_json::Value::Object).collect(),
            ), &cli.format);
        }

        Command::Update {
            collection,
            fields,
            conditions,
            where_json,
        } => {
            let data = fields_to_record(&fields);
            let option = build_option(&conditions, where_json.as_deref())?;
            let updated = store.update(&collection, &data, &option)?;
            print_output(&serde_json::json!({ "updated": updated }), &cli.format);
        }

        Command::Delete {
            collection,
            conditions,
            where_json,
        } => {
            let option = build_option(&conditions, where_json.as_deref())?;
            let deleted = store.delete(&collection, &option)?;
            print_output(&serde_json::json!({ "deleted": deleted }), &cli.format);
        }

        Command::Collections => {
            let mut names: Vec<&str> = store.collections();
            names.sort_unstable();
            print_output(&serde_json::json!(names), &cli.format);
        }
    }

    Ok(())
}

fn print_output(value: &serde_json::Value, format: &OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).unwrap());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(value).unwrap());
        }
    }
}

fn fields_to_record(fields: &[(String, String)]) -> Record {
    let mut record = Record::new();
    for (key, val) in fields {
        // Try to parse as JSON value (for numbers, booleans, arrays, objects)
        let json_val = serde_json::from_str(val).unwrap_or(serde_json::Value::String(val.clone()));
        record.insert(key.clone(), json_val);
    }
    record
}

/// Combine `--where k=v` equality pairs with an optional `--where-json`
/// condition; JSON keys win on conflict.
fn build_option(
    conditions: &[(String, String)],
    where_json: Option<&str>,
) -> Result<QueryOption, Box<dyn std::error::Error>> {
    let mut condition: Condition = fields_to_record(conditions);

    if let Some(raw) = where_json {
        let parsed: serde_json::Value = serde_json::from_str(raw)?;
        let map = parsed
            .as_object()
            .ok_or_else(|| format!("--where-json must be a JSON object, got: {raw}"))?;
        for (key, value) in map {
            condition.insert(key.clone(), value.clone());
        }
    }

    if condition.is_empty() {
        Ok(QueryOption::all())
    } else {
        Ok(QueryOption::filtered(condition))
    }
}
