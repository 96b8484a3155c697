use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};
use violet::client::{ActiveFilter, FarmerClient, FarmerForm, FilterForm, validate};
use violet::farmer::{Farmer, cpf, phone};

const DEFAULT_URL: &str = "http://localhost:8888";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the farmers API.
    #[clap(long, env = "VIOLET_URL", default_value = DEFAULT_URL)]
    url: String,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// List farmers sorted by name.
    #[command(group(ArgGroup::new("status").args(["active", "inactive"])))]
    List {
        /// Part of the full name, case-insensitive.
        #[clap(long, short)]
        name: Option<String>,
        #[clap(long, short)]
        cpf: Option<String>,
        #[clap(long)]
        active: bool,
        #[clap(long)]
        inactive: bool,
    },
    /// Show one farmer.
    Show { id: String },
    /// Register a farmer.
    Create {
        #[clap(long, short)]
        name: String,
        #[clap(long, short)]
        cpf: String,
        /// YYYY-MM-DD.
        #[clap(long, short)]
        birth_date: Option<String>,
        #[clap(long, short)]
        phone: Option<String>,
        /// Register the farmer as inactive.
        #[clap(long)]
        inactive: bool,
    },
    /// Update a farmer. Omitted fields keep their current value.
    Update {
        id: String,
        #[clap(long, short)]
        name: Option<String>,
        /// YYYY-MM-DD, or an empty string to clear it.
        #[clap(long, short)]
        birth_date: Option<String>,
        /// Digits or masked number, or an empty string to clear it.
        #[clap(long, short)]
        phone: Option<String>,
        #[clap(long)]
        active: Option<bool>,
    },
    /// Remove an inactive farmer.
    Delete { id: String },
}

fn filter(
    name: Option<String>,
    cpf: Option<String>,
    active: bool,
    inactive: bool,
) -> FilterForm {
    FilterForm {
        full_name: name.unwrap_or_default(),
        cpf: cpf.unwrap_or_default(),
        active: match (active, inactive) {
            (true, _) => ActiveFilter::Active,
            (_, true) => ActiveFilter::Inactive,
            _ => ActiveFilter::All,
        },
    }
}

/// Overlay the given fields on the current record.
fn edit(
    current: &Farmer,
    name: Option<String>,
    birth_date: Option<String>,
    phone: Option<String>,
    active: Option<bool>,
) -> FarmerForm {
    let mut form = FarmerForm::from(current);
    if let Some(name) = name {
        form.full_name = name;
    }
    if let Some(birth_date) = birth_date {
        form.birth_date = birth_date;
    }
    if let Some(phone) = phone {
        form.phone = phone;
    }
    if let Some(active) = active {
        form.active = active;
    }
    form
}

fn status(active: bool) -> &'static str {
    if active { "active" } else { "inactive" }
}

fn row(farmer: &Farmer) -> String {
    format!(
        "{:<36}  {:<30}  {:<14}  {:<16}  {:<10}  {}",
        farmer.id,
        farmer.full_name,
        cpf::format(&farmer.cpf),
        phone::format(farmer.phone.as_deref().unwrap_or_default()),
        farmer.birth_date.map(|d| d.to_string()).unwrap_or_default(),
        status(farmer.active),
    )
}

fn details(farmer: &Farmer) -> String {
    format!(
        "id:         {}\nname:       {}\ncpf:        {}\nbirth date: {}\nphone:      {}\nstatus:     {}\ncreated:    {}\nupdated:    {}",
        farmer.id,
        farmer.full_name,
        cpf::format(&farmer.cpf),
        farmer.birth_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
        farmer
            .phone
            .as_deref()
            .map(phone::format)
            .unwrap_or_else(|| "-".into()),
        status(farmer.active),
        farmer.created_at.to_rfc3339(),
        farmer.updated_at.to_rfc3339(),
    )
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let client = FarmerClient::new(&args.url)?;

    match args.cmd {
        Commands::List {
            name,
            cpf,
            active,
            inactive,
        } => {
            let farmers = client.list(&filter(name, cpf, active, inactive)).await?;
            if farmers.is_empty() {
                println!("No farmer found.");
            }
            for farmer in &farmers {
                println!("{}", row(farmer));
            }
        },
        Commands::Show { id } => {
            println!("{}", details(&client.get(&id).await?));
        },
        Commands::Create {
            name,
            cpf,
            birth_date,
            phone,
            inactive,
        } => {
            let form = FarmerForm {
                full_name: name,
                cpf,
                birth_date: birth_date.unwrap_or_default(),
                phone: phone.unwrap_or_default(),
                active: !inactive,
            };
            validate(&form)?;

            let farmer = client.create(&form).await?;
            println!("Farmer {:?} has been created.", farmer.id.to_string());
        },
        Commands::Update {
            id,
            name,
            birth_date,
            phone,
            active,
        } => {
            let current = client.get(&id).await?;
            let form = edit(&current, name, birth_date, phone, active);
            validate(&form)?;

            println!("{}", details(&client.update(&id, &form).await?));
        },
        Commands::Delete { id } => {
            println!("{}", client.remove(&id).await?);
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        },
    }
}
