mod cli;

use std::collections::HashSet;
use std::sync::Arc;

use clap::Parser;
use log::info;

use court_rota::config::Config;
use court_rota::display::{print_schedule, write_schedule_to_file};
use court_rota::form::{can_make_schedule, export_schedule_to_csv, validate_params, ParamsUpdate};
use court_rota::generation::{start_generation, GenerationOutcome};
use court_rota::pool::{import_roster_csv, PoolFile};
use court_rota::schedule::{violations, PersonId};
use court_rota::store::Store;
use court_rota::{web, RotaError};

use cli::{Cli, Commands, PoolCommands};

type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn setup_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn handle_pool_command(command: &PoolCommands, pool: &mut PoolFile) -> AppResult<()> {
    match command {
        PoolCommands::List => {
            if pool.members().is_empty() {
                println!("The pool is empty.");
            }
            for member in pool.members() {
                println!("{:>4}  {}", member.id, member.name);
            }
            return Ok(());
        }
        PoolCommands::Add { name } => {
            let id = pool.add_member(name)?;
            println!("Added {} as #{}", name.trim(), id);
        }
        PoolCommands::Rename { id, name } => {
            pool.edit_member_name(*id, name)?;
            println!("Renamed #{} to {}", id, name.trim());
        }
        PoolCommands::Remove { id } => {
            if !pool.delete_member(*id) {
                return Err(RotaError::PersonNotFound(*id).into());
            }
            println!("Removed #{}", id);
        }
        PoolCommands::Import { csv } => {
            let entries = import_roster_csv(csv)?;
            let added = pool.import(&entries)?;
            println!(
                "Read {} people from {}, added {} new",
                entries.len(),
                csv.display(),
                added.len()
            );
        }
    }
    pool.save()?;
    Ok(())
}

fn handle_params_command(update: ParamsUpdate, pool: &mut PoolFile) -> AppResult<()> {
    if !update.is_empty() {
        let params = update.applied_to(pool.params());
        validate_params(&params).map_err(RotaError::InvalidParams)?;
        pool.set_params(params);
        pool.save()?;
    }
    let params = pool.params();
    println!("Courts: {}", params.n_courts);
    println!("Games:  {}", params.n_slots);
    println!("Title:  {}", params.display_title);
    Ok(())
}

fn choose_squad(requested: &[PersonId], pool: &PoolFile) -> AppResult<Vec<PersonId>> {
    if requested.is_empty() {
        return Ok(pool.ids());
    }
    let mut seen = HashSet::new();
    for &id in requested {
        if pool.member(id).is_none() {
            return Err(RotaError::PersonNotFound(id).into());
        }
        if !seen.insert(id) {
            return Err(RotaError::DuplicatePerson(id).into());
        }
    }
    Ok(requested.to_vec())
}

async fn handle_generate_command(
    requested: &[PersonId],
    max_iterations: u64,
    output: Option<&std::path::Path>,
    csv: Option<&std::path::Path>,
    pool: &PoolFile,
    config: &Config,
) -> AppResult<()> {
    let squad = choose_squad(requested, pool)?;
    let params = pool.params().clone();
    can_make_schedule(squad.len(), &params).map_err(RotaError::InvalidParams)?;

    let store = Arc::new(Store::new(params.clone()));
    store.set_squad_to(squad);
    // saved params win over the court count fitted to the squad
    store.set_params(params.clone());

    let (mut handle, mut schedules) = start_generation(store.clone(), config.poll_interval())?;

    // Published schedules can coalesce, so this cap is a lower bound on retries
    let mut seen = 0u64;
    let outcome = loop {
        tokio::select! {
            joined = &mut handle => break joined??,
            _ = schedules.changed() => {
                seen += 1;
                if seen >= max_iterations {
                    store.cancel_generation();
                }
            }
        }
    };

    match outcome {
        GenerationOutcome::Converged { iterations } => {
            info!("Converged after {} retries", iterations)
        }
        other => println!("Stopped without converging ({:?}); some pairs repeat.", other),
    }

    let schedule = store.schedule().ok_or(RotaError::NoSchedule)?;
    let found = violations(&schedule)?;
    let name_of = |id| pool.display_name(id);
    print_schedule(&schedule, &params.display_title, &found, name_of);

    if let Some(path) = output {
        write_schedule_to_file(&schedule, &params.display_title, name_of, path)?;
        println!("Schedule saved to {}", path.display());
    }
    if let Some(path) = csv {
        export_schedule_to_csv(&schedule, name_of, path)?;
        println!("Schedule exported to {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    setup_logging(cli.is_verbose());

    let config = Config::load(cli.config.as_ref())?;
    let mut pool = PoolFile::load(&config.pool_path)?;

    match cli.command {
        None => handle_pool_command(&PoolCommands::List, &mut pool)?,
        Some(Commands::Pool { command }) => handle_pool_command(&command, &mut pool)?,
        Some(Commands::Params { courts, slots, title }) => {
            let update = ParamsUpdate {
                n_courts: courts,
                n_slots: slots,
                display_title: title,
            };
            handle_params_command(update, &mut pool)?
        }
        Some(Commands::Generate {
            squad,
            max_iterations,
            output,
            csv,
        }) => {
            let max_iterations = max_iterations.unwrap_or(config.max_iterations);
            handle_generate_command(
                &squad,
                max_iterations,
                output.as_deref(),
                csv.as_deref(),
                &pool,
                &config,
            )
            .await?
        }
        Some(Commands::Web { port }) => {
            let port = port.unwrap_or(config.port);
            println!("Starting web server on port {}...", port);
            println!("Pool file: {}", pool.path().display());
            web::start_server(port, pool, config.poll_interval()).await?;
        }
    }

    Ok(())
}
