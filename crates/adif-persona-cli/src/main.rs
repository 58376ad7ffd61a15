//! adif-persona CLI — `adif-persona` command.
//!
//! Manage operator personas (alternate callsigns with optional validity
//! windows) and the provider account credentials attached to them.
//! Non-secret refs go to the personas index; secrets go to the platform
//! keyring. A failing keyring degrades to warnings — it never changes an
//! exit code.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use adif_persona::persona::parse_date;
use adif_persona::{
    LookupMode, Persona, PersonaManager, Provider, Resolution, SecretLookup,
};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// adif-persona CLI — manage operator personas and the provider
/// credentials bound to them.
#[derive(Parser, Debug)]
#[command(
    name = "adif-persona",
    about = "Persona and provider-credential registry",
    version,
    long_about = "adif-persona — persona/credential registry\n\nRegister operator personas, attach provider account references\n(LoTW, eQSL, QRZ, Club Log), and bind them to secrets in the\nplatform keyring."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured personas
    List,

    /// Add or update a persona
    Add {
        /// Persona name (e.g. 'primary', 'w7a-2025')
        #[arg(long)]
        name: String,

        /// Callsign for this persona
        #[arg(long)]
        callsign: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },

    /// Remove a persona (index only; secrets are untouched)
    Remove {
        /// Persona name to remove
        name: String,
    },

    /// Remove all personas, optionally deleting their keyring secrets
    RemoveAll {
        /// Also delete the keyring secret for every known credential
        #[arg(long)]
        delete_secrets: bool,

        /// Limit secret deletion to these providers (repeatable)
        #[arg(long = "provider", value_parser = Provider::KNOWN)]
        providers: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show details for one persona
    Show {
        /// Callsign or persona name
        ident: Option<String>,

        /// Show by exact persona NAME (bypasses callsign matching)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Lookup mode: auto tries callsign first, then name
        #[arg(long, value_enum, default_value = "auto")]
        by: ShowBy,
    },

    /// List personas matching a name or callsign substring
    Find {
        /// Case-insensitive substring query
        query: String,
    },

    /// Attach a provider credential (non-secret ref + secret in keyring)
    SetCredential {
        /// Persona name
        #[arg(long)]
        persona: String,

        /// Provider id
        #[arg(long, value_parser = Provider::KNOWN)]
        provider: String,

        /// Account username for the provider
        #[arg(long)]
        username: String,

        /// Password/secret; prompts if omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Show a persona's provider refs and secret status (secrets masked)
    Credentials {
        /// Persona name
        persona: String,
    },
}

/// Lookup mode flag for `show`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShowBy {
    Auto,
    Callsign,
    Name,
}

impl From<ShowBy> for LookupMode {
    fn from(by: ShowBy) -> Self {
        match by {
            ShowBy::Auto => LookupMode::Auto,
            ShowBy::Callsign => LookupMode::Callsign,
            ShowBy::Name => LookupMode::Name,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::List => cmd_list(verbose),
        Commands::Add {
            name,
            callsign,
            start,
            end,
        } => cmd_add(&name, &callsign, start.as_deref(), end.as_deref()),
        Commands::Remove { name } => cmd_remove(&name),
        Commands::RemoveAll {
            delete_secrets,
            providers,
            yes,
        } => cmd_remove_all(delete_secrets, &providers, yes),
        Commands::Show { ident, name, by } => cmd_show(ident.as_deref(), name.as_deref(), by),
        Commands::Find { query } => cmd_find(&query),
        Commands::SetCredential {
            persona,
            provider,
            username,
            password,
        } => cmd_set_credential(&persona, &provider, &username, password.as_deref()),
        Commands::Credentials { persona } => cmd_credentials(&persona),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

// ── Small helpers ─────────────────────────────────────────────────────────────

fn open_manager() -> Result<PersonaManager> {
    let mgr = PersonaManager::open_default().context("failed to load personas index")?;
    log::debug!("personas index: {}", mgr.store().path().display());
    Ok(mgr)
}

fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
    match s {
        None => Ok(None),
        Some(s) => Ok(Some(parse_date(s)?)),
    }
}

/// One-line summary used by list/show/find.
fn format_persona_line(p: &Persona) -> String {
    let providers = if p.providers.is_empty() {
        "—".to_string()
    } else {
        p.providers
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "- {}: {}  [{}]  providers: {}",
        p.name,
        p.callsign,
        p.active_span(),
        providers
    )
}

fn read_line(prompt: &str) -> Result<String> {
    eprint!("{prompt}");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

// ── Command implementations ───────────────────────────────────────────────────

/// `adif-persona list`
fn cmd_list(verbose: bool) -> Result<()> {
    let mgr = open_manager()?;
    let personas = mgr.list();

    if personas.is_empty() {
        println!("No personas configured.");
        return Ok(());
    }
    for p in &personas {
        println!("{}", format_persona_line(p));
    }
    if verbose {
        println!("  ({} persona(s), index: {})", personas.len(), mgr.store().path().display());
    }
    Ok(())
}

/// `adif-persona add --name N --callsign C [--start D] [--end D]`
fn cmd_add(name: &str, callsign: &str, start: Option<&str>, end: Option<&str>) -> Result<()> {
    let start = parse_optional_date(start)?;
    let end = parse_optional_date(end)?;

    let mut mgr = open_manager()?;
    let p = mgr.upsert(name, callsign, start, end)?;

    println!(
        "Saved persona: {}  ({})  span={}",
        p.name,
        p.callsign,
        p.active_span()
    );
    Ok(())
}

/// `adif-persona remove NAME`
fn cmd_remove(name: &str) -> Result<()> {
    let mut mgr = open_manager()?;
    if mgr.remove(name)? {
        println!("Removed persona '{name}'.");
        Ok(())
    } else {
        Err(anyhow!("No such persona: {name}"))
    }
}

/// `adif-persona remove-all [--delete-secrets] [--provider ID]... [--yes]`
fn cmd_remove_all(delete_secrets: bool, providers: &[String], yes: bool) -> Result<()> {
    let mut mgr = open_manager()?;

    if mgr.list().is_empty() {
        println!("No personas to remove.");
        return Ok(());
    }

    if !yes {
        let answer = read_line("Delete ALL personas? Type 'yes' to confirm: ")?;
        if answer != "yes" {
            return Err(anyhow!("aborted"));
        }
    }

    let filter: Option<Vec<Provider>> = if providers.is_empty() {
        None
    } else {
        Some(providers.iter().map(|s| Provider::parse(s)).collect())
    };

    let (personas, secrets) = mgr.remove_all(delete_secrets, filter.as_deref())?;
    println!("Removed {personas} persona(s).");
    if delete_secrets {
        println!("Deleted {secrets} keyring secret(s).");
    }
    Ok(())
}

/// `adif-persona show [IDENT] [--by MODE] [--name NAME]`
fn cmd_show(ident: Option<&str>, name_opt: Option<&str>, by: ShowBy) -> Result<()> {
    let mgr = open_manager()?;

    // Direct by-name short-circuit.
    if let Some(name) = name_opt {
        return match mgr.get(name) {
            Some(p) => {
                println!("{}", format_persona_line(p));
                Ok(())
            }
            None => Err(anyhow!("No such persona (name): {name}")),
        };
    }

    let Some(ident) = ident else {
        return Err(anyhow!(
            "usage: adif-persona show [IDENT] or --name <persona-name>; try 'list' or 'find'"
        ));
    };

    match adif_persona::resolver::resolve(mgr.store(), ident, by.into()) {
        Resolution::Match(p) => {
            println!("{}", format_persona_line(&p));
            Ok(())
        }
        Resolution::Ambiguous(hits) => {
            println!("Multiple personas use callsign {ident}:");
            for p in &hits {
                println!("{}", format_persona_line(p));
            }
            Err(anyhow!("re-run with '--name <persona>' to select one"))
        }
        Resolution::NotFound => Err(anyhow!("No persona found for '{ident}'.")),
    }
}

/// `adif-persona find QUERY`
fn cmd_find(query: &str) -> Result<()> {
    let mgr = open_manager()?;
    let hits = adif_persona::resolver::find(mgr.store(), query);

    if hits.is_empty() {
        return Err(anyhow!("No personas match '{query}'."));
    }
    for p in &hits {
        println!("{}", format_persona_line(p));
    }
    Ok(())
}

/// `adif-persona set-credential --persona P --provider ID --username U [--password S]`
///
/// Two explicit steps: the non-secret ref is written first, then the
/// secret. A keyring failure leaves the ref in place and is reported as a
/// warning without changing the exit code.
fn cmd_set_credential(
    persona: &str,
    provider: &str,
    username: &str,
    password: Option<&str>,
) -> Result<()> {
    let provider = Provider::parse(provider);
    let mut mgr = open_manager()?;

    // Step 1: non-secret ref.
    mgr.set_provider(persona, &provider, username)?;

    // Step 2: secret.
    let secret = match password {
        Some(s) => s.to_string(),
        None => read_line(&format!("{provider} password for {username}: "))?,
    };

    let stored = match mgr.set_secret(persona, &provider, username, &secret) {
        Ok(()) => true,
        Err(e) => {
            eprintln!(
                "[warn] keyring unavailable or failed: {e}\n       Secret was NOT stored. You can set it again once the keyring works."
            );
            false
        }
    };

    println!(
        "Credential ref saved for {persona}/{provider} (username={username}).{}",
        if stored { " Secret stored in keyring." } else { "" }
    );
    Ok(())
}

/// `adif-persona credentials PERSONA`
fn cmd_credentials(persona: &str) -> Result<()> {
    let mgr = open_manager()?;
    if mgr.get(persona).is_none() {
        return Err(anyhow!("No such persona: {persona}"));
    }

    let refs = mgr.provider_refs(persona);
    if refs.is_empty() {
        println!("No provider credentials configured for '{persona}'.");
        return Ok(());
    }

    println!("Credentials for {persona}:");
    for (id, r) in &refs {
        let status = match mgr.get_secret(persona, &Provider::parse(id)) {
            SecretLookup::Found(_) => "secret: stored",
            SecretLookup::Missing => "secret: absent",
            // A listed ref always belongs to an existing persona.
            SecretLookup::Unconfigured | SecretLookup::UnknownPersona => "secret: absent",
        };
        println!("- {id}: username={}  {status}", r.username);
    }
    Ok(())
}
