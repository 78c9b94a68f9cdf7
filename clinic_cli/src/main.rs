use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use clinic_core::format::{format_brl, format_date, format_duration};
use clinic_core::notify::{NotificationKind, NotificationLog};
use clinic_core::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "ClinicTime clinic scheduling system", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Clear the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Resolve a navigation path against the current session
    Route {
        path: String,

        /// Follow redirects to the page that finally renders
        #[arg(long)]
        follow: bool,
    },

    /// Show the navigation menu for the signed-in user
    Menu,

    /// List the bookable time slots
    Slots,

    /// Book an appointment through the public booking wizard
    Book {
        /// Service id
        #[arg(long)]
        service: Option<RecordId>,

        /// Professional id
        #[arg(long)]
        professional: Option<RecordId>,

        /// Day to book (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Time slot (HH:MM)
        #[arg(long)]
        slot: Option<String>,

        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// Write the confirmed booking to this CSV file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List a registry, optionally searched and filtered
    List {
        #[arg(value_enum)]
        registry: RegistryKind,

        /// Free-text search
        #[arg(long, default_value = "")]
        query: String,

        #[arg(long)]
        status: Option<FacetValue>,

        #[arg(long)]
        priority: Option<FacetValue>,

        #[arg(long)]
        category: Option<FacetValue>,

        #[arg(long)]
        severity: Option<FacetValue>,

        /// Only appointments on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show dashboard figures for a day (default today)
    Dashboard {
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },

    /// Export a registry to CSV
    Export {
        #[arg(value_enum)]
        registry: ExportKind,

        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RegistryKind {
    Services,
    Professionals,
    Patients,
    Appointments,
    Exams,
    Prescriptions,
    Allergies,
}

impl RegistryKind {
    /// Page a user must be able to open to see this registry
    fn page(self) -> Page {
        match self {
            RegistryKind::Services => Page::Services,
            RegistryKind::Professionals => Page::Professionals,
            RegistryKind::Patients => Page::Patients,
            RegistryKind::Appointments => Page::Appointments,
            RegistryKind::Exams => Page::Exams,
            RegistryKind::Prescriptions | RegistryKind::Allergies => Page::Prescription,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportKind {
    Appointments,
    Exams,
}

impl ExportKind {
    fn page(self) -> Page {
        match self {
            ExportKind::Appointments => Page::Dashboard,
            ExportKind::Exams => Page::Exams,
        }
    }
}

/// Everything a command needs from the environment
struct Context {
    config: Config,
    store: FileStore,
    today: NaiveDate,
}

impl Context {
    fn session(&self) -> Result<Session> {
        Session::restore(&self.store)
    }

    /// Restore the session and check it may open `page`
    fn require(&self, page: Page) -> Result<Session> {
        let session = self.session()?;
        match resolve(page.path(), &session) {
            Resolution::Render(_) => Ok(session),
            _ => Err(Error::Session(format!(
                "Faça login para acessar {}",
                page.path()
            ))),
        }
    }

    fn clinic(&self) -> Clinic {
        Clinic::seeded(&self.config, self.today)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    clinic_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let store = FileStore::new(config.session_path(&data_dir));
    let ctx = Context {
        config,
        store,
        today: Local::now().date_naive(),
    };

    match cli.command {
        Commands::Login { email, password } => cmd_login(ctx, &email, &password),
        Commands::Logout => cmd_logout(ctx),
        Commands::Whoami => cmd_whoami(&ctx),
        Commands::Route { path, follow } => cmd_route(&ctx, &path, follow),
        Commands::Menu => cmd_menu(&ctx),
        Commands::Slots => cmd_slots(&ctx),
        Commands::Book {
            service,
            professional,
            date,
            slot,
            name,
            email,
            phone,
            out,
        } => cmd_book(
            &ctx,
            BookingInput {
                service,
                professional,
                date,
                slot,
                name,
                email,
                phone,
                out,
            },
        ),
        Commands::List {
            registry,
            query,
            status,
            priority,
            category,
            severity,
            date,
            json,
        } => {
            let mut facets = Facets::new();
            for (name, value) in [
                (FacetName::Status, status),
                (FacetName::Priority, priority),
                (FacetName::Category, category),
                (FacetName::Severity, severity),
            ] {
                if let Some(value) = value {
                    facets.insert(name, value);
                }
            }
            cmd_list(&ctx, registry, &query, &facets, date, json)
        }
        Commands::Dashboard { date, json } => cmd_dashboard(&ctx, date, json),
        Commands::Export { registry, out } => cmd_export(&ctx, registry, out),
    }
}

fn cmd_login(mut ctx: Context, email: &str, password: &str) -> Result<()> {
    let latency = ctx.config.simulated_latency();
    let mut log = NotificationLog::new();
    let result = auth::login(&mut ctx.store, &mut log, email, password, latency);
    print_notifications(&mut log);

    let session = result?;
    if let Some(user) = session.user() {
        println!("  {} ({})", user.name, user.role);
    }
    Ok(())
}

/// Success toasts go to stdout, errors to stderr
fn print_notifications(log: &mut NotificationLog) {
    for notification in log.drain() {
        match notification.kind {
            NotificationKind::Success => println!("✓ {}", notification.message),
            NotificationKind::Error => eprintln!("{}", notification.message),
        }
    }
}

fn cmd_logout(mut ctx: Context) -> Result<()> {
    let mut session = ctx.session()?;
    auth::logout(&mut ctx.store, &mut session)?;
    println!("✓ Sessão encerrada");
    Ok(())
}

fn cmd_whoami(ctx: &Context) -> Result<()> {
    match ctx.session()?.user() {
        Some(user) => {
            println!("{}", user.name);
            println!("  E-mail: {}", user.email);
            println!("  Perfil: {}", user.role);
        }
        None => println!("Não autenticado"),
    }
    Ok(())
}

fn cmd_route(ctx: &Context, path: &str, follow_redirects: bool) -> Result<()> {
    let session = ctx.session()?;
    let resolution = if follow_redirects {
        follow(path, &session)
    } else {
        resolve(path, &session)
    };

    match resolution {
        Resolution::Render(page) => println!("render {}", page.path()),
        Resolution::Redirect(target) => println!("redirect {}", target),
        Resolution::NotFound => println!("not found"),
    }
    Ok(())
}

fn cmd_menu(ctx: &Context) -> Result<()> {
    let session = ctx.require(Page::Dashboard)?;
    let role = session
        .role()
        .ok_or_else(|| Error::Session("Sessão sem perfil".into()))?;

    for item in menu_for(role) {
        println!("{}\t{}", item.path, item.label);
    }
    Ok(())
}

fn cmd_slots(ctx: &Context) -> Result<()> {
    for slot in &ctx.config.scheduling.time_slots {
        println!("{}", slot);
    }
    Ok(())
}

struct BookingInput {
    service: Option<RecordId>,
    professional: Option<RecordId>,
    date: Option<NaiveDate>,
    slot: Option<String>,
    name: String,
    email: String,
    phone: String,
    out: Option<PathBuf>,
}

/// Drive the wizard step by step, stopping at the first blocked step
fn cmd_book(ctx: &Context, input: BookingInput) -> Result<()> {
    let mut clinic = ctx.clinic();
    let mut wizard = clinic.booking_wizard();

    let rejected = |e: InputRejected| Error::Other(e.to_string());
    let blocked = |b: Blocked| match b {
        Blocked::Incomplete { step, errors } => {
            eprintln!("Passo {} de 4: {}", step.number(), step.title());
            for (field, message) in errors.iter() {
                eprintln!("  - {}: {}", field, message);
            }
            Error::Validation(errors)
        }
        other => Error::Other(other.to_string()),
    };

    if let Some(id) = input.service {
        wizard.select_service(id).map_err(rejected)?;
    }
    if let Some(id) = input.professional {
        wizard.select_professional(id).map_err(rejected)?;
    }
    wizard.next().map_err(blocked)?;

    if let Some(date) = input.date {
        wizard.select_date(date, ctx.today).map_err(rejected)?;
    }
    if let Some(slot) = &input.slot {
        wizard.select_slot(slot).map_err(rejected)?;
    }
    wizard.next().map_err(blocked)?;

    wizard.set_patient_name(&input.name).map_err(rejected)?;
    wizard.set_patient_email(&input.email).map_err(rejected)?;
    wizard.set_patient_phone(&input.phone).map_err(rejected)?;
    let booking = clinic
        .confirm_booking(&mut wizard, Utc::now())
        .map_err(blocked)?;

    print_notifications(clinic.notifications());

    let summary = wizard.summary();
    println!();
    println!("  {}", wizard.step().title());
    println!("  Protocolo: {}", booking.id());
    println!("  Paciente: {}", summary.patient_name);
    println!("  Serviço: {}", summary.service.unwrap_or_default());
    println!("  Profissional: {}", summary.professional.unwrap_or_default());
    println!("  Data: {}", summary.date.unwrap_or_default());
    println!("  Horário: {}", summary.time_slot.unwrap_or_default());
    println!("  Valor: {}", summary.price.unwrap_or_default());

    // Bookings are not kept between runs
    if let Some(out) = &input.out {
        let count = export::export_bookings(out, &clinic)?;
        println!();
        println!("✓ Exported {} rows", count);
        println!("  CSV: {}", out.display());
    }
    Ok(())
}

fn cmd_list(
    ctx: &Context,
    registry: RegistryKind,
    query: &str,
    facets: &Facets,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    ctx.require(registry.page())?;
    let clinic = ctx.clinic();

    match registry {
        RegistryKind::Services => print_rows(
            &filter(clinic.services.list(), query, facets),
            json,
            |s| {
                format!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    s.id,
                    s.name,
                    s.category,
                    format_duration(s.duration_minutes),
                    format_brl(s.price),
                    s.status
                )
            },
        ),
        RegistryKind::Professionals => print_rows(
            &filter(clinic.professionals.list(), query, facets),
            json,
            |p| format!("{}\t{}\t{}\t{}\t{}", p.id, p.name, p.specialty, p.crm, p.status),
        ),
        RegistryKind::Patients => print_rows(
            &filter(clinic.patients.list(), query, facets),
            json,
            |p| {
                let age = p
                    .age_on(ctx.today)
                    .map(|a| format!("{} anos", a))
                    .unwrap_or_default();
                format!("{}\t{}\t{}\t{}\t{}", p.id, p.name, p.email, p.phone, age)
            },
        ),
        RegistryKind::Appointments => {
            let source = match date {
                Some(day) => clinic.appointments_on(day),
                None => clinic.appointments.list().to_vec(),
            };
            print_rows(&filter(&source, query, facets), json, |a| {
                format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    a.id,
                    format_date(a.date),
                    a.time,
                    a.patient_name,
                    a.service,
                    a.professional,
                    a.status
                )
            })
        }
        RegistryKind::Exams => print_rows(
            &filter(clinic.exams.list(), query, facets),
            json,
            |e| {
                format!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    e.id, e.patient, e.kind, e.category, e.status, e.priority
                )
            },
        ),
        RegistryKind::Prescriptions => print_rows(
            &filter(clinic.prescriptions.list(), query, facets),
            json,
            |p| {
                let medications: Vec<&str> =
                    p.medications.iter().map(|m| m.name.as_str()).collect();
                format!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    p.id,
                    format_date(p.date),
                    p.physician,
                    p.diagnosis,
                    medications.join(", "),
                    p.status
                )
            },
        ),
        RegistryKind::Allergies => print_rows(
            &filter(clinic.allergies.list(), query, facets),
            json,
            |a| format!("{}\t{}\t{}\t{}", a.id, a.substance, a.severity, a.reaction),
        ),
    }
}

fn print_rows<T: Serialize>(rows: &[T], json: bool, line: impl Fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
    } else if rows.is_empty() {
        println!("Nenhum registro encontrado");
    } else {
        for row in rows {
            println!("{}", line(row));
        }
    }
    Ok(())
}

fn cmd_dashboard(ctx: &Context, date: Option<NaiveDate>, json: bool) -> Result<()> {
    ctx.require(Page::Dashboard)?;
    let clinic = ctx.clinic();
    let stats = DashboardStats::compute(&clinic, date.unwrap_or(ctx.today));

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Dashboard {}", format_date(stats.day));
    println!("  Agendamentos hoje: {}", stats.today_appointments);
    println!("  Total de agendamentos: {}", stats.total_appointments);
    println!("  Pacientes: {}", stats.total_patients);
    println!("  Confirmados: {}", stats.confirmed);
    println!("  Pendentes: {}", stats.scheduled);
    println!("  Cancelados: {}", stats.cancelled);
    println!("  Agendamentos online: {}", stats.public_bookings);
    println!("  Receita: {}", format_brl(stats.revenue));

    if !stats.upcoming.is_empty() {
        println!();
        println!("Próximos agendamentos");
        for a in &stats.upcoming {
            println!("  {}  {}  {}  {}", a.time, a.patient_name, a.service, a.status);
        }
    }

    if !stats.service_share.is_empty() {
        println!();
        println!("Serviços mais procurados");
        for share in &stats.service_share {
            println!("  {}  {} ({:.0}%)", share.service, share.count, share.percent);
        }
    }
    Ok(())
}

fn cmd_export(ctx: &Context, registry: ExportKind, out: PathBuf) -> Result<()> {
    ctx.require(registry.page())?;
    let clinic = ctx.clinic();

    let count = match registry {
        ExportKind::Appointments => {
            export::export_appointments(&out, clinic.appointments.list())?
        }
        ExportKind::Exams => export::export_exams(&out, clinic.exams.list())?,
    };

    println!("✓ Exported {} rows", count);
    println!("  CSV: {}", out.display());
    Ok(())
}
