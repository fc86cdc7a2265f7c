use anyhow::{anyhow, Error};
use chrono::{DateTime, Utc};
use medibook::{
    appointment::{self, StatusFilter, TimeFilter},
    guard,
    layout::{self, MenuAction},
    patient::{self, PatientSort},
    ApiClient, Appointment, AppointmentStatus, AuthClient, Config,
    Credentials, Navigation, NewAppointment, NewPatient, Role, RouteGuard,
    SessionStore, SignupData,
};
use std::path::PathBuf;
use structopt::StructOpt;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::from_args();

    log::debug!("Starting application with {:#?}", args);

    let config = args.config()?;
    let store = config.session_store();
    let http = config.http_client()?;

    let auth =
        AuthClient::new(http.clone(), config.api_url.clone(), store.clone());
    let api = ApiClient::new(http, config.api_url.clone(), store.clone());
    let guard = RouteGuard::new(store.clone());

    match args.cmd {
        Command::Login {
            role,
            email,
            password,
            remember_me,
            from,
        } => {
            let credentials =
                Credentials::new(email, password).remember_me(remember_me);
            let session = auth.login(&credentials, role).await?;
            let name = session
                .user
                .as_ref()
                .map(|user| user.full_name())
                .unwrap_or_default();

            println!("Welcome back, {}", name);
            println!("-> {}", guard::return_path(from.as_deref(), role));
        },
        Command::Signup {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            phone_number,
            state,
            medical_specialty,
        } => {
            let data = SignupData {
                first_name,
                last_name,
                email,
                password: password.into(),
                confirm_password: confirm_password.into(),
                phone_number,
                state,
                medical_specialty,
            };
            auth.signup(&data, Role::Doctor).await?;

            println!("Registration successful!");
            println!("-> {}", Role::Doctor.dashboard_path());
        },
        Command::ResetPassword { email } => {
            let message = auth.reset_password(&email).await?;
            println!("{}", message);
        },
        Command::Logout => {
            print_navigation(&guard.perform(MenuAction::Logout))
        },
        Command::Menu { label } => {
            let chrome = layout::select(store.read()?.role)?;
            let entry = chrome
                .menu()
                .iter()
                .find(|entry| entry.label.eq_ignore_ascii_case(&label))
                .ok_or_else(|| {
                    anyhow!("There is no \"{}\" menu entry", label)
                })?;

            print_navigation(&guard.perform(entry.action));
        },
        Command::Status => print_status(&store)?,
        Command::Open { path } => print_navigation(&guard.navigate(&path)),
        Command::Appointments {
            status,
            search,
            when,
        } => {
            let role = current_role(&store)?;
            let appointments = match role {
                Role::Doctor => api.doctor_appointments().await?,
                Role::Patient => api.patient_appointments().await?,
            };

            let status = status.map_or(StatusFilter::All, StatusFilter::Only);
            let by_status = appointment::filter_appointments(
                &appointments,
                status,
                &search,
            );
            let now = Utc::now();

            for apt in by_status {
                if when.matches(apt.time, now) {
                    print_appointment(apt);
                }
            }
        },
        Command::Book {
            time,
            treatment,
            duration,
            notes,
            doctor,
        } => {
            let appointment = NewAppointment {
                time,
                treatment,
                duration,
                notes,
                doctor_id: doctor,
            };
            let message = api.book_appointment(&appointment).await?;
            println!(
                "{}",
                message.as_deref().unwrap_or("Appointment booked successfully")
            );
        },
        Command::SetStatus { id, status } => {
            api.update_appointment_status(&id, status).await?;
            println!(
                "Appointment {} successfully",
                status.as_str().to_lowercase()
            );
        },
        Command::Patients { search, sort } => {
            let patients = api.patients().await?;

            for p in patient::filter_patients(&patients, &search, sort) {
                println!(
                    "{:<24} {:<16} {:<28} {}",
                    p.id,
                    p.full_name(),
                    p.email,
                    p.phone_number
                );
            }
        },
        Command::AddPatient {
            first_name,
            last_name,
            email,
            date_of_birth,
            gender,
            phone_number,
            address,
            medical_history,
        } => {
            let patient = NewPatient {
                first_name,
                last_name,
                email,
                date_of_birth,
                gender,
                phone_number,
                address,
                medical_history,
                assigned_doctor: None,
            };
            api.create_patient(&patient).await?;
            println!("Patient created successfully");
        },
        Command::Notes { id, notes } => {
            api.update_patient_notes(&id, &notes).await?;
            println!("Patient notes updated successfully");
        },
        Command::Profile => {
            let profile = api.patient_profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        },
        Command::Dashboard => match current_role(&store)? {
            Role::Doctor => {
                let appointments = api.doctor_appointments().await?;
                let patients = api.patients().await?;
                let stats = appointment::DashboardStats::compute(
                    &appointments,
                    patients.len(),
                    Utc::now().date_naive(),
                );

                println!("Total patients:       {}", stats.total_patients);
                println!("Today's appointments: {}", stats.today_appointments);
                println!(
                    "Pending requests:     {}",
                    stats.pending_appointments
                );
                println!();
                for apt in appointment::recent(&appointments) {
                    print_appointment(apt);
                }
            },
            Role::Patient => {
                let appointments = api.patient_appointments().await?;
                let upcoming = appointment::filter_by_time(
                    &appointments,
                    TimeFilter::Upcoming,
                    Utc::now(),
                );

                println!("Upcoming appointments: {}", upcoming.len());
                for apt in upcoming {
                    print_appointment(apt);
                }
            },
        },
    }

    Ok(())
}

fn current_role(store: &SessionStore) -> Result<Role, Error> {
    store
        .read()?
        .role
        .ok_or_else(|| anyhow!("You need to log in first"))
}

fn print_status(store: &SessionStore) -> Result<(), Error> {
    let session = store.read()?;

    if !session.is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }

    match &session.user {
        Some(user) => {
            println!("Logged in as {} <{}>", user.full_name(), user.email)
        },
        None => println!("Logged in, but the profile is missing"),
    }

    match layout::select(session.role) {
        Ok(chrome) => {
            println!("Role: {:?}", chrome);
            for entry in chrome.menu() {
                let target = match entry.action {
                    MenuAction::Navigate(route) => route.path(),
                    MenuAction::Logout => guard::LOGIN_PATH,
                };
                println!("  {:<14} {}", entry.label, target);
            }
        },
        Err(e) => println!("{}", e),
    }

    Ok(())
}

fn print_navigation(navigation: &Navigation) {
    match navigation {
        Navigation::Render {
            route,
            chrome: Some(chrome),
        } => println!("Showing {} with the {:?} menu", route.path(), chrome),
        Navigation::Render {
            route,
            chrome: None,
        } => println!("Showing {}", route.path()),
        Navigation::Redirect(decision) => {
            println!("-> {}", decision.target().unwrap_or(guard::LOGIN_PATH))
        },
        Navigation::NotFound(path) => println!("No such page: {}", path),
    }
}

fn print_appointment(apt: &Appointment) {
    let who = apt
        .counterpart()
        .map(|who| who.full_name())
        .unwrap_or_default();

    println!(
        "{:<24} {} {:<20} {:<16} {:>4}min {}",
        apt.id,
        apt.time.format("%Y-%m-%d %H:%M"),
        who,
        apt.treatment,
        apt.duration,
        apt.status
    );
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Book and manage doctor's appointments")]
struct Args {
    #[structopt(
        long = "api-url",
        help = "The backend's base URL (defaults to $MEDIBOOK_API_URL)"
    )]
    api_url: Option<String>,
    #[structopt(
        long = "session-file",
        parse(from_os_str),
        help = "Where to keep the session between runs"
    )]
    session_file: Option<PathBuf>,
    #[structopt(
        long = "no-persist",
        help = "Forget the session as soon as this command exits"
    )]
    no_persist: bool,
    #[structopt(long = "timeout", help = "Request timeout, in seconds")]
    timeout: Option<u64>,
    #[structopt(subcommand)]
    cmd: Command,
}

impl Args {
    fn config(&self) -> Result<Config, Error> {
        let mut config = Config::from_env()?;

        if let Some(ref url) = self.api_url {
            config = config.with_api_url(url)?;
        }
        if let Some(ref path) = self.session_file {
            config.session_file = path.clone();
        }
        if self.no_persist {
            config.persist_across_restarts = false;
        }
        if let Some(secs) = self.timeout {
            config.timeout = Some(std::time::Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(about = "Log in as a doctor or a patient")]
    Login {
        #[structopt(short = "r", long = "role", default_value = "doctor")]
        role: Role,
        #[structopt(short = "e", long = "email")]
        email: String,
        #[structopt(short = "p", long = "password")]
        password: String,
        #[structopt(long = "remember-me")]
        remember_me: bool,
        #[structopt(long = "from", help = "The page to return to afterwards")]
        from: Option<String>,
    },
    #[structopt(about = "Register a new doctor account")]
    Signup {
        #[structopt(long = "first-name")]
        first_name: String,
        #[structopt(long = "last-name")]
        last_name: String,
        #[structopt(short = "e", long = "email")]
        email: String,
        #[structopt(short = "p", long = "password")]
        password: String,
        #[structopt(long = "confirm-password")]
        confirm_password: String,
        #[structopt(long = "phone")]
        phone_number: String,
        #[structopt(long = "state")]
        state: String,
        #[structopt(long = "specialty")]
        medical_specialty: String,
    },
    #[structopt(about = "Get password reset instructions by email")]
    ResetPassword {
        #[structopt(short = "e", long = "email")]
        email: String,
    },
    #[structopt(about = "Forget the current session")]
    Logout,
    #[structopt(about = "Click an entry in the side menu")]
    Menu { label: String },
    #[structopt(about = "Show who is logged in")]
    Status,
    #[structopt(about = "Check whether a page may be shown")]
    Open { path: String },
    #[structopt(about = "List your appointments")]
    Appointments {
        #[structopt(long = "status")]
        status: Option<AppointmentStatus>,
        #[structopt(long = "search", default_value = "")]
        search: String,
        #[structopt(
            long = "when",
            default_value = "all",
            parse(try_from_str = parse_time_filter)
        )]
        when: TimeFilter,
    },
    #[structopt(about = "Book an appointment")]
    Book {
        #[structopt(long = "time", help = "An RFC 3339 timestamp")]
        time: DateTime<Utc>,
        #[structopt(long = "treatment")]
        treatment: String,
        #[structopt(long = "duration", default_value = "30")]
        duration: String,
        #[structopt(long = "notes")]
        notes: Option<String>,
        #[structopt(
            long = "doctor",
            help = "Defaults to your assigned doctor"
        )]
        doctor: Option<String>,
    },
    #[structopt(about = "Accept or reject an appointment")]
    SetStatus {
        id: String,
        status: AppointmentStatus,
    },
    #[structopt(about = "List your patients")]
    Patients {
        #[structopt(long = "search", default_value = "")]
        search: String,
        #[structopt(
            long = "sort",
            default_value = "name",
            parse(try_from_str = parse_sort)
        )]
        sort: PatientSort,
    },
    #[structopt(about = "Register one of your patients")]
    AddPatient {
        #[structopt(long = "first-name")]
        first_name: String,
        #[structopt(long = "last-name")]
        last_name: String,
        #[structopt(short = "e", long = "email")]
        email: String,
        #[structopt(long = "dob")]
        date_of_birth: String,
        #[structopt(long = "gender")]
        gender: String,
        #[structopt(long = "phone")]
        phone_number: String,
        #[structopt(long = "address")]
        address: String,
        #[structopt(long = "history", default_value = "")]
        medical_history: String,
    },
    #[structopt(about = "Update your notes about a patient")]
    Notes { id: String, notes: String },
    #[structopt(about = "Show your patient profile")]
    Profile,
    #[structopt(about = "Show your dashboard")]
    Dashboard,
}

fn parse_time_filter(s: &str) -> Result<TimeFilter, Error> {
    match s {
        "all" => Ok(TimeFilter::All),
        "upcoming" => Ok(TimeFilter::Upcoming),
        "past" => Ok(TimeFilter::Past),
        other => Err(anyhow!("Expected all, upcoming, or past, not {}", other)),
    }
}

fn parse_sort(s: &str) -> Result<PatientSort, Error> {
    match s {
        "name" => Ok(PatientSort::Name),
        "recent" => Ok(PatientSort::Recent),
        other => Err(anyhow!("Expected name or recent, not {}", other)),
    }
}
