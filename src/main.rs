use std::env;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rustimoodle::audit::FileAuditLog;
use rustimoodle::cache::EntityCache;
use rustimoodle::config::AppConfig;
use rustimoodle::gateway::MoodleGateway;
use rustimoodle::models::capitalize_words;
use rustimoodle::session::SessionStore;
use rustimoodle::{AutoGradeOptions, AutoGradeOutcome, Client, ClientError};

#[derive(Parser)]
#[command(name = "rustimoodle")]
#[command(about = "Small client for the Moodle web service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
#[command(rename_all = "snake_case")]
enum Command {
    /// Show client configuration (stored locally)
    Config,
    /// Insert/update the Moodle domain
    SetDomain { domain: String },
    /// Authenticate with username and password
    Auth { user: String, password: String },
    /// Insert the default comment used by auto_grade
    SetComment { comment: String },
    /// Fetch site info and store the current user
    SiteInfo,
    /// List the user's courses
    GetCourses,
    /// Select the course to operate on
    SetCourse { course_id: i64 },
    /// List enrolled users of the selected course
    GetEnr,
    /// List assignments of the selected course
    GetAsn,
    /// List submissions for an assignment
    GetSub { assignment_id: i64 },
    /// Zero-grade students whose submission is missing
    AutoGrade {
        assignment_id: i64,
        #[arg(short, long)]
        remove: bool,
    },
    /// Delete every cached download
    ClearCache,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "rustimoodle=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let store = SessionStore::new(&config.session_file);
    let state = store.load()?;
    let gateway = MoodleGateway::new(config.timeout)?;
    let mut client = Client::new(
        state,
        EntityCache::new(&config.downloads_dir),
        gateway,
        config.service.clone(),
    );

    // whatever the command changed before failing is kept
    let outcome = run(&mut client, cli.command, &config).await;
    store.save(client.state())?;
    if let Err(err) = &outcome {
        if let Some(e) = err.downcast_ref::<ClientError>() {
            tracing::error!(kind = ?e.kind(), error = %e, "command failed");
        }
    }
    outcome
}

async fn run(
    client: &mut Client<MoodleGateway>,
    command: Command,
    config: &AppConfig,
) -> anyhow::Result<()> {
    match command {
        Command::Config => print!("{}", client.state()),
        Command::SetDomain { domain } => client.state_mut().set_domain(&domain),
        Command::Auth { user, password } => client.authenticate(&user, &password).await?,
        Command::SetComment { comment } => client.state_mut().set_comment(&comment),
        Command::SiteInfo => {
            let site = client.site_info().await?;
            println!("{} ({}) {}", site.fullname, site.username, site.userid);
        }
        Command::GetCourses => {
            for course in client.courses().await? {
                println!("{} : {}", course.id, course.shortname);
            }
        }
        Command::SetCourse { course_id } => client.set_course(course_id).await?,
        Command::GetEnr => {
            for user in client.enrolled().await? {
                println!(
                    "{} {} ({})",
                    user.userid,
                    capitalize_words(&user.fullname),
                    user.roles
                );
            }
        }
        Command::GetAsn => {
            for asn in client.assignments().await? {
                println!("{} {}", asn.id, asn.name);
            }
        }
        Command::GetSub { assignment_id } => {
            for sub in client.submissions(assignment_id).await? {
                println!("{} {} {}", sub.userid, sub.status, sub.grading_status);
            }
        }
        Command::AutoGrade {
            assignment_id,
            remove,
        } => {
            let mut audit = FileAuditLog::new(&config.audit_log);
            let outcome = client
                .auto_grade_missing(
                    assignment_id,
                    AutoGradeOptions { remove },
                    Utc::now(),
                    &mut audit,
                )
                .await?;
            match outcome {
                AutoGradeOutcome::Graded(students) => {
                    for st in students {
                        match st.submission {
                            Some((status, grading)) => {
                                println!("{} {} ({}) {} {}", st.userid, st.name, st.roles, status, grading)
                            }
                            None => println!("{} {} ({})", st.userid, st.name, st.roles),
                        }
                    }
                }
                AutoGradeOutcome::RemovalUnimplemented => {
                    eprintln!("grade removal is not implemented; nothing was changed");
                }
            }
        }
        Command::ClearCache => {
            let removed = client.cache().clear().await?;
            println!("removed {removed} cached file(s)");
        }
    }
    Ok(())
}
